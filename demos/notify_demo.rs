use anyhow::Result;
use hmr_sync::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    hmr_sync::init_tracing_subscriber(true);

    let plugin = NotifyPlugin::new(
        NotifyOptions::new("storefront")
            .with_host_url("http://localhost:5000")
            .with_method(NotifyMethod::Post),
    );

    // Simulate a successful build ending.
    plugin.build_end(None).await;

    // And one that failed; with the default notify_on_success_only this
    // skips the network call entirely.
    let error = anyhow::anyhow!("asset bundling failed");
    plugin.build_end(Some(&error)).await;

    Ok(())
}
