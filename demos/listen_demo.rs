use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use hmr_sync::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    hmr_sync::init_tracing_subscriber(true);

    let host = Arc::new(ChannelHost::default());

    // A real host server would forward these to its connected clients.
    let mut reloads = host.subscribe();
    tokio::spawn(async move {
        while let Ok(payload) = reloads.recv().await {
            tracing::info!("would broadcast to clients: {payload:?}");
        }
    });

    let options = ListenOptions::new()
        .with_allowed_apps(["storefront", "admin"])
        .with_on_rebuild(|app_name, _server| {
            tracing::info!("rebuild triggered by {app_name}");
        });
    let app = listen_for_remote_rebuilds(options, host);

    let addr: SocketAddr = "127.0.0.1:5000".parse()?;
    tracing::info!("listening for rebuild signals at http://{addr}/on-child-rebuild");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
