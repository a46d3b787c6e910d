pub mod build_config;
pub mod host;
pub mod listener;
mod logger;
pub mod notifier;
pub mod orchestrator;
pub mod plugin;
pub mod prelude;
pub mod types;

pub use prelude::*;

pub fn init_tracing_subscriber(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse().unwrap()),
        )
        .without_time()
        .with_ansi(false)
        .init();
}
