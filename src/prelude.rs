pub use crate::build_config::{
    BuildServeContext, BuildServeOptions, CONFIG_FILENAME, read_hmr_sync_config,
};
pub use crate::host::{ChannelHost, HostServer};
pub use crate::listener::{RebuildListener, RebuildListenerService};
pub use crate::notifier::send_notification;
pub use crate::orchestrator::{READY_MARKER, start_build, start_build_and_serve, start_serve};
pub use crate::plugin::{
    LISTEN_PLUGIN_NAME, NOTIFY_PLUGIN_NAME, NotifyPlugin, listen_for_remote_rebuilds,
};
pub use crate::types::{
    ConfigError, DEFAULT_ENDPOINT, DEFAULT_HOST_URL, ListenConfig, ListenOptions, NotifyConfig,
    NotifyMethod, NotifyOptions, NotifySetup, RebuildHook, ReloadPayload,
};
