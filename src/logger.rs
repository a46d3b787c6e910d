use std::fmt::Display;

/// Logging capability handed to each notify/listen flow: a plugin/app-name
/// prefix plus a suppress flag, forwarding to `tracing`.
#[derive(Debug, Clone)]
pub(crate) struct PluginLogger {
    prefix: String,
    suppress: bool,
}

impl PluginLogger {
    pub(crate) fn new(plugin_name: &str, app_name: &str, suppress: bool) -> Self {
        Self {
            prefix: format!("[{plugin_name}][{app_name}]"),
            suppress,
        }
    }

    pub(crate) fn log(&self, msg: &str) {
        self.info(msg);
    }

    pub(crate) fn info(&self, msg: &str) {
        if !self.suppress {
            tracing::info!("{} {}", self.prefix, msg);
        }
    }

    pub(crate) fn warn(&self, msg: &str) {
        if !self.suppress {
            tracing::warn!("{} {}", self.prefix, msg);
        }
    }

    pub(crate) fn error(&self, msg: &str) {
        if !self.suppress {
            tracing::error!("{} {}", self.prefix, msg);
        }
    }

    pub(crate) fn error_with(&self, msg: &str, err: &dyn Display) {
        if !self.suppress {
            tracing::error!("{} {} {}", self.prefix, msg, err);
        }
    }
}
