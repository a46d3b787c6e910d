use std::sync::Arc;

use crate::host::HostServer;
use crate::types::ReloadPayload;

/// Host URL used when the notify side does not configure one.
pub const DEFAULT_HOST_URL: &str = "http://localhost:5000";
/// Endpoint both sides agree on unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "/on-child-rebuild";

/// Error raised while resolving user-supplied options.
///
/// This is the only error surfaced to callers by the whole crate; everything
/// downstream of option resolution is logged instead of propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`app_name` is required")]
    MissingAppName,
}

/// HTTP method used for the outbound notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotifyMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
}

impl NotifyMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for NotifyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<NotifyMethod> for axum::http::Method {
    fn from(method: NotifyMethod) -> Self {
        match method {
            NotifyMethod::Get => Self::GET,
            NotifyMethod::Post => Self::POST,
        }
    }
}

/// Partial notify-side options as supplied by the user.
///
/// Every field is optional; [`NotifyConfig::resolve`] fills in the blanks.
/// `app_name` is the one field that must end up populated.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotifyOptions {
    /// Name of the app to notify the host server about.
    pub app_name: Option<String>,
    /// Host URL to notify when this app rebuilds.
    pub host_url: Option<String>,
    /// Endpoint on the host server to notify.
    pub endpoint: Option<String>,
    /// HTTP method to use for the notification.
    pub method: Option<NotifyMethod>,
    /// Whether to notify the host server only on successful builds.
    pub notify_on_success_only: Option<bool>,
    /// Suppress log output.
    pub suppress_logs: Option<bool>,
}

impl NotifyOptions {
    /// Create options for `app_name` with everything else left to defaults.
    #[must_use]
    pub fn new<S: AsRef<str>>(app_name: S) -> Self {
        Self {
            app_name: Some(app_name.as_ref().to_string()),
            ..Self::default()
        }
    }

    /// Set the host URL of the `NotifyOptions`
    #[must_use]
    pub fn with_host_url<S: AsRef<str>>(mut self, host_url: S) -> Self {
        self.host_url = Some(host_url.as_ref().to_string());
        self
    }

    /// Set the endpoint of the `NotifyOptions`
    #[must_use]
    pub fn with_endpoint<S: AsRef<str>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.as_ref().to_string());
        self
    }

    /// Set the HTTP method of the `NotifyOptions`
    #[must_use]
    pub const fn with_method(mut self, method: NotifyMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Set whether failed builds skip the notification
    #[must_use]
    pub const fn with_notify_on_success_only(mut self, notify_on_success_only: bool) -> Self {
        self.notify_on_success_only = Some(notify_on_success_only);
        self
    }

    /// Set whether log output is suppressed
    #[must_use]
    pub const fn with_suppress_logs(mut self, suppress_logs: bool) -> Self {
        self.suppress_logs = Some(suppress_logs);
        self
    }
}

/// Notify setup accepted at the plugin boundary: either a bare app name or a
/// partial [`NotifyOptions`] record. Resolved exactly once, into
/// [`NotifyConfig`].
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum NotifySetup {
    AppName(String),
    Options(NotifyOptions),
}

impl From<&str> for NotifySetup {
    fn from(app_name: &str) -> Self {
        Self::AppName(app_name.to_string())
    }
}

impl From<String> for NotifySetup {
    fn from(app_name: String) -> Self {
        Self::AppName(app_name)
    }
}

impl From<NotifyOptions> for NotifySetup {
    fn from(options: NotifyOptions) -> Self {
        Self::Options(options)
    }
}

/// Fully-populated notify configuration, immutable after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub app_name: String,
    pub host_url: String,
    pub endpoint: String,
    pub method: NotifyMethod,
    pub notify_on_success_only: bool,
    pub suppress_logs: bool,
}

impl NotifyConfig {
    /// Resolve a partial setup into a complete configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingAppName`] if the app name is absent or
    /// empty, for both the string and the record form.
    pub fn resolve(setup: impl Into<NotifySetup>) -> Result<Self, ConfigError> {
        let options = match setup.into() {
            NotifySetup::AppName(app_name) => NotifyOptions {
                app_name: Some(app_name),
                ..NotifyOptions::default()
            },
            NotifySetup::Options(options) => options,
        };

        let app_name = options
            .app_name
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingAppName)?;

        Ok(Self {
            app_name,
            host_url: options
                .host_url
                .unwrap_or_else(|| DEFAULT_HOST_URL.to_string()),
            endpoint: options
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            method: options.method.unwrap_or_default(),
            notify_on_success_only: options.notify_on_success_only.unwrap_or(true),
            suppress_logs: options.suppress_logs.unwrap_or(false),
        })
    }
}

/// Hook invoked after a rebuild broadcast, with the triggering app name and
/// the host server handle.
pub type RebuildHook = Arc<dyn Fn(&str, &dyn HostServer) + Send + Sync>;

/// Partial listen-side options as supplied by the user.
#[derive(Clone, Default)]
pub struct ListenOptions {
    /// Endpoint to listen on for rebuild signals.
    pub endpoint: Option<String>,
    /// Reload payload broadcast to connected clients.
    pub hot_payload: Option<ReloadPayload>,
    /// Apps allowed to trigger a reload. Empty or absent means allow all.
    pub allowed_apps: Option<Vec<String>>,
    /// Optional hook run after a reload is triggered.
    pub on_rebuild: Option<RebuildHook>,
    /// Suppress log output.
    pub suppress_logs: Option<bool>,
}

impl ListenOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint of the `ListenOptions`
    #[must_use]
    pub fn with_endpoint<S: AsRef<str>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.as_ref().to_string());
        self
    }

    /// Set the reload payload of the `ListenOptions`
    #[must_use]
    pub fn with_hot_payload(mut self, hot_payload: ReloadPayload) -> Self {
        self.hot_payload = Some(hot_payload);
        self
    }

    /// Set the allow-list of the `ListenOptions`
    #[must_use]
    pub fn with_allowed_apps<S: AsRef<str>>(mut self, apps: impl IntoIterator<Item = S>) -> Self {
        self.allowed_apps = Some(apps.into_iter().map(|a| a.as_ref().to_string()).collect());
        self
    }

    /// Set the rebuild hook of the `ListenOptions`
    ///
    /// The hook runs synchronously after the reload broadcast. Panics inside
    /// it are not caught; keeping it well-behaved is the caller's job.
    #[must_use]
    pub fn with_on_rebuild<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &dyn HostServer) + Send + Sync + 'static,
    {
        self.on_rebuild = Some(Arc::new(hook));
        self
    }

    /// Set whether log output is suppressed
    #[must_use]
    pub const fn with_suppress_logs(mut self, suppress_logs: bool) -> Self {
        self.suppress_logs = Some(suppress_logs);
        self
    }
}

impl std::fmt::Debug for ListenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenOptions")
            .field("endpoint", &self.endpoint)
            .field("hot_payload", &self.hot_payload)
            .field("allowed_apps", &self.allowed_apps)
            .field("on_rebuild", &self.on_rebuild.as_ref().map(|_| ".."))
            .field("suppress_logs", &self.suppress_logs)
            .finish()
    }
}

/// Fully-populated listen configuration, immutable after resolution. Lives
/// for the lifetime of the host server.
#[derive(Clone)]
pub struct ListenConfig {
    pub endpoint: String,
    pub hot_payload: ReloadPayload,
    pub allowed_apps: Vec<String>,
    pub on_rebuild: Option<RebuildHook>,
    pub suppress_logs: bool,
}

impl ListenConfig {
    /// Resolve partial options into a complete configuration. Never fails.
    #[must_use]
    pub fn resolve(options: ListenOptions) -> Self {
        Self {
            endpoint: options
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            hot_payload: options.hot_payload.unwrap_or_default(),
            allowed_apps: options.allowed_apps.unwrap_or_default(),
            on_rebuild: options.on_rebuild,
            suppress_logs: options.suppress_logs.unwrap_or(false),
        }
    }

    /// Whether `app_name` may trigger a reload. An empty allow-list admits
    /// every app; a non-empty one is an exact, case-sensitive match.
    #[must_use]
    pub fn allows(&self, app_name: &str) -> bool {
        self.allowed_apps.is_empty() || self.allowed_apps.iter().any(|app| app == app_name)
    }
}

impl std::fmt::Debug for ListenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenConfig")
            .field("endpoint", &self.endpoint)
            .field("hot_payload", &self.hot_payload)
            .field("allowed_apps", &self.allowed_apps)
            .field("on_rebuild", &self.on_rebuild.as_ref().map(|_| ".."))
            .field("suppress_logs", &self.suppress_logs)
            .finish()
    }
}
