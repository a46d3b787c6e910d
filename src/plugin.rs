use std::sync::Arc;

use axum::Router;

use crate::host::HostServer;
use crate::listener::RebuildListener;
use crate::logger::PluginLogger;
use crate::notifier::send_notification;
use crate::types::{ListenConfig, ListenOptions, NotifyConfig, NotifySetup};

pub const NOTIFY_PLUGIN_NAME: &str = "hmr-sync-notify";
pub const LISTEN_PLUGIN_NAME: &str = "hmr-sync-listen";

/// Notify-side plugin: hook [`NotifyPlugin::build_end`] into the build
/// pipeline of the app whose rebuilds should reach the host.
///
/// Construction never fails: invalid options are logged and produce a
/// disabled plugin whose `build_end` is a no-op, so a misconfigured child
/// app cannot take the build down with it.
#[derive(Debug, Clone)]
pub struct NotifyPlugin {
    name: String,
    config: Option<NotifyConfig>,
}

impl NotifyPlugin {
    #[must_use]
    pub fn new(setup: impl Into<NotifySetup>) -> Self {
        match NotifyConfig::resolve(setup) {
            Ok(config) => Self {
                name: NOTIFY_PLUGIN_NAME.to_string(),
                config: Some(config),
            },
            Err(err) => {
                PluginLogger::new(NOTIFY_PLUGIN_NAME, "unknown", false)
                    .error_with("Error:", &err);
                Self {
                    name: format!("{NOTIFY_PLUGIN_NAME}-error"),
                    config: None,
                }
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved configuration, or `None` for a disabled plugin.
    #[must_use]
    pub const fn options(&self) -> Option<&NotifyConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.config.is_some()
    }

    /// Build-end hook: notify the host that this app's build finished.
    pub async fn build_end(&self, build_error: Option<&anyhow::Error>) {
        if let Some(config) = &self.config {
            send_notification(config, build_error).await;
        }
    }
}

/// Listen-side plugin registration: resolve the options and mount the
/// rebuild listener at its endpoint, for merging into the host server's
/// router.
pub fn listen_for_remote_rebuilds(options: ListenOptions, host: Arc<dyn HostServer>) -> Router {
    let config = ListenConfig::resolve(options);
    let endpoint = normalize_endpoint(&config.endpoint);
    let listener = Arc::new(RebuildListener::new(config, host));

    Router::new().route_service(&endpoint, listener.into_service())
}

fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::host::ChannelHost;
    use crate::types::{NotifyOptions, ReloadPayload};

    #[test]
    fn missing_app_name_degrades_to_a_disabled_plugin() {
        let plugin = NotifyPlugin::new("");

        assert_eq!(plugin.name(), "hmr-sync-notify-error");
        assert!(!plugin.is_active());
        assert!(plugin.options().is_none());
    }

    #[tokio::test]
    async fn disabled_plugin_build_end_is_a_no_op() {
        let plugin = NotifyPlugin::new(NotifyOptions::default());

        plugin.build_end(None).await;
        plugin.build_end(Some(&anyhow::anyhow!("boom"))).await;
    }

    #[test]
    fn valid_setup_produces_an_active_plugin() {
        let plugin = NotifyPlugin::new("shop");

        assert_eq!(plugin.name(), "hmr-sync-notify");
        assert!(plugin.is_active());
        assert_eq!(plugin.options().unwrap().app_name, "shop");
    }

    #[tokio::test]
    async fn router_accepts_listed_app_and_broadcasts_once() {
        let host = Arc::new(ChannelHost::default());
        let mut receiver = host.subscribe();
        let app = listen_for_remote_rebuilds(
            ListenOptions::new().with_allowed_apps(["storefront"]),
            host,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/on-child-rebuild?app=storefront")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"[hmr-sync-listen] Reload triggered");
        assert_eq!(receiver.try_recv().unwrap(), ReloadPayload::full_reload());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn router_rejects_unlisted_app_without_broadcast() {
        let host = Arc::new(ChannelHost::default());
        let mut receiver = host.subscribe();
        let app = listen_for_remote_rebuilds(
            ListenOptions::new().with_allowed_apps(["a", "b"]),
            host,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/on-child-rebuild?app=c")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn custom_endpoint_is_where_the_listener_lives() {
        let host = Arc::new(ChannelHost::default());
        let app = listen_for_remote_rebuilds(
            ListenOptions::new().with_endpoint("/custom-endpoint"),
            host,
        );

        let hit = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/custom-endpoint?app=a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(hit.status(), StatusCode::OK);

        let miss = app
            .oneshot(
                Request::builder()
                    .uri("/on-child-rebuild?app=a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(miss.status(), StatusCode::NOT_FOUND);
    }
}
