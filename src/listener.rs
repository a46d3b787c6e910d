use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{self, HeaderValue};
use axum::http::{Request, Response, StatusCode};
use tower::Service;
use url::Url;

use crate::host::HostServer;
use crate::logger::PluginLogger;
use crate::plugin::LISTEN_PLUGIN_NAME;
use crate::types::ListenConfig;

/// Base used when a request carries no usable `Host` header.
const FALLBACK_BASE: &str = "http://localhost";
/// App name reported when the query does not carry one.
const UNKNOWN_APP: &str = "unknown";

type BoxedFuture =
    Pin<Box<dyn Future<Output = Result<Response<Body>, Infallible>> + Send + 'static>>;

#[derive(Debug, thiserror::Error)]
enum RequestHandlingError {
    #[error("failed to parse request url: {0}")]
    Url(#[from] url::ParseError),
}

/// Request handler that turns rebuild notifications into reload broadcasts.
///
/// Mounted once inside a host dev server at the configured endpoint; each
/// request is handled independently and ends in one of three states:
/// accepted (200, broadcast sent), rejected (403, app not on the allow-list)
/// or failed (500).
pub struct RebuildListener {
    config: ListenConfig,
    host: Arc<dyn HostServer>,
}

impl RebuildListener {
    #[must_use]
    pub fn new(config: ListenConfig, host: Arc<dyn HostServer>) -> Self {
        Self { config, host }
    }

    #[must_use]
    pub fn config(&self) -> &ListenConfig {
        &self.config
    }

    pub fn handle_request(&self, req: &Request<Body>) -> Response<Body> {
        let logger = PluginLogger::new(LISTEN_PLUGIN_NAME, "host", self.config.suppress_logs);

        match self.try_handle(req, &logger) {
            Ok(response) => response,
            Err(err) => {
                logger.error_with("Error handling request:", &err);
                plain_text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("[{LISTEN_PLUGIN_NAME}] Internal error"),
                )
            }
        }
    }

    fn try_handle(
        &self,
        req: &Request<Body>,
        logger: &PluginLogger,
    ) -> Result<Response<Body>, RequestHandlingError> {
        let app_name = extract_app_name(req)?;

        if !self.config.allows(&app_name) {
            logger.warn(&format!(
                "Rebuild from unlisted app \"{app_name}\" ignored."
            ));
            return Ok(plain_text(
                StatusCode::FORBIDDEN,
                format!("[{LISTEN_PLUGIN_NAME}] App \"{app_name}\" not allowed"),
            ));
        }

        logger.info(&format!("Received rebuild signal from \"{app_name}\""));

        self.host.broadcast(&self.config.hot_payload);
        let response = plain_text(
            StatusCode::OK,
            format!("[{LISTEN_PLUGIN_NAME}] Reload triggered"),
        );

        // Hook panics are deliberately not caught here.
        if let Some(hook) = &self.config.on_rebuild {
            hook(&app_name, self.host.as_ref());
        }

        Ok(response)
    }

    pub const fn into_service(self: Arc<Self>) -> RebuildListenerService {
        RebuildListenerService { inner: self }
    }
}

impl std::fmt::Debug for RebuildListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildListener")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Rebuild the absolute request URL from the `Host` header and pull out the
/// `app` query parameter.
fn extract_app_name(req: &Request<Body>) -> Result<String, RequestHandlingError> {
    let base = req
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map_or_else(|| FALLBACK_BASE.to_string(), |host| format!("http://{host}"));

    let url = Url::parse(&format!("{base}{}", req.uri()))?;

    let app_name = url
        .query_pairs()
        .find(|(key, _)| key == "app")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| UNKNOWN_APP.to_string());

    Ok(app_name)
}

fn plain_text(status: StatusCode, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[derive(Clone)]
pub struct RebuildListenerService {
    inner: Arc<RebuildListener>,
}

impl Service<Request<Body>> for RebuildListenerService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let listener = self.inner.clone();
        Box::pin(async move { Ok(listener.handle_request(&req)) })
    }
}
