use std::borrow::Cow;
use std::sync::OnceLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::logger::PluginLogger;
use crate::plugin::NOTIFY_PLUGIN_NAME;
use crate::types::NotifyConfig;

/// Characters kept verbatim in the `app` query value (RFC 3986 unreserved).
const QUERY_VALUE_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Longest response-body excerpt quoted in a warning.
const MAX_BODY_PREVIEW: usize = 200;

fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// Notify the host server that a build for `config.app_name` has ended.
///
/// Fire-and-forget: exactly one outbound request at most, every outcome is
/// logged and nothing is returned or raised to the caller. With
/// `notify_on_success_only` set, a present `build_error` short-circuits the
/// call before any network activity.
pub async fn send_notification(config: &NotifyConfig, build_error: Option<&anyhow::Error>) {
    let logger = PluginLogger::new(NOTIFY_PLUGIN_NAME, &config.app_name, config.suppress_logs);

    if config.notify_on_success_only
        && let Some(err) = build_error
    {
        logger.error_with("Build failed, skipping notification.", err);
        return;
    }

    match build_error {
        Some(_) => logger.warn("Build ended with an error, notifying host..."),
        None => logger.info("Build successful, notifying host..."),
    }

    let app = utf8_percent_encode(&config.app_name, QUERY_VALUE_ENCODE);
    let full_url = format!("{}{}?app={}", config.host_url, config.endpoint, app);

    let target_url = match Url::parse(&full_url) {
        Ok(url) => url,
        Err(err) => {
            logger.error_with(&format!("Invalid URL: \"{full_url}\""), &err);
            return;
        }
    };

    logger.info(&format!(
        "Sending {} request to {target_url}",
        config.method
    ));

    // The client picks plain or TLS transport from the URL scheme.
    let request = http_client()
        .request(config.method.into(), target_url)
        .header(
            reqwest::header::USER_AGENT,
            format!("{NOTIFY_PLUGIN_NAME}/{}", config.app_name),
        );

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                logger.info(&format!("Host notified ({})", status.as_u16()));
            } else {
                let body = response.text().await.unwrap_or_default();
                logger.warn(&format!(
                    "Host responded with {}. Response: {}",
                    status.as_u16(),
                    truncate_body(&body)
                ));
            }
        }
        Err(err) => logger.error_with("Notification failed:", &err),
    }
}

fn truncate_body(body: &str) -> Cow<'_, str> {
    if body.chars().count() <= MAX_BODY_PREVIEW {
        Cow::Borrowed(body)
    } else {
        let mut preview: String = body.chars().take(MAX_BODY_PREVIEW).collect();
        preview.push_str("...");
        Cow::Owned(preview)
    }
}
