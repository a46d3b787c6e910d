/// Reload signal broadcast to connected development clients.
///
/// The default `full-reload` form asks every client to refresh; the custom
/// form carries an event name and opaque data for hosts with richer client
/// protocols.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadPayload {
    FullReload {
        path: String,
    },
    Custom {
        event: String,
        #[serde(default)]
        data: serde_json::Value,
    },
}

impl ReloadPayload {
    /// A full reload of every connected client.
    #[must_use]
    pub fn full_reload() -> Self {
        Self::FullReload {
            path: "*".to_string(),
        }
    }
}

impl Default for ReloadPayload {
    fn default() -> Self {
        Self::full_reload()
    }
}
