use std::fs;
use std::path::Path;

use crate::types::DEFAULT_HOST_URL;

/// Process-supervisor config file the build/serve options are read from.
pub const CONFIG_FILENAME: &str = "nodemon.json";

pub const DEFAULT_BUILD_COMMAND: &str = "quasar build";
pub const DEFAULT_SERVE_COMMAND: &str = "quasar serve";

/// Partial build/serve options, as found under the `hmrSync` key of the
/// supervisor config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildServeOptions {
    pub notify: Option<bool>,
    pub host_url: Option<String>,
    pub app_name: Option<String>,
    pub port: Option<String>,
    /// "0" means no cache.
    pub cache: Option<String>,
    pub cors: Option<bool>,
    pub serve_command: Option<String>,
    pub build_command: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SupervisorConfig {
    #[serde(default, rename = "hmrSync")]
    hmr_sync: Option<BuildServeOptions>,
}

/// Read the `hmrSync` options from `nodemon.json` in `dir`.
///
/// A missing or unparseable file logs a warning and yields the empty
/// options, so every field falls back to its default. Never fatal.
#[must_use]
pub fn read_hmr_sync_config(dir: &Path) -> BuildServeOptions {
    let config_path = dir.join(CONFIG_FILENAME);

    let parsed = fs::read_to_string(&config_path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| {
            serde_json::from_str::<SupervisorConfig>(&raw).map_err(anyhow::Error::from)
        });

    match parsed {
        Ok(config) => config.hmr_sync.unwrap_or_default(),
        Err(err) => {
            tracing::warn!("[hmr-sync] Failed to read {CONFIG_FILENAME} config: {err}");
            BuildServeOptions::default()
        }
    }
}

/// Fully-populated build/serve configuration driving one build and one
/// serve invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildServeContext {
    pub port: String,
    pub cache: String,
    pub cors: bool,
    pub notify: bool,
    pub host_url: String,
    pub app_name: String,
    pub build_command: String,
    pub serve_command: String,
}

impl BuildServeContext {
    /// Merge partial file options with the hardcoded defaults. Never fails.
    #[must_use]
    pub fn resolve(options: BuildServeOptions) -> Self {
        Self {
            port: options.port.unwrap_or_else(|| "5000".to_string()),
            cache: options.cache.unwrap_or_else(|| "0".to_string()),
            cors: options.cors.unwrap_or(true),
            notify: options.notify.unwrap_or(true),
            host_url: options
                .host_url
                .unwrap_or_else(|| DEFAULT_HOST_URL.to_string()),
            app_name: options.app_name.unwrap_or_else(|| "my-app".to_string()),
            build_command: options
                .build_command
                .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string()),
            serve_command: options
                .serve_command
                .unwrap_or_else(|| DEFAULT_SERVE_COMMAND.to_string()),
        }
    }
}

impl Default for BuildServeContext {
    fn default() -> Self {
        Self::resolve(BuildServeOptions::default())
    }
}
