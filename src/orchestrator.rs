use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context as _, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::build_config::{BuildServeContext, read_hmr_sync_config};
use crate::logger::PluginLogger;
use crate::notifier::send_notification;
use crate::plugin::NOTIFY_PLUGIN_NAME;
use crate::types::{NotifyConfig, NotifyOptions};

/// Serve-output line marking that the server accepts connections.
pub const READY_MARKER: &str = "Listening at";

/// Build output lands here, and the serve command serves it from here.
const DIST_SUBDIR: &str = "dist/spa";

fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

fn dist_dir(dir: &Path) -> PathBuf {
    dir.join(DIST_SUBDIR)
}

/// Run the build command to completion.
///
/// # Errors
/// Fails if the command cannot be spawned or exits non-zero.
pub async fn start_build(ctx: &BuildServeContext, dir: &Path) -> Result<String> {
    let logger = PluginLogger::new(NOTIFY_PLUGIN_NAME, &ctx.app_name, false);
    logger.log("Starting build...");

    let command = format!("{} {}", ctx.build_command, dist_dir(dir).display());
    let output = shell_command(&command)
        .output()
        .await
        .with_context(|| format!("failed to run build command `{command}`"))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        logger.warn(stderr.trim_end());
    }

    if !output.status.success() {
        logger.error(&format!("Error during build: {}", output.status));
        bail!("build command `{command}` exited with {}", output.status);
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    logger.log(stdout.trim_end());
    logger.log("Build completed successfully!");

    Ok(stdout)
}

/// Start the serve command as a long-running child process.
///
/// Both output streams are forwarded to the log line by line. The first
/// stdout line containing [`READY_MARKER`] fires one notification to the
/// configured host, if `ctx.notify` is set; later matching lines do not
/// re-fire. The child is returned to the caller, which owns its lifetime
/// from here; there is no restart on crash and no health check loop.
///
/// # Errors
/// Fails if the command cannot be spawned.
pub async fn start_serve(ctx: &BuildServeContext, dir: &Path) -> Result<Child> {
    let logger = PluginLogger::new(NOTIFY_PLUGIN_NAME, &ctx.app_name, false);
    logger.log("Starting server...");

    let command = serve_command_line(ctx, dir);
    let mut child = shell_command(&command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start serve command `{command}`"))?;

    let stdout = child
        .stdout
        .take()
        .context("serve command stdout was not piped")?;
    let stderr = child
        .stderr
        .take()
        .context("serve command stderr was not piped")?;

    let stderr_logger = logger.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            stderr_logger.error(&format!("Server error: {line}"));
        }
    });

    let notify = ctx.notify;
    let notify_options = NotifyOptions::new(&ctx.app_name).with_host_url(&ctx.host_url);
    tokio::spawn(async move {
        let mut notified = false;
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            logger.log(&format!("Server log: {line}"));

            if notify && !notified && line.contains(READY_MARKER) {
                logger.log("Server is running, sending notification...");
                match NotifyConfig::resolve(notify_options.clone()) {
                    Ok(config) => send_notification(&config, None).await,
                    Err(err) => logger.error_with("Error:", &err),
                }
                notified = true;
            }
        }
    });

    Ok(child)
}

fn serve_command_line(ctx: &BuildServeContext, dir: &Path) -> String {
    let mut command = format!("{} {}", ctx.serve_command, dist_dir(dir).display());
    if !ctx.port.is_empty() {
        command.push_str(&format!(" --port {}", ctx.port));
    }
    if !ctx.cache.is_empty() {
        command.push_str(&format!(" --cache {}", ctx.cache));
    }
    if ctx.cors {
        command.push_str(" --cors");
    }
    command
}

/// Read the file config from `dir`, build, then serve.
///
/// # Errors
/// Fails if the build fails or the serve command cannot be spawned.
pub async fn start_build_and_serve(dir: &Path) -> Result<Child> {
    let file_config = read_hmr_sync_config(dir);
    let ctx = BuildServeContext::resolve(file_config);

    start_build(&ctx, dir).await?;
    start_serve(&ctx, dir).await
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::extract::State;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::build_config::BuildServeOptions;

    fn test_ctx() -> BuildServeContext {
        BuildServeContext::default()
    }

    #[test]
    fn serve_command_line_carries_port_cache_and_cors() {
        let command = serve_command_line(&test_ctx(), Path::new("/work"));

        assert_eq!(
            command,
            "quasar serve /work/dist/spa --port 5000 --cache 0 --cors"
        );
    }

    #[test]
    fn serve_command_line_omits_unset_flags() {
        let ctx = BuildServeContext {
            port: String::new(),
            cache: String::new(),
            cors: false,
            ..test_ctx()
        };

        let command = serve_command_line(&ctx, Path::new("/work"));

        assert_eq!(command, "quasar serve /work/dist/spa");
    }

    #[tokio::test]
    async fn build_succeeds_with_a_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildServeContext {
            build_command: "echo building".to_string(),
            ..test_ctx()
        };

        let stdout = start_build(&ctx, dir.path()).await.unwrap();

        assert!(stdout.contains("building"));
    }

    #[tokio::test]
    async fn build_fails_on_a_non_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildServeContext {
            build_command: "false".to_string(),
            ..test_ctx()
        };

        assert!(start_build(&ctx, dir.path()).await.is_err());
    }

    async fn record(State(hits): State<Arc<Mutex<Vec<String>>>>, req: Request<Body>) -> StatusCode {
        hits.lock().unwrap().push(req.uri().to_string());
        StatusCode::OK
    }

    async fn spawn_capture_host() -> (String, Arc<Mutex<Vec<String>>>) {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .fallback(record)
            .with_state(Arc::clone(&hits));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    async fn settle(hits: &Arc<Mutex<Vec<String>>>, expected: usize) {
        for _ in 0..250 {
            if hits.lock().unwrap().len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        // Grace period so an extra notification would have time to land
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn ready_marker_fires_exactly_one_notification() {
        let (host_url, hits) = spawn_capture_host().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildServeContext::resolve(BuildServeOptions {
            host_url: Some(host_url),
            app_name: Some("storefront".to_string()),
            // The trailing `#` comments out the dist dir and serve flags
            serve_command: Some(
                "echo 'Listening at http://localhost' && echo 'Listening at again' #".to_string(),
            ),
            ..BuildServeOptions::default()
        });

        let mut child = start_serve(&ctx, dir.path()).await.unwrap();
        child.wait().await.unwrap();
        settle(&hits, 1).await;

        let hits = hits.lock().unwrap();
        assert_eq!(*hits, vec!["/on-child-rebuild?app=storefront".to_string()]);
    }

    #[tokio::test]
    async fn notify_disabled_sends_nothing_on_ready() {
        let (host_url, hits) = spawn_capture_host().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildServeContext::resolve(BuildServeOptions {
            host_url: Some(host_url),
            notify: Some(false),
            serve_command: Some("echo 'Listening at http://localhost' #".to_string()),
            ..BuildServeOptions::default()
        });

        let mut child = start_serve(&ctx, dir.path()).await.unwrap();
        child.wait().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(hits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn marker_free_output_sends_nothing() {
        let (host_url, hits) = spawn_capture_host().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildServeContext::resolve(BuildServeOptions {
            host_url: Some(host_url),
            serve_command: Some("echo 'starting up' #".to_string()),
            ..BuildServeOptions::default()
        });

        let mut child = start_serve(&ctx, dir.path()).await.unwrap();
        child.wait().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(hits.lock().unwrap().is_empty());
    }
}
