//! Logging for scour binaries and tests.
//!
//! Events go to a daily-rotated file, `<dir>/scour.log.YYYY-MM-DD`, and
//! optionally to stderr as well. The directory is taken from
//! [`LogConfig::log_dir`], then `SCOUR_LOG_DIR`, then
//! `~/.local/share/<app>`. `RUST_LOG` overrides the configured filter.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Keeps the background writer alive for the life of the process.
static FLUSH_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Overrides the log directory when no explicit one is configured.
pub const LOG_DIR_ENV: &str = "SCOUR_LOG_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Names the default directory and the log file.
    pub app_name: &'static str,
    pub log_dir: Option<PathBuf>,
    /// Mirror events to stderr.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `scour_web=debug,info`.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "scour",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber and return today's log file.
///
/// Only the first call installs anything; later calls return the file
/// chosen by the first one.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = ACTIVE_LOG_FILE.get() {
        return Ok(path.clone());
    }

    let dir = log_directory(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let file_stem = format!("{}.log", config.app_name);
    let log_file = dir.join(format!("{file_stem}.{}", Local::now().format("%Y-%m-%d")));

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &file_stem));
    let _ = FLUSH_GUARD.set(guard);

    let mut layers: Vec<BoxedLayer> = vec![file_layer(config.format, writer)];
    if config.emit_stderr {
        layers.push(stderr_layer(config.format));
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install tracing subscriber: {e}"))?;

    tracing::debug!(path = %log_file.display(), "logging.initialised");
    let _ = ACTIVE_LOG_FILE.set(log_file.clone());
    Ok(log_file)
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    }
}

fn log_directory(app_name: &str, configured: Option<&Path>) -> PathBuf {
    let chosen = configured
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from));
    match chosen {
        Some(dir) => expand_home(&dir),
        None => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local/share").join(app_name),
            None => PathBuf::from(app_name),
        },
    }
}

/// `~/x` becomes `$HOME/x`; anything else is returned as is.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}
