//! Tracing subscriber setup for binaries built on this crate.
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_logging`] once at startup to print them to stderr and, optionally,
//! to a log file.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "fast_jsonl=info,fj_precache=info";

/// Filter used in verbose mode when `RUST_LOG` is not set.
pub const VERBOSE_FILTER: &str = "fast_jsonl=debug,fj_precache=debug";

/// Logging setup options.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Enable debug-level library events.
    pub verbose: bool,
    /// Also append events to this file.
    pub log_file: Option<PathBuf>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level chosen by `verbose`. The returned guard
/// flushes the file sink when dropped; keep it alive for the life of the
/// program. Returns `Ok(None)` when no file sink was requested.
///
/// # Errors
///
/// Returns [`Error::Io`] if the log file directory cannot be created and
/// [`Error::InvalidConfig`] if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let default = if config.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::InvalidConfig(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let file_name = path.file_name().ok_or_else(|| {
        Error::InvalidConfig(format!("log file path {} has no file name", path.display()))
    })?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
