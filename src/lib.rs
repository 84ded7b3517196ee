//! RCON Admin Library
//!
//! Remote console administration for dedicated game servers: a serialized
//! session over the Source RCON protocol, a batch command executor, a
//! persisted player roster and a change-tracking server options cache.

pub mod cli;
pub mod config;
pub mod executor;
pub mod metrics;
pub mod notify;
pub mod options;
pub mod rcon;
pub mod roster;
pub mod session;
pub mod storage;
pub mod ui;

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

/// Application result type for consistent error handling
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize tracing subscriber for logging.
///
/// With `log_dir` set, a second layer writes one file per run into it. The
/// returned guard flushes that file and must live as long as the process.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("rcon_admin={}", level).into())
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file_name = format!("{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter()),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
