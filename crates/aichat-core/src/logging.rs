//! Tracing subscriber setup.
//!
//! `AICHAT_LOG` takes an `EnvFilter` directive and wins over the configured
//! level. Logs go to stderr so streamed output on stdout stays clean, or to
//! a daily rolling file when `logging.file` is set.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, paths};

const LOG_ENV: &str = "AICHAT_LOG";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits. It is `None` when logging to stderr.
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive.trim())
            .with_context(|| format!("Invalid {LOG_ENV} filter"))?,
        _ => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid logging.level '{}'", config.level))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.file {
        let appender = tracing_appender::rolling::daily(paths::logs_dir(), "aichat.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        builder
            .with_ansi(false)
            .with_writer(writer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;
        Ok(Some(guard))
    } else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;
        Ok(None)
    }
}
