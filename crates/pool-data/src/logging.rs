use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "pool_data=info,warn";

/// Daily log files under `log_dir`, keeping the newest `max_log_files`.
fn file_appender(logging: &LoggingConfig) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&logging.log_dir)
        .with_context(|| format!("failed to create log dir {}", logging.log_dir))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .max_log_files(logging.max_log_files)
        .build(&logging.log_dir)
        .context("failed to build rolling log appender")
}

/// Initialise the global tracing subscriber.
///
/// Stdout carries nothing but the pool summary JSON, so it can be piped.
/// Diagnostics go to stderr in compact form and to the rolling file as JSON
/// lines.
///
/// Returns a [`WorkerGuard`] that **must** be held for the lifetime of the
/// process; dropping it flushes and closes the log file writer.
pub fn init_tracing(logging: &LoggingConfig) -> Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(logging)?);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false).json())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_file_appender_creates_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let log_dir = tmp.path().join("nested").join("logs");
        let logging = LoggingConfig {
            log_dir: log_dir.to_string_lossy().into_owned(),
            file_prefix: "pool-data.log".into(),
            max_log_files: 3,
        };
        assert!(file_appender(&logging).is_ok());
        assert!(log_dir.is_dir());
    }
}
