//! Logging configuration for Wooverzicht

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

const LOG_FILE_PREFIX: &str = "wooverzicht.log";

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},wooverzicht={level}")))
}

/// Initialize logging with console output and, if enabled, a daily rolling file.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    if !config.file_output {
        Registry::default()
            .with(env_filter(&config.level))
            .with(console_layer)
            .try_init()
            .map_err(|e| crate::WooError::Custom(format!("Failed to init logging: {e}")))?;
        tracing::info!("Logging initialized with level: {} (console only)", config.level);
        return Ok(None);
    }

    std::fs::create_dir_all(&config.directory)?;
    let file_appender = tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::WooError::Custom(format!("Failed to init logging: {e}")))?;

    tracing::info!(
        "Logging initialized with level: {} - console and file output enabled",
        config.level
    );
    tracing::info!(
        "Log files will be saved to: {}/{}.YYYY-MM-DD",
        config.directory.display(),
        LOG_FILE_PREFIX
    );

    Ok(Some(guard))
}

/// Initialize simple console logging for tools and tests
pub fn init_simple_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| crate::WooError::Custom(format!("Failed to init logging: {e}")))?;
    Ok(())
}
