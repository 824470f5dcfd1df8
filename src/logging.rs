//! Tracing subscriber setup.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {source}")]
    InvalidFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to install the tracing subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from `RUST_LOG` when set, falling back to the configured level.
pub fn build_filter(env_directive: Option<&str>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = env_directive.filter(|d| !d.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directive)
        .map_err(|source| LoggingError::InvalidFilter { directive: directive.to_string(), source })
}

/// Installs the global subscriber.
///
/// With `directory` set, events go to a daily rolling file through a non-blocking
/// writer and the returned guard must be kept alive to flush them. Otherwise they
/// go to stderr and no guard is returned.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let env_directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env_directive.as_deref(), &config.level)?;

    if let Some(directory) = &config.directory {
        let appender = tracing_appender::rolling::daily(Path::new(directory), &config.file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
            .try_init()?;
        tracing::info!(directory = %directory, file_name = %config.file_name, "File logging initialized");
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init()?;
        Ok(None)
    }
}
