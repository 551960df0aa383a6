//! Diagnostic logging for the CLI
//!
//! Events go to stderr so command output on stdout stays machine-readable.

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::domain::DomainError;

/// Installs the global subscriber; `RUST_LOG` overrides the configured level
///
/// Fails if the configured level is not a valid filter or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), DomainError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(layer.pretty())
            .try_init(),
    };

    installed.map_err(|e| {
        DomainError::configuration(format!("Failed to install log subscriber: {}", e))
    })?;

    debug!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

fn level_filter(level: &str) -> Result<EnvFilter, DomainError> {
    EnvFilter::try_new(level).map_err(|e| {
        DomainError::configuration(format!("Invalid log level '{}': {}", level, e))
    })
}
