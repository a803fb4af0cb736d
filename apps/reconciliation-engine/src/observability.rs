//! Structured logging setup.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Error type for logging initialization.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Initialize the global tracing subscriber.
///
/// The level filter comes from `RUST_LOG` when set, otherwise from the
/// configured level. Output is JSON unless the configured format is "text".
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ObservabilityError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let result = if config.format == "text" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    };

    result.map_err(|e| ObservabilityError::SubscriberError(e.to_string()))?;

    tracing::info!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
