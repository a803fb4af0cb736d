//! Configuration loading for the reconciliation engine.
//!
//! # Usage
//!
//! ```rust,ignore
//! use reconciliation_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway connection configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Order persistence configuration.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gateway connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host of the gateway process.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port of the gateway process.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client identifier for this session. Orders placed under other client
    /// ids are invisible to this engine.
    #[serde(default = "default_client_id")]
    pub client_id: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_id: default_client_id(),
        }
    }
}

/// Order persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding persisted order metadata.
    #[serde(default = "default_orders_dir")]
    pub orders_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            orders_dir: default_orders_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: "json" or "text".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    7496
}

const fn default_client_id() -> i64 {
    1
}

fn default_orders_dir() -> PathBuf {
    PathBuf::from("data/orders")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Load configuration from a YAML file.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_string(),
        source,
    })?;

    let config: Config = serde_yaml_bw::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.gateway.client_id < 0 {
        return Err(ConfigError::ValidationError(
            "gateway.client_id must be non-negative".to_string(),
        ));
    }
    if config.gateway.host.is_empty() {
        return Err(ConfigError::ValidationError(
            "gateway.host must not be empty".to_string(),
        ));
    }
    Ok(())
}
