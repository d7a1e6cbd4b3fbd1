use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source (file or environment) could not be read or merged.
    #[error("Could not read configuration: {0}")]
    Source(String),

    /// An explicit `--config` path that does not exist.
    #[error("Configuration file not found at path: {0}")]
    NotFound(PathBuf),

    #[error("Could not encode default configuration: {0}")]
    Defaults(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),

    #[error("Missing required configuration field: {field} (set it in barber.toml or BARBER_{env})")]
    Missing {
        field: &'static str,
        env: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Source(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Defaults(err.to_string())
    }
}
