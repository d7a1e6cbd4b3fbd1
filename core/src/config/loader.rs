use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::error::{ConfigError, Result};
use crate::retry::RetryConfig;
use crate::session::FileSessionStore;

/// Prefix of environment overrides (`BARBER_API_URL`, `BARBER_RETRY__JITTER`).
const ENV_PREFIX: &str = "BARBER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the booking API. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deadline for any call a screen makes, retries included: optimistic
    /// edits, deletes, adds and bookings alike. Unset means no deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_timeout_ms: Option<u64>,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            mutation_timeout_ms: None,
            retry: RetryConfig::default(),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// The validated API base URL.
    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .ok_or(ConfigError::Missing {
                field: "api_url",
                env: "API_URL",
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn mutation_timeout(&self) -> Option<Duration> {
        self.mutation_timeout_ms.map(Duration::from_millis)
    }

    /// Where the session is persisted; the platform config dir by default.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session_file
            .clone()
            .or_else(FileSessionStore::default_path)
    }

    fn validate(&self) -> Result<()> {
        if let Some(raw) = &self.api_url {
            let url = Url::parse(raw)
                .map_err(|err| ConfigError::Invalid(format!("api_url '{raw}': {err}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "api_url '{raw}' must be http or https"
                )));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.mutation_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "mutation_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        Ok(())
    }
}

/// Configuration loader with layered merging
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Use an explicit config file. Missing files are an error.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn load(&self) -> Result<ClientConfig> {
        let mut builder = Config::builder();

        // Layer 1: Defaults
        let defaults_json = serde_json::to_string(&ClientConfig::default())?;
        builder = builder.add_source(File::from_str(&defaults_json, config::FileFormat::Json));

        // Layer 2: Config file
        if let Some(path) = &self.config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.clone()));
            }
            tracing::debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path.as_path()));
        }

        // Layer 3: Environment, e.g. BARBER_RETRY__MAX_ATTEMPTS=5
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: ClientConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Locate the default config file in standard locations:
    /// 1. Current directory: ./barber.toml
    /// 2. XDG config: ~/.config/barber/config.toml
    /// 3. Home directory: ~/.barber.toml
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from("./barber.toml");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("barber").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".barber.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<ClientConfig> {
        match Self::find_config_file() {
            Some(path) => ConfigLoader::new().with_file(path).load(),
            None => ConfigLoader::new().load(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
