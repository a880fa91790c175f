// Layered configuration: built-in defaults, then travel-admin.toml, then
// TRAVEL_ADMIN_* environment variables (`__` separates nested sections,
// so TRAVEL_ADMIN_BACKEND__URL sets backend.url)

use crate::backend::BackendConfig;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "travel-admin.toml";
pub const ENV_PREFIX: &str = "TRAVEL_ADMIN_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Configuration section '{section}' is not configured (missing required fields)")]
    NotConfigured { section: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    // Quiet period before a burst of change events triggers one refetch
    pub debounce_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self { debounce_ms: 250 }
    }
}

impl RealtimeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// Passed through untouched to map-rendering frontends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("exports"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    // Same as load, after reading a .env file from the working directory if one exists
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.backend.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.retry.backoff_multiplier".to_string(),
                reason: "must be at least 1.0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.backend.retry.jitter_factor) {
            return Err(ConfigError::InvalidValue {
                field: "backend.retry.jitter_factor".to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        Ok(())
    }

    // The backend section, or an error naming it when url or api_key is missing
    pub fn require_backend(&self) -> Result<&BackendConfig, ConfigError> {
        if self.backend.is_configured() {
            Ok(&self.backend)
        } else {
            Err(ConfigError::NotConfigured {
                section: "backend".to_string(),
            })
        }
    }
}
