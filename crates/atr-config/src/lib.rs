//! # atr-config
//!
//! Layered configuration loading for Atrium using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`ATRIUM_*` prefix, `__` as separator)
//! 2. Project-level `.atrium/config.toml`
//! 3. User-level `~/.config/atrium/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ATRIUM_ERRORS__MAX_ERRORS` -> `errors.max_errors`,
//! `ATRIUM_RETRY__DELAY_MS` -> `retry.delay_ms`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use atr_config::AtriumConfig;
//!
//! let config = AtriumConfig::load_with_dotenv().expect("config");
//! println!("store capacity: {}", config.errors.max_errors);
//! ```

mod error;
mod retry;
mod store;

pub use error::ConfigError;
pub use retry::RetryConfig;
pub use store::ErrorsConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AtriumConfig {
    #[serde(default)]
    pub errors: ErrorsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl AtriumConfig {
    /// Load and validate configuration from TOML files and environment variables.
    ///
    /// Does NOT call `dotenvy` -- use [`load_with_dotenv`](Self::load_with_dotenv)
    /// if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".atrium/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("ATRIUM_").split("__"))
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::InvalidValue` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.errors.validate()?;
        self.retry.validate()
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("atrium").join("config.toml"))
    }
}
