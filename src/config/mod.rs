//! Configuration management for the data-entry client
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use dataentry::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Polling every {} ms", config.poll.interval_ms);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `DATAENTRY__<section>__<key>`:
//! - `DATAENTRY__ENDPOINT__PAGE_URL=http://localhost:5000/data_entry/3fa9`
//! - `DATAENTRY__POLL__INTERVAL_MS=1000`
//! - `DATAENTRY__NAVIGATION__OPEN_BROWSER=true`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/dataentry.toml`.
//! This can be overridden using the `DATAENTRY_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

pub use models::{Config, EndpointConfig, NavigationConfig, PollConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[navigation]\nopen_browser = true\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert!(config.navigation.open_browser);
        assert_eq!(config.poll.interval_ms, 500);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[poll]\ninterval_ms = 0\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ZeroPollInterval)
        ));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[poll\ninterval_ms = ").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
