use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "DATAENTRY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/dataentry.toml";
const ENV_PREFIX: &str = "DATAENTRY";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    load_from_sources(default_path())
}

/// Config file path: `DATAENTRY_CONFIG` or `config/dataentry.toml`
fn default_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // DATAENTRY__POLL__INTERVAL_MS -> poll.interval_ms
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.poll.interval_ms, 500);
        assert!(!config.navigation.open_browser);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[endpoint]
page_url = "https://dataentry.example.com/data_entry/3fa9"
request_timeout_ms = 15000

[poll]
interval_ms = 250
backoff_multiplier = 1.5
max_interval_ms = 4000

[navigation]
open_browser = true
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(
            config.endpoint.page_url.as_deref(),
            Some("https://dataentry.example.com/data_entry/3fa9")
        );
        assert_eq!(config.endpoint.request_timeout_ms, 15_000);
        assert_eq!(config.endpoint.connect_timeout_ms, 10_000);
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.poll.max_interval_ms, 4_000);
        assert!(config.navigation.open_browser);
    }

    // Environment overrides are not exercised here: env::set_var is unsafe
    // under edition 2024 and races with other tests.
}
