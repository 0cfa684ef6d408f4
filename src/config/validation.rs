use super::models::Config;
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Poll interval must be positive")]
    ZeroPollInterval,

    #[error("Backoff multiplier must be at least 1.0, got {0}")]
    InvalidBackoffMultiplier(f64),

    #[error("max_interval_ms ({max}) is below interval_ms ({interval})")]
    MaxIntervalBelowInterval { interval: u64, max: u64 },

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: String },

    #[error("Invalid page URL '{url}': {reason}")]
    InvalidPageUrl { url: String, reason: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_poll(config)?;
    validate_endpoint(config)?;
    Ok(())
}

fn validate_poll(config: &Config) -> Result<(), ValidationError> {
    let poll = &config.poll;

    if poll.interval_ms == 0 {
        return Err(ValidationError::ZeroPollInterval);
    }

    if poll.backoff_multiplier.is_nan() || poll.backoff_multiplier < 1.0 {
        return Err(ValidationError::InvalidBackoffMultiplier(
            poll.backoff_multiplier,
        ));
    }

    if poll.max_interval_ms < poll.interval_ms {
        return Err(ValidationError::MaxIntervalBelowInterval {
            interval: poll.interval_ms,
            max: poll.max_interval_ms,
        });
    }

    Ok(())
}

fn validate_endpoint(config: &Config) -> Result<(), ValidationError> {
    let endpoint = &config.endpoint;

    for (field, value) in [
        ("connect_timeout_ms", endpoint.connect_timeout_ms),
        ("request_timeout_ms", endpoint.request_timeout_ms),
    ] {
        if value == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: field.to_string(),
            });
        }
    }

    if let Some(url) = &endpoint.page_url {
        Url::parse(url).map_err(|e| ValidationError::InvalidPageUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_interval() {
        let mut config = Config::default();
        config.poll.interval_ms = 0;

        assert!(matches!(validate(&config), Err(ValidationError::ZeroPollInterval)));
    }

    #[test]
    fn test_backoff_below_one() {
        let mut config = Config::default();
        config.poll.backoff_multiplier = 0.5;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidBackoffMultiplier(_))
        ));

        config.poll.backoff_multiplier = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_max_interval_below_interval() {
        let mut config = Config::default();
        config.poll.interval_ms = 2_000;
        config.poll.max_interval_ms = 1_000;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::MaxIntervalBelowInterval { interval: 2_000, max: 1_000 })
        ));
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.endpoint.request_timeout_ms = 0;

        match validate(&config) {
            Err(ValidationError::ZeroTimeout { field }) => assert_eq!(field, "request_timeout_ms"),
            other => panic!("Expected ZeroTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_page_url() {
        let mut config = Config::default();
        config.endpoint.page_url = Some("data_entry/abc".to_string());

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidPageUrl { .. })
        ));
    }
}
