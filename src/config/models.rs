use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::poller::PollPolicy;
use crate::transport::HttpConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// Data-entry page the client talks to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Page URL; requests go to its path. The `--page` flag takes precedence.
    pub page_url: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            page_url: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl EndpointConfig {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}

/// Status polling schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// 1.0 keeps the interval fixed
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_interval: Duration::from_millis(self.max_interval_ms),
        }
    }
}

fn default_interval_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_interval_ms() -> u64 {
    30_000
}

/// What happens with a redirect target
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NavigationConfig {
    /// Open redirects in the system browser in addition to printing them
    #[serde(default)]
    pub open_browser: bool,
}
