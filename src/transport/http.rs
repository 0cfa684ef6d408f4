//! reqwest-backed endpoint

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use super::{Endpoint, Result, TransportError};
use crate::protocol::{Envelope, TaskReport, TaskRequest};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: concat!("dataentry/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Posts form requests to the path of the data-entry page.
///
/// Requests are sent once. A failed request is reported to the caller and
/// never retried here.
pub struct HttpEndpoint {
    client: Client,
    page: Url,
    target: Url,
}

impl HttpEndpoint {
    pub fn new(page_url: &str, config: HttpConfig) -> Result<Self> {
        let page = Url::parse(page_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", page_url, e)))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let target = page_path(&page);

        Ok(Self {
            client,
            page,
            target,
        })
    }

    /// URL every request is posted to.
    pub fn target(&self) -> &Url {
        &self.target
    }
}

/// The page URL without query string or fragment.
fn page_path(page: &Url) -> Url {
    let mut target = page.clone();
    target.set_query(None);
    target.set_fragment(None);
    target
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    async fn send(&self, request: TaskRequest) -> Result<TaskReport> {
        debug!(url = %self.target, kind = request.kind(), "Sending request");

        let response = self
            .client
            .post(self.target.clone())
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(envelope.data)
    }

    fn resolve_redirect(&self, redirect: &str) -> String {
        match self.page.join(redirect) {
            Ok(url) => url.to_string(),
            Err(_) => redirect.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("dataentry/"));
    }

    #[test]
    fn test_target_drops_query_and_fragment() {
        let endpoint = HttpEndpoint::new(
            "http://localhost:5000/data_entry/abc123?step=2#files",
            HttpConfig::default(),
        )
        .unwrap();

        assert_eq!(
            endpoint.target().as_str(),
            "http://localhost:5000/data_entry/abc123"
        );
    }

    #[test]
    fn test_relative_redirect_resolves_against_page() {
        let endpoint =
            HttpEndpoint::new("http://localhost:5000/data_entry/abc123", HttpConfig::default())
                .unwrap();

        assert_eq!(
            endpoint.resolve_redirect("/done"),
            "http://localhost:5000/done"
        );
        assert_eq!(
            endpoint.resolve_redirect("https://example.com/failed"),
            "https://example.com/failed"
        );
    }

    #[test]
    fn test_invalid_page_url() {
        let result = HttpEndpoint::new("not a url", HttpConfig::default());
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }
}
