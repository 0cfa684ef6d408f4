//! Request transport to the page endpoint

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{TaskReport, TaskRequest};

pub use http::{HttpConfig, HttpEndpoint};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Server responded with HTTP {status}")]
    Status { status: u16 },

    #[error("Undecodable response body: {0}")]
    Decode(String),

    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// The single page-relative endpoint every request goes to.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Send one request and return the decoded `data` body.
    async fn send(&self, request: TaskRequest) -> Result<TaskReport>;

    /// Resolve a server-provided redirect (possibly relative) to an absolute URL.
    fn resolve_redirect(&self, redirect: &str) -> String {
        redirect.to_string()
    }
}
