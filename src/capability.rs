//! Startup check that the client can talk to the configured page at all

use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("no page URL given (use --page or endpoint.page_url)")]
    MissingPage,

    #[error("page URL '{0}' is not a valid URL")]
    InvalidPage(String),

    #[error("unsupported scheme '{0}', only http and https pages can receive uploads")]
    UnsupportedScheme(String),
}

/// Verify `page` can be used as the request target. Runs once, before any
/// file is staged.
pub fn check_page(page: Option<&str>) -> Result<Url, CapabilityError> {
    let page = page.ok_or(CapabilityError::MissingPage)?;
    let url = Url::parse(page).map_err(|_| CapabilityError::InvalidPage(page.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(CapabilityError::UnsupportedScheme(other.to_string())),
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_pages_supported() {
        assert!(check_page(Some("http://localhost:5000/data_entry/3fa9")).is_ok());
        assert!(check_page(Some("https://example.com/")).is_ok());
    }

    #[test]
    fn test_unsupported_scheme() {
        assert_eq!(
            check_page(Some("ftp://example.com/upload")),
            Err(CapabilityError::UnsupportedScheme("ftp".into()))
        );
        assert_eq!(
            check_page(Some("file:///tmp/page.html")),
            Err(CapabilityError::UnsupportedScheme("file".into()))
        );
    }

    #[test]
    fn test_missing_or_invalid_page() {
        assert_eq!(check_page(None), Err(CapabilityError::MissingPage));
        assert!(matches!(
            check_page(Some("data_entry/3fa9")),
            Err(CapabilityError::InvalidPage(_))
        ));
    }
}
