use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("failed to open {url}: {source}")]
    Open {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write redirect target: {0}")]
    Output(#[from] std::io::Error),
}

/// Where a terminal redirect goes.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), NavigationError>;
}

/// Prints the redirect target on stdout.
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", url)?;
        Ok(())
    }
}

/// Prints the redirect target and opens it in the system browser.
#[derive(Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        ConsoleNavigator.navigate(url)?;
        open::that(url).map_err(|source| NavigationError::Open {
            url: url.to_string(),
            source,
        })
    }
}
