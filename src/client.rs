//! Command implementations of the binary

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::cli::{FileArgs, PageArgs};
use dataentry::capability::{self, CapabilityError};
use dataentry::config::{Config, ConfigError};
use dataentry::intake::{FileEntry, FileIntake, IntakeReport, parse_dropped_paths};
use dataentry::observability::Metrics;
use dataentry::session::{
    BrowserNavigator, ConsoleNavigator, Navigator, Session, SessionError, SessionOutcome,
};
use dataentry::transport::{HttpEndpoint, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to read dropped paths: {0}")]
    Stdin(#[from] std::io::Error),

    #[error("no terminal status reached ({finished} of {expected} uploads finished)")]
    Stalled { finished: usize, expected: usize },
}

pub fn load_config(path: Option<PathBuf>) -> Result<Config, ClientError> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

pub async fn upload(config: &Config, page: &PageArgs, files: &FileArgs) -> Result<(), ClientError> {
    let mut session = open_session(config, page)?;

    stage(session.intake_mut(), files).await?;

    let handle = session.handle();
    tokio::spawn(async move {
        interrupt_signal().await;
        info!("Interrupted, asking the server to cancel the batch (interrupt again to quit)");
        handle.cancel();
        interrupt_signal().await;
        std::process::exit(130);
    });

    let outcome = session.upload().await?;
    finish(outcome)
}

pub async fn inspect(files: &FileArgs) -> Result<(), ClientError> {
    let metrics = Arc::new(Metrics::new());
    let mut intake = FileIntake::new(metrics.clone());
    stage(&mut intake, files).await?;

    let snapshot = metrics.snapshot();
    info!(
        accepted = snapshot.files_accepted,
        rejected = snapshot.files_rejected,
        "Inspection done"
    );
    Ok(())
}

pub async fn action(config: &Config, page: &PageArgs, name: &str) -> Result<(), ClientError> {
    let mut session = open_session(config, page)?;
    let outcome = session.navigate(name).await;
    finish(outcome)
}

pub async fn cancel(config: &Config, page: &PageArgs) -> Result<(), ClientError> {
    let mut session = open_session(config, page)?;
    let outcome = session.cancel().await;
    finish(outcome)
}

fn open_session(config: &Config, page: &PageArgs) -> Result<Session, ClientError> {
    let page_url = page.page.as_deref().or(config.endpoint.page_url.as_deref());
    let url = capability::check_page(page_url)?;

    let endpoint = HttpEndpoint::new(url.as_str(), config.endpoint.http_config())?;
    info!(target_url = %endpoint.target(), "Using page endpoint");

    let navigator: Arc<dyn Navigator> = if page.open || config.navigation.open_browser {
        Arc::new(BrowserNavigator)
    } else {
        Arc::new(ConsoleNavigator)
    };

    Ok(Session::new(Arc::new(endpoint), navigator, config.poll.policy()))
}

/// Run picker and drop intake, printing each event's manifest.
async fn stage(intake: &mut FileIntake, files: &FileArgs) -> Result<(), ClientError> {
    if !files.files.is_empty() {
        let report = intake.select(entries(&files.files));
        print_manifest(&report);
    }

    if files.drop {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        let dropped = parse_dropped_paths(&text);
        let report = intake.drop_files(entries(&dropped));
        print_manifest(&report);
    }

    info!(accepted = intake.accepted().len(), "Intake complete");
    Ok(())
}

fn entries(paths: &[PathBuf]) -> Vec<FileEntry> {
    paths
        .iter()
        .filter_map(|path| match FileEntry::from_path(path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping file");
                None
            }
        })
        .collect()
}

fn print_manifest(report: &IntakeReport) {
    if !report.manifest.is_empty() {
        print!("{}", report.manifest);
    }
}

fn finish(outcome: SessionOutcome) -> Result<(), ClientError> {
    match outcome {
        SessionOutcome::Redirected { .. } | SessionOutcome::Terminated { .. } => Ok(()),
        SessionOutcome::Stalled { finished, expected } => {
            Err(ClientError::Stalled { finished, expected })
        }
    }
}

async fn interrupt_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
