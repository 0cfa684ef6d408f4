//! Logging setup and client-side counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout only carries the manifest and redirect target.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Counters for one client run
#[derive(Debug, Default)]
pub struct Metrics {
    files_accepted: AtomicU64,
    files_rejected: AtomicU64,
    submissions: AtomicU64,
    polls: AtomicU64,
    transport_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_accepted(&self) {
        self.files_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn file_rejected(&self) {
        self.files_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "files_rejected", "Metric incremented");
    }

    pub fn submission_sent(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_sent(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transport_failed(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "transport_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_accepted: self.files_accepted.load(Ordering::Relaxed),
            files_rejected: self.files_rejected.load(Ordering::Relaxed),
            submissions: self.submissions.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub files_accepted: u64,
    pub files_rejected: u64,
    pub submissions: u64,
    pub polls: u64,
    pub transport_failures: u64,
}
