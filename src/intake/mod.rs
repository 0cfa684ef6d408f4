//! File intake: filter, stage and list user-selected files
//!
//! Files arrive either from the picker (paths named on the command line) or
//! from a drop (paths pasted into the terminal). Only plain text and CSV
//! files are staged; everything else is left out of both the accepted list
//! and the manifest without any error.

mod candidate;
mod manifest;

pub use candidate::{FileEntry, parse_dropped_paths};
pub use manifest::Manifest;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

use crate::observability::Metrics;

/// MIME types accepted for upload.
pub const ALLOWED_TYPES: [&str; 2] = ["text/plain", "text/csv"];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),
}

pub fn is_allowed(mime: Option<&mime::Mime>) -> bool {
    mime.is_some_and(|m| ALLOWED_TYPES.contains(&m.essence_str()))
}

/// Enabled state of the interactive controls (picker, drop zone, buttons).
#[derive(Debug)]
pub struct Controls {
    enabled: AtomicBool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }
}

impl Controls {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Disable the controls until the returned guard is dropped.
    pub fn disable(&self) -> ControlsGuard<'_> {
        self.enabled.store(false, Ordering::Release);
        ControlsGuard { controls: self }
    }
}

pub struct ControlsGuard<'a> {
    controls: &'a Controls,
}

impl Drop for ControlsGuard<'_> {
    fn drop(&mut self) {
        self.controls.enabled.store(true, Ordering::Release);
    }
}

/// Result of one picker or drop event.
#[derive(Debug, Clone, Default)]
pub struct IntakeReport {
    /// Accepted entries of this event only.
    pub manifest: Manifest,
    /// Names left out because of their type. Never shown in the manifest.
    pub rejected: Vec<String>,
    /// The drop arrived while controls were disabled and was not looked at.
    pub ignored: bool,
}

impl IntakeReport {
    pub fn accepted_count(&self) -> usize {
        self.manifest.len()
    }
}

/// Staged files of one session.
#[derive(Debug)]
pub struct FileIntake {
    accepted: Vec<FileEntry>,
    controls: Arc<Controls>,
    metrics: Arc<Metrics>,
}

impl FileIntake {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            accepted: Vec::new(),
            controls: Arc::new(Controls::default()),
            metrics,
        }
    }

    /// Files chosen with the picker.
    pub fn select(&mut self, candidates: impl IntoIterator<Item = FileEntry>) -> IntakeReport {
        self.stage(candidates)
    }

    /// Files dropped onto the page. Ignored while the controls are disabled,
    /// either by an intake in progress or by a holder of [`FileIntake::controls`].
    pub fn drop_files(&mut self, candidates: impl IntoIterator<Item = FileEntry>) -> IntakeReport {
        if !self.controls.is_enabled() {
            debug!("Drop ignored while controls are disabled");
            return IntakeReport {
                ignored: true,
                ..IntakeReport::default()
            };
        }
        self.stage(candidates)
    }

    fn stage(&mut self, candidates: impl IntoIterator<Item = FileEntry>) -> IntakeReport {
        let _guard = self.controls.disable();
        let first_new = self.accepted.len();
        let mut rejected = Vec::new();

        for candidate in candidates {
            if is_allowed(candidate.mime.as_ref()) {
                self.metrics.file_accepted();
                self.accepted.push(candidate);
            } else {
                debug!(
                    file = %candidate.name,
                    mime = candidate.mime.as_ref().map(|m| m.essence_str()).unwrap_or("n/a"),
                    "File type not accepted"
                );
                self.metrics.file_rejected();
                rejected.push(candidate.name);
            }
        }

        let manifest = Manifest::render(&self.accepted[first_new..]);
        info!(
            accepted = manifest.len(),
            rejected = rejected.len(),
            total = self.accepted.len(),
            "Files staged"
        );

        IntakeReport {
            manifest,
            rejected,
            ignored: false,
        }
    }

    /// Controls shared with whoever else gates user input.
    pub fn controls(&self) -> &Arc<Controls> {
        &self.controls
    }

    pub fn accepted(&self) -> &[FileEntry] {
        &self.accepted
    }

    /// Hand the staged files over for submission, leaving the list empty.
    pub fn take_accepted(&mut self) -> Vec<FileEntry> {
        std::mem::take(&mut self.accepted)
    }
}
