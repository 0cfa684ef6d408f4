//! Client session: owns the staged files, the batch counter and every task
//! started against the page endpoint.
//!
//! Flow of an upload:
//! 1. Staged files are read one after the other; the next read starts as soon
//!    as the previous one completes
//! 2. Each file's text is submitted in its own task, so submissions overlap
//! 3. Every returned task handle is polled independently
//! 4. Terminal statuses go through [`BatchState`]; the first redirect decision
//!    hands the URL to the [`Navigator`] and tears the session down
//!
//! A cancellation requested through [`SessionHandle::cancel`] runs as one more
//! task alongside the uploads and redirects on its own terminal status.

mod batch;
mod navigator;

pub use batch::{BatchState, Decision, TaskKind};
pub use navigator::{BrowserNavigator, ConsoleNavigator, NavigationError, Navigator};

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::intake::{FileEntry, FileIntake};
use crate::observability::Metrics;
use crate::poller::{PollOutcome, PollPolicy, poll_task};
use crate::protocol::{TaskHandle, TaskRequest, TaskStatus};
use crate::transport::Endpoint;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no accepted files to upload")]
    NothingToUpload,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A terminal status produced a redirect.
    Redirected {
        url: String,
        status: TaskStatus,
        kind: TaskKind,
    },
    /// A terminal status called for a redirect but the server sent no URL.
    Terminated { status: TaskStatus, kind: TaskKind },
    /// Every task ended without producing a redirect.
    Stalled { finished: usize, expected: usize },
}

#[derive(Debug)]
enum SessionCommand {
    Cancel,
}

/// Cloneable handle used to request cancellation of a running batch.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Ask the server to cancel the batch. No effect once the session is gone.
    pub fn cancel(&self) {
        if self.commands.send(SessionCommand::Cancel).is_err() {
            debug!("Cancel requested after the session ended");
        }
    }
}

/// One file's contents, read and ready for submission.
struct ReadFile {
    name: String,
    content: String,
}

/// What a spawned task reports back.
struct TaskEnd {
    kind: TaskKind,
    handle: Option<TaskHandle>,
    outcome: PollOutcome,
}

pub struct Session {
    id: Uuid,
    endpoint: Arc<dyn Endpoint>,
    navigator: Arc<dyn Navigator>,
    policy: PollPolicy,
    intake: FileIntake,
    metrics: Arc<Metrics>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    command_rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl Session {
    pub fn new(
        endpoint: Arc<dyn Endpoint>,
        navigator: Arc<dyn Navigator>,
        policy: PollPolicy,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            id: Uuid::now_v7(),
            endpoint,
            navigator,
            policy,
            intake: FileIntake::new(metrics.clone()),
            metrics,
            command_tx,
            command_rx,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            commands: self.command_tx.clone(),
        }
    }

    pub fn intake(&self) -> &FileIntake {
        &self.intake
    }

    pub fn intake_mut(&mut self) -> &mut FileIntake {
        &mut self.intake
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Submit every staged file and wait for the batch to end.
    pub async fn upload(&mut self) -> Result<SessionOutcome, SessionError> {
        let files = self.intake.take_accepted();
        if files.is_empty() {
            return Err(SessionError::NothingToUpload);
        }

        let span = info_span!("session", id = %self.id, files = files.len());
        Ok(self.drive(files, Vec::new()).instrument(span).await)
    }

    /// Trigger a named page action and wait for its task to end.
    pub async fn navigate(&mut self, action: &str) -> SessionOutcome {
        let span = info_span!("session", id = %self.id, action);
        let request = (TaskKind::Action, TaskRequest::Navigation(action.to_string()));
        self.drive(Vec::new(), vec![request]).instrument(span).await
    }

    /// Send a standalone cancellation and wait for its task to end.
    pub async fn cancel(&mut self) -> SessionOutcome {
        let span = info_span!("session", id = %self.id, action = "cancel");
        self.drive(Vec::new(), vec![(TaskKind::Cancel, TaskRequest::cancel())])
            .instrument(span)
            .await
    }

    async fn drive(
        &mut self,
        files: Vec<FileEntry>,
        requests: Vec<(TaskKind, TaskRequest)>,
    ) -> SessionOutcome {
        let mut batch = BatchState::new(files.len());
        let mut tasks: JoinSet<TaskEnd> = JoinSet::new();

        let (read_tx, mut read_rx) = mpsc::unbounded_channel();
        let mut reading = !files.is_empty();
        let reader = tokio::spawn(read_sequentially(files, read_tx).in_current_span());

        for (kind, request) in requests {
            self.spawn_task(&mut tasks, kind, request);
        }

        let outcome = loop {
            if !reading && tasks.is_empty() {
                info!(
                    finished = batch.finished(),
                    expected = batch.expected(),
                    "All tasks ended without a redirect"
                );
                break SessionOutcome::Stalled {
                    finished: batch.finished(),
                    expected: batch.expected(),
                };
            }

            tokio::select! {
                read = read_rx.recv(), if reading => match read {
                    Some(file) => {
                        debug!(file = %file.name, bytes = file.content.len(), "Submitting file");
                        self.spawn_task(&mut tasks, TaskKind::Upload, TaskRequest::Result(file.content));
                    }
                    None => reading = false,
                },
                Some(command) = self.command_rx.recv() => match command {
                    SessionCommand::Cancel => {
                        info!("Cancellation requested");
                        self.spawn_task(&mut tasks, TaskKind::Cancel, TaskRequest::cancel());
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    let end = match joined {
                        Ok(end) => end,
                        Err(e) => {
                            warn!(error = %e, "Task ended abnormally");
                            continue;
                        }
                    };
                    if let Some(outcome) = self.settle(&mut batch, end) {
                        break outcome;
                    }
                }
            }
        };

        // Navigation away from the page: nothing started here may outlive it.
        reader.abort();
        tasks.abort_all();

        let snapshot = self.metrics.snapshot();
        info!(
            accepted = snapshot.files_accepted,
            rejected = snapshot.files_rejected,
            submissions = snapshot.submissions,
            polls = snapshot.polls,
            transport_failures = snapshot.transport_failures,
            "Session ended"
        );

        outcome
    }

    fn spawn_task(&self, tasks: &mut JoinSet<TaskEnd>, kind: TaskKind, request: TaskRequest) {
        let endpoint = self.endpoint.clone();
        let metrics = self.metrics.clone();
        let policy = self.policy.clone();

        tasks.spawn(
            async move { run_task(endpoint.as_ref(), kind, request, &policy, &metrics).await }
                .in_current_span(),
        );
    }

    /// Apply a finished task to the batch; `Some` ends the session.
    fn settle(&self, batch: &mut BatchState, end: TaskEnd) -> Option<SessionOutcome> {
        let (status, redirect) = match end.outcome {
            PollOutcome::Terminal { status, redirect } => (status, redirect),
            PollOutcome::Abandoned { reason } => {
                debug!(kind = ?end.kind, task_id = ?end.handle, reason = %reason, "Task abandoned");
                return None;
            }
        };

        match batch.observe(end.kind, &status) {
            Decision::Wait => {
                info!(
                    finished = batch.finished(),
                    expected = batch.expected(),
                    "Upload finished, waiting for the rest of the batch"
                );
                None
            }
            Decision::Redirect => match redirect {
                Some(target) => {
                    let url = self.endpoint.resolve_redirect(&target);
                    info!(url = %url, status = %status, kind = ?end.kind, "Redirecting");
                    if let Err(e) = self.navigator.navigate(&url) {
                        warn!(error = %e, "Navigation failed");
                    }
                    Some(SessionOutcome::Redirected {
                        url,
                        status,
                        kind: end.kind,
                    })
                }
                None => {
                    warn!(status = %status, kind = ?end.kind, "Terminal status without redirect");
                    Some(SessionOutcome::Terminated {
                        status,
                        kind: end.kind,
                    })
                }
            },
        }
    }
}

/// Read files in order, the next one only after the previous read completed.
async fn read_sequentially(files: Vec<FileEntry>, out: mpsc::UnboundedSender<ReadFile>) {
    for file in files {
        let content = match read_text(&file.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %file.name, error = %e, "Failed to read file, skipping");
                continue;
            }
        };

        if out
            .send(ReadFile {
                name: file.name,
                content,
            })
            .is_err()
        {
            // Session is gone.
            return;
        }
    }
}

async fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Issue the request that creates a task, then poll the returned handle.
async fn run_task(
    endpoint: &dyn Endpoint,
    kind: TaskKind,
    request: TaskRequest,
    policy: &PollPolicy,
    metrics: &Metrics,
) -> TaskEnd {
    if kind == TaskKind::Upload {
        metrics.submission_sent();
    }

    let report = match endpoint.send(request).await {
        Ok(report) => report,
        Err(e) => {
            metrics.transport_failed();
            warn!(kind = ?kind, error = %e, "Request failed");
            return TaskEnd {
                kind,
                handle: None,
                outcome: PollOutcome::Abandoned {
                    reason: e.to_string(),
                },
            };
        }
    };

    let Some(handle) = report.task_id else {
        warn!(kind = ?kind, "Response carried no task_id");
        return TaskEnd {
            kind,
            handle: None,
            outcome: PollOutcome::Abandoned {
                reason: "missing task_id".to_string(),
            },
        };
    };

    info!(task_id = %handle, kind = ?kind, "Task created");
    let outcome = poll_task(endpoint, &handle, policy, metrics).await;

    TaskEnd {
        kind,
        handle: Some(handle),
        outcome,
    }
}
