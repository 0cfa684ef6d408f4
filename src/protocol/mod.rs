//! Wire format shared by every request the client sends to the page endpoint.
//!
//! All traffic goes to a single page-relative path and is distinguished by
//! the payload shape, not the route. Requests are form-encoded with exactly
//! one key:
//!
//! ```text
//! navigation=<action-name>     trigger a named server action (or "cancel")
//! result=<file text>           submit one file's contents
//! task_id=<handle>             poll the status of an issued task
//! ```
//!
//! Every response is JSON wrapped in a `data` envelope:
//!
//! ```json
//! { "data": { "task_id": "42", "task_status": "queued", "redirect": null } }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Navigation name that asks the server to cancel the current batch.
pub const CANCEL_ACTION: &str = "cancel";

/// Opaque identifier of a server-side task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One request to the page endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    Navigation(String),
    Result(String),
    Poll(TaskHandle),
}

impl TaskRequest {
    pub fn cancel() -> Self {
        TaskRequest::Navigation(CANCEL_ACTION.to_string())
    }

    /// Form fields for this request; always a single pair.
    pub fn form_fields(&self) -> [(&'static str, &str); 1] {
        match self {
            TaskRequest::Navigation(name) => [("navigation", name.as_str())],
            TaskRequest::Result(content) => [("result", content.as_str())],
            TaskRequest::Poll(handle) => [("task_id", handle.as_str())],
        }
    }

    /// Short label for logs; never includes file contents.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskRequest::Navigation(_) => "navigation",
            TaskRequest::Result(_) => "result",
            TaskRequest::Poll(_) => "poll",
        }
    }
}

/// Status string reported by the server for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Finished,
    Failed,
    /// Any other string: queued, started, deferred, ...
    Pending(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Finished => "finished",
            TaskStatus::Failed => "failed",
            TaskStatus::Pending(other) => other,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "finished" => TaskStatus::Finished,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Pending(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(value: TaskStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a response, as found under the `data` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    #[serde(default)]
    pub task_id: Option<TaskHandle>,
    #[serde(default)]
    pub task_status: Option<TaskStatus>,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub data: TaskReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(TaskStatus::from("finished".to_string()), TaskStatus::Finished);
        assert_eq!(TaskStatus::from("failed".to_string()), TaskStatus::Failed);
        assert_eq!(
            TaskStatus::from("queued".to_string()),
            TaskStatus::Pending("queued".to_string())
        );
        // Terminal names are case sensitive on the server side too.
        assert!(!TaskStatus::from("FINISHED".to_string()).is_terminal());
    }

    #[test]
    fn test_envelope_decodes_server_response() {
        let body = r#"{"data": {"task_id": "7f3a", "task_status": "started"}}"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data.task_id, Some(TaskHandle::new("7f3a")));
        assert_eq!(
            envelope.data.task_status,
            Some(TaskStatus::Pending("started".to_string()))
        );
        assert!(envelope.data.redirect.is_none());
    }

    #[test]
    fn test_envelope_with_redirect() {
        let body = r#"{"data": {"task_id": "1", "task_status": "failed", "redirect": "/oops"}}"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.data.task_status, Some(TaskStatus::Failed));
        assert_eq!(envelope.data.redirect.as_deref(), Some("/oops"));
    }

    #[test]
    fn test_form_fields() {
        assert_eq!(
            TaskRequest::cancel().form_fields(),
            [("navigation", "cancel")]
        );
        assert_eq!(
            TaskRequest::Result("a,b\n1,2\n".into()).form_fields(),
            [("result", "a,b\n1,2\n")]
        );
        assert_eq!(
            TaskRequest::Poll(TaskHandle::new("9")).form_fields(),
            [("task_id", "9")]
        );
    }
}
