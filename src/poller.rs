//! Status polling for a single task handle

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::observability::Metrics;
use crate::protocol::{TaskHandle, TaskRequest, TaskStatus};
use crate::transport::Endpoint;

/// Delay schedule between non-terminal status checks.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// 1.0 keeps the interval fixed.
    pub backoff_multiplier: f64,
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            backoff_multiplier: 1.0,
            max_interval: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    /// Delay before the status check following the `attempt`-th non-terminal answer
    /// (`attempt` starts at 0).
    pub fn delay(&self, attempt: u32) -> Duration {
        if self.backoff_multiplier <= 1.0 {
            return self.interval;
        }
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let millis = self.interval.as_millis() as f64 * factor;
        let capped = millis.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64).max(self.interval)
    }
}

/// How polling of one handle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// `finished` or `failed` was observed.
    Terminal {
        status: TaskStatus,
        redirect: Option<String>,
    },
    /// A request failed; polling stopped without a terminal status.
    Abandoned { reason: String },
}

/// Poll `handle` until the server reports a terminal status.
///
/// Transport failures end the loop immediately, there is no retry.
pub async fn poll_task(
    endpoint: &dyn Endpoint,
    handle: &TaskHandle,
    policy: &PollPolicy,
    metrics: &Metrics,
) -> PollOutcome {
    let mut attempt = 0u32;

    loop {
        metrics.poll_sent();
        let report = match endpoint.send(TaskRequest::Poll(handle.clone())).await {
            Ok(report) => report,
            Err(e) => {
                metrics.transport_failed();
                warn!(task_id = %handle, error = %e, "Status query failed, giving up on task");
                return PollOutcome::Abandoned {
                    reason: e.to_string(),
                };
            }
        };

        let status = report
            .task_status
            .unwrap_or_else(|| TaskStatus::Pending(String::new()));
        info!(task_id = %handle, status = %status, "Task status");

        if status.is_terminal() {
            return PollOutcome::Terminal {
                status,
                redirect: report.redirect,
            };
        }

        let delay = policy.delay(attempt);
        debug!(task_id = %handle, delay_ms = delay.as_millis() as u64, "Rescheduling status query");
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TaskReport;
    use crate::transport::{Result, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of answers and records every request.
    struct Scripted {
        answers: Mutex<VecDeque<Result<TaskReport>>>,
        seen: Mutex<Vec<TaskRequest>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<TaskReport>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Endpoint for Scripted {
        async fn send(&self, request: TaskRequest) -> Result<TaskReport> {
            self.seen.lock().unwrap().push(request);
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::RequestFailed("script exhausted".into())))
        }
    }

    fn status(s: &str, redirect: Option<&str>) -> Result<TaskReport> {
        Ok(TaskReport {
            task_id: None,
            task_status: Some(TaskStatus::from(s.to_string())),
            redirect: redirect.map(str::to_string),
        })
    }

    #[test]
    fn test_default_policy_is_fixed_500ms() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(10), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollPolicy {
            interval: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_interval: Duration::from_secs(3),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
        assert_eq!(policy.delay(3), Duration::from_secs(3));
        assert_eq!(policy.delay(40), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_finished() {
        let endpoint = Scripted::new(vec![
            status("queued", None),
            status("started", None),
            status("finished", Some("/done")),
        ]);
        let metrics = Metrics::new();
        let handle = TaskHandle::new("t1");

        let started = tokio::time::Instant::now();
        let outcome = poll_task(&endpoint, &handle, &PollPolicy::default(), &metrics).await;

        assert_eq!(
            outcome,
            PollOutcome::Terminal {
                status: TaskStatus::Finished,
                redirect: Some("/done".into())
            }
        );
        // Two non-terminal answers, two 500ms waits.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1500));
        assert_eq!(metrics.snapshot().polls, 3);

        let seen = endpoint.seen.lock().unwrap();
        assert!(seen.iter().all(|r| *r == TaskRequest::Poll(handle.clone())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_is_terminal() {
        let endpoint = Scripted::new(vec![status("failed", Some("/error"))]);
        let metrics = Metrics::new();

        let outcome =
            poll_task(&endpoint, &TaskHandle::new("t2"), &PollPolicy::default(), &metrics).await;

        assert_eq!(
            outcome,
            PollOutcome::Terminal {
                status: TaskStatus::Failed,
                redirect: Some("/error".into())
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_stops_without_retry() {
        let endpoint = Scripted::new(vec![
            status("queued", None),
            Err(TransportError::Status { status: 502 }),
            status("finished", Some("/never")),
        ]);
        let metrics = Metrics::new();

        let outcome =
            poll_task(&endpoint, &TaskHandle::new("t3"), &PollPolicy::default(), &metrics).await;

        assert!(matches!(outcome, PollOutcome::Abandoned { .. }));
        assert_eq!(endpoint.seen.lock().unwrap().len(), 2);
        assert_eq!(metrics.snapshot().transport_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_status_counts_as_pending() {
        let endpoint = Scripted::new(vec![
            Ok(TaskReport::default()),
            status("finished", Some("/ok")),
        ]);
        let metrics = Metrics::new();

        let outcome =
            poll_task(&endpoint, &TaskHandle::new("t4"), &PollPolicy::default(), &metrics).await;

        assert!(matches!(outcome, PollOutcome::Terminal { status: TaskStatus::Finished, .. }));
    }
}
