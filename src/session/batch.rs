use crate::protocol::TaskStatus;

/// What started a task on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// One file's contents.
    Upload,
    /// A named page action (a button).
    Action,
    /// The batch cancellation signal.
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Redirect,
    Wait,
}

/// Completion counter of one batch.
///
/// Upload tasks only produce a redirect once `finished` reaches `expected`.
/// A failure, or the end of an action or cancellation task, redirects at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchState {
    expected: usize,
    finished: usize,
}

impl BatchState {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            finished: 0,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn finished(&self) -> usize {
        self.finished
    }

    pub fn observe(&mut self, kind: TaskKind, status: &TaskStatus) -> Decision {
        match (kind, status) {
            (_, TaskStatus::Pending(_)) => Decision::Wait,
            (_, TaskStatus::Failed) => Decision::Redirect,
            (TaskKind::Action | TaskKind::Cancel, TaskStatus::Finished) => Decision::Redirect,
            (TaskKind::Upload, TaskStatus::Finished) => {
                self.finished += 1;
                if self.finished >= self.expected {
                    Decision::Redirect
                } else {
                    Decision::Wait
                }
            }
        }
    }
}
