//! Task polling
//!
//! [`Poller::await_task`] turns a [`TaskRef`] into one outcome: the succeeded
//! task, [`AxonError::TaskFailed`], [`AxonError::TaskTimeout`], or a transport
//! error that persisted across two consecutive checks.
//!
//! The first status check runs immediately; later checks are spaced by the
//! poll interval. Dropping the returned future abandons the loop and stops
//! further requests. The backend job is never cancelled.

use async_trait::async_trait;
use paperaxon_core::{AxonError, Config, Result, Task, TaskOutcome, TaskRef, TaskStatus};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Anything that can report the current snapshot of a task.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_task(&self, task_id: &str) -> Result<Task>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_TASK_TIMEOUT),
        }
    }
}

impl Poller {
    /// Poller without a deadline.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval()).with_timeout(config.task_timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Wait until `task` reaches a terminal status.
    ///
    /// A handle that is already terminal resolves without any request.
    pub async fn await_task<S>(&self, source: &S, task: &TaskRef) -> Result<TaskOutcome>
    where
        S: TaskSource + ?Sized,
    {
        if task.status.is_terminal() {
            return resolve(task, task.status.clone(), None, None);
        }

        match self.timeout {
            None => self.poll_until_terminal(source, task).await,
            Some(limit) => match tokio::time::timeout(limit, self.poll_until_terminal(source, task))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    debug!(task_id = %task.id, kind = %task.kind, "task wait timed out");
                    Err(AxonError::TaskTimeout {
                        task_id: task.id.clone(),
                        kind: task.kind,
                        waited: limit,
                    })
                }
            },
        }
    }

    async fn poll_until_terminal<S>(&self, source: &S, task: &TaskRef) -> Result<TaskOutcome>
    where
        S: TaskSource + ?Sized,
    {
        let mut last_status = task.status.clone();
        let mut previous_failed = false;

        loop {
            match source.fetch_task(&task.id).await {
                Ok(snapshot) => {
                    previous_failed = false;
                    if snapshot.status != last_status {
                        debug!(
                            task_id = %task.id,
                            kind = %task.kind,
                            status = %snapshot.status,
                            "task status changed"
                        );
                        last_status = snapshot.status.clone();
                    }
                    if snapshot.status.is_terminal() {
                        return resolve(task, snapshot.status, snapshot.result, snapshot.error);
                    }
                }
                // One failed check is tolerated; two in a row end the wait.
                Err(err) if err.is_transport() && !previous_failed => {
                    warn!(task_id = %task.id, error = %err, "task status check failed, retrying");
                    previous_failed = true;
                }
                Err(err) => return Err(err),
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

fn resolve(
    task: &TaskRef,
    status: TaskStatus,
    result: Option<serde_json::Value>,
    error: Option<String>,
) -> Result<TaskOutcome> {
    match status {
        TaskStatus::Failed => Err(AxonError::TaskFailed {
            task_id: task.id.clone(),
            kind: task.kind,
            message: error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "task failed".to_string()),
        }),
        _ => Ok(TaskOutcome {
            task_id: task.id.clone(),
            kind: task.kind,
            result,
        }),
    }
}
