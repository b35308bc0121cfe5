// Task endpoints and the poller
//
// Server-side operations that outlive a request (pairing, health
// diagnostics) hand back a task id. Transition detection is pull-based:
// the poller re-fetches the task on a fixed cadence until it reaches a
// terminal state or the caller's ceiling elapses. FAILED is terminal
// and fatal; QUEUED and RUNNING are retryable; anything else ends the
// wait successfully.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::client::{ApplianceClient, decode};
use crate::error::Error;
use crate::models::{Task, TaskRef, TaskState};

/// Default cadence between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default ceiling for health and pairing flows.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

impl ApplianceClient {
    /// Fetch a task by id.
    ///
    /// `GET /tasks/{id}`
    pub async fn get_task(&self, service_cert: &str, task_id: &str) -> Result<Task, Error> {
        let path = format!("/tasks/{task_id}");
        let body = self.get(&path, service_cert).await?;
        decode(&body, "task")
    }

    /// Trigger a health diagnostics run.
    ///
    /// `POST diagnostics/health` -- returns the task reference to poll.
    /// A 2xx response without a task id is a schema mismatch and fails
    /// decoding.
    pub async fn start_health_check(&self, service_cert: &str) -> Result<TaskRef, Error> {
        let body = self
            .post::<()>("/diagnostics/health", None, false, service_cert)
            .await?;
        decode(&body, "health task")
    }
}

/// Polls a task to a terminal state on a fixed cadence.
///
/// There is deliberately no backoff: the cadence is constant and the
/// only bounds are the ceiling and the caller's cancellation token.
/// Operations other than polling are never retried here -- they are not
/// idempotent-safe, and retry policy belongs to the reconciling caller.
#[derive(Debug, Clone, Copy)]
pub struct TaskPoller {
    interval: Duration,
    timeout: Duration,
}

impl Default for TaskPoller {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl TaskPoller {
    /// Poller with an explicit cadence and ceiling.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Poller with the default cadence and a caller-supplied ceiling.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout,
        }
    }

    /// Wait for `task_id` to reach a terminal state.
    ///
    /// Returns the final task on success (SUCCEEDED or any unrecognized
    /// terminal state). FAILED maps to [`Error::TaskFailed`] with the
    /// server-reported code and message. The ceiling maps to
    /// [`Error::Timeout`]; once it fires no further polls are issued.
    /// Cancelling `cancel` ends the wait with [`Error::Cancelled`].
    pub async fn wait(
        &self,
        client: &ApplianceClient,
        service_cert: &str,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Task, Error> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            let task = client.get_task(service_cert, task_id).await?;

            match task.state {
                TaskState::Failed => {
                    let err = task.error.unwrap_or_default();
                    return Err(Error::TaskFailed {
                        code: err.code,
                        message: err.msg,
                    });
                }
                TaskState::Queued | TaskState::Running => {
                    trace!(task_id, state = ?task.state, progress = task.progress, "task still in flight");
                }
                _ => {
                    debug!(task_id, state = ?task.state, "task reached terminal state");
                    return Ok(task);
                }
            }

            self.pause(deadline, &format!("task {task_id}"), cancel).await?;
        }
    }

    /// Wait without external cancellation (the ceiling still applies).
    pub async fn wait_default(
        &self,
        client: &ApplianceClient,
        service_cert: &str,
        task_id: &str,
    ) -> Result<Task, Error> {
        self.wait(client, service_cert, task_id, &CancellationToken::new())
            .await
    }

    /// Wait until the appliance reports itself configured.
    ///
    /// `GET /config/is-configured` classified exactly like a task poll:
    /// "not configured yet" is retryable, request failures are not.
    pub async fn wait_configured(
        &self,
        client: &ApplianceClient,
        service_cert: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let deadline = tokio::time::Instant::now() + self.timeout;

        loop {
            let state = client.is_configured(service_cert).await?;
            if state.is_configured {
                debug!("appliance reports configured");
                return Ok(());
            }
            trace!("appliance not configured yet");

            self.pause(deadline, "initial configuration", cancel).await?;
        }
    }

    /// Sleep one interval, bounded by the deadline and the token.
    async fn pause(
        &self,
        deadline: tokio::time::Instant,
        operation: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(self.timeout_error(operation));
        }

        let step = self.interval.min(deadline - now);
        tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep(step) => {}
        }

        if tokio::time::Instant::now() >= deadline {
            return Err(self.timeout_error(operation));
        }
        Ok(())
    }

    fn timeout_error(&self, operation: &str) -> Error {
        Error::Timeout {
            timeout_secs: self.timeout.as_secs(),
            operation: operation.to_owned(),
        }
    }
}
