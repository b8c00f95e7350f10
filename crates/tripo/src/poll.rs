//! Bounded, cancellable polling of a remote task.
//!
//! [`poll_until_done`] turns a one-shot status query into a wait for a
//! terminal state. It is always bounded by an attempt budget (and
//! optionally a wall-clock deadline) and returns promptly once the
//! [`CancellationToken`] fires.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::StatusError;
use crate::status::TaskStatus;

/// Tunable parameters for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between consecutive status queries.
    pub interval: Duration,
    /// Hard cap on status queries. Must be at least 1.
    pub max_attempts: u32,
    /// Consecutive failed status queries tolerated before giving up.
    pub max_status_retries: u32,
    /// Optional wall-clock budget for the whole loop.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
            max_status_retries: 3,
            deadline: None,
        }
    }
}

/// Why polling ended without an artifact URL.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The remote task reached a failed terminal state.
    #[error("remote task failed: {0}")]
    RemoteFailed(String),

    /// The attempt budget or the status-error retry budget ran out.
    #[error("task not finished after {attempts} status queries{}", last_error_suffix(.last_error))]
    Exhausted {
        attempts: u32,
        /// Most recent status-query error, when that is what ended the loop.
        last_error: Option<String>,
    },

    /// The wall-clock deadline passed before the task finished.
    #[error("task not finished within {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller cancelled while waiting.
    #[error("polling cancelled")]
    Cancelled,
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

/// Query `status_fn` until the task reaches a terminal state.
///
/// * `Queued` / `Running` - sleep `policy.interval`, then query again.
/// * `Succeeded` - return the artifact URL unmodified.
/// * `Failed` - return [`PollError::RemoteFailed`] at once, without sleeping.
/// * `Err(StatusError)` - retried up to `policy.max_status_retries`
///   consecutive times, then [`PollError::Exhausted`].
///
/// After `policy.max_attempts` queries without a terminal state the loop
/// returns [`PollError::Exhausted`] without a final sleep.
pub async fn poll_until_done<F, Fut>(
    task_id: &str,
    mut status_fn: F,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<String, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TaskStatus, StatusError>>,
{
    let started = Instant::now();
    let mut attempt = 0u32;
    let mut consecutive_errors = 0u32;
    let mut last_error: Option<String> = None;

    loop {
        if let Some(deadline) = policy.deadline {
            if started.elapsed() >= deadline {
                tracing::warn!(task_id, attempt, "Poll deadline exceeded");
                return Err(PollError::DeadlineExceeded(deadline));
            }
        }

        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(task_id, attempt, "Polling cancelled");
                return Err(PollError::Cancelled);
            }
            result = status_fn() => result,
        };

        match result {
            Ok(TaskStatus::Succeeded { artifact_url }) => {
                tracing::info!(task_id, attempt, "Task succeeded");
                return Ok(artifact_url);
            }
            Ok(TaskStatus::Failed { reason }) => {
                tracing::warn!(task_id, attempt, %reason, "Task failed");
                return Err(PollError::RemoteFailed(reason));
            }
            Ok(status) => {
                consecutive_errors = 0;
                last_error = None;
                tracing::debug!(task_id, attempt, ?status, "Task not finished yet");
            }
            Err(e) => {
                consecutive_errors += 1;
                tracing::warn!(
                    task_id,
                    attempt,
                    consecutive_errors,
                    error = %e,
                    "Status query failed",
                );
                last_error = Some(e.to_string());
                if consecutive_errors > policy.max_status_retries {
                    return Err(PollError::Exhausted {
                        attempts: attempt,
                        last_error,
                    });
                }
            }
        }

        if attempt >= policy.max_attempts {
            tracing::warn!(task_id, attempt, "Poll attempts exhausted");
            return Err(PollError::Exhausted {
                attempts: attempt,
                last_error,
            });
        }

        let wait = match policy.deadline {
            Some(deadline) => policy
                .interval
                .min(deadline.saturating_sub(started.elapsed())),
            None => policy.interval,
        };

        // Wait before the next query, respecting cancellation.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(task_id, attempt, "Polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
