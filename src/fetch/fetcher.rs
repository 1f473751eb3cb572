//! Retrying fetcher.
//!
//! [`RetryingFetcher::fetch`] runs the attempts of one task in a bounded
//! loop. The whole task is retried on any failure, whether the network or
//! the filesystem failed. The backoff delay only suspends the task's own
//! future; other tasks keep running.

use super::retry::RetryPolicy;
use super::transfer::Transfer;
use crate::task::{DownloadTask, ErrorRecord, TaskOutcome};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Performs a [`DownloadTask`] with bounded retries and exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<T> {
    transfer: T,
    policy: RetryPolicy,
}

impl<T: Transfer> RetryingFetcher<T> {
    /// Create a fetcher over the given transfer implementation.
    pub fn new(transfer: T, policy: RetryPolicy) -> Self {
        Self { transfer, policy }
    }

    /// The retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The underlying transfer.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Run the task until one attempt succeeds or the retries are exhausted.
    ///
    /// Returns `None` if `cancel` fires first. An aborted attempt produces no
    /// outcome.
    pub async fn fetch(&self, task: DownloadTask, cancel: &CancellationToken) -> Option<TaskOutcome> {
        let mut history: Vec<ErrorRecord> = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Aborting {} during attempt {}", task.name, attempt);
                    return None;
                }
                result = self.transfer.transfer(&task) => result,
            };

            let error = match result {
                Ok(()) => {
                    if attempt > 1 {
                        info!("{} succeeded on attempt {}", task.name, attempt);
                    }
                    return Some(TaskOutcome::success(task, attempt, history));
                }
                Err(e) => e,
            };

            history.push(ErrorRecord::from_error(&task, &error, attempt));

            let Some(delay) = self.policy.backoff(attempt - 1) else {
                warn!(
                    task = %task.name,
                    attempts = attempt,
                    error = %error,
                    "Giving up"
                );
                return Some(TaskOutcome::failure(task, attempt, history));
            };

            warn!(
                task = %task.name,
                attempt,
                ?delay,
                error = %error,
                "Attempt failed, retrying"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Aborting {} during backoff", task.name);
                    return None;
                }
                _ = sleep(delay) => {}
            }
        }
    }
}
