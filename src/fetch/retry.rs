//! Backoff schedule for retried tasks.
//!
//! The schedule is an exponential backoff with base 2 and no jitter: with the
//! defaults the delays between attempts are 1s, 2s and 4s, for at most four
//! attempts in total.

use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryDecision, RetryPolicy as _};
use std::time::{Duration, SystemTime};

const MAX_EXPONENT: u32 = 16;

/// Retry configuration for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_backoff: Self::DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Additional attempts after the first failure.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Delay before the first retry.
    pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
    const MIN_BACKOFF: Duration = Duration::from_millis(1);

    /// Create a policy. The initial backoff is raised to at least one millisecond.
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: initial_backoff.max(Self::MIN_BACKOFF),
        }
    }

    /// Number of retries after the first failed attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts a task may get.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    fn max_backoff(&self) -> Duration {
        self.delay(self.max_retries.saturating_sub(1))
    }

    fn delay(&self, n_past_retries: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1 << n_past_retries.min(MAX_EXPONENT))
    }

    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.initial_backoff, self.max_backoff())
            .jitter(Jitter::None)
            .base(2)
            .build_with_max_retries(self.max_retries)
    }

    /// Delay to wait after `n_past_retries` retries have already failed:
    /// `initial_backoff * 2^n_past_retries`.
    ///
    /// Returns `None` once the retries are exhausted.
    pub fn backoff(&self, n_past_retries: u32) -> Option<Duration> {
        match self.schedule().should_retry(SystemTime::now(), n_past_retries) {
            RetryDecision::Retry { .. } => Some(self.delay(n_past_retries).min(self.max_backoff())),
            RetryDecision::DoNotRetry => None,
        }
    }
}
