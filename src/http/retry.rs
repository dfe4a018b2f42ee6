//! Retry decisions for classified transport failures.

use std::time::Duration;

use super::error::ApiError;
use super::outcome::Failure;

/// Retries allowed after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Backoff seed for failures that carry no server suggestion.
pub const BASE_DELAY: Duration = Duration::from_secs(2);

/// Ceiling for computed backoff.
pub const MAX_DELAY: Duration = Duration::from_secs(60);

/// What the calling loop should do after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Wait(Duration),
    GiveUp(ApiError),
}

/// Exponential backoff policy. Holds configuration only; the attempt counter
/// belongs to the loop that calls [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that fails on the first transient error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Decides what follows failed attempt number `attempt` (1-based).
    ///
    /// Fatal failures are returned unchanged. Transient ones wait for the
    /// server's `retry_after` when given, else for `base_delay * 2^(attempt-1)`
    /// capped at `max_delay`, until `attempt` exceeds `max_retries`.
    pub fn should_retry(&self, attempt: u32, failure: Failure) -> Decision {
        match failure {
            Failure::Fatal(error) => Decision::GiveUp(error),
            Failure::Retryable { error, .. } if attempt > self.max_retries => {
                Decision::GiveUp(ApiError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                })
            }
            Failure::Retryable {
                retry_after: Some(delay),
                ..
            } => Decision::Wait(delay),
            Failure::Retryable { .. } => Decision::Wait(self.backoff(attempt)),
        }
    }

    /// Computed delay after failed attempt number `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}
