//! Bounded retry with exponential backoff.
//!
//! Model calls go through [`retry_async`], which also bounds every attempt with
//! the policy's request timeout. Passage-store lookups are synchronous and use
//! [`retry_blocking`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS,
};

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Sleep before the first retry; doubled after each failure.
    pub initial_backoff: Duration,
    /// Per-attempt bound, applied by [`retry_async`] only.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for RetryPolicy {
    fn from(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff,
            request_timeout: config.request_timeout,
        }
    }
}

impl RetryPolicy {
    /// Policy with a single attempt and no sleeping.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Outcome of one failed attempt.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

/// Every attempt failed; carries the last failure.
#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    pub operation: &'static str,
    pub attempts: u32,
    pub last: AttemptError<E>,
}

/// Runs `op` until it succeeds or the policy is exhausted.
pub async fn retry_async<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let backoff = policy.backoff_for(attempt);
            debug!(operation, attempt, ?backoff, "Retrying after backoff");
            tokio::time::sleep(backoff).await;
        }
        attempt += 1;

        let last = match tokio::time::timeout(policy.request_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => AttemptError::Failed(e),
            Err(_) => AttemptError::TimedOut(policy.request_timeout),
        };

        if attempt >= policy.max_attempts() {
            return Err(RetryExhausted {
                operation,
                attempts: attempt,
                last,
            });
        }
        debug!(operation, attempt, error = %last, "Attempt failed");
    }
}

/// Blocking counterpart of [`retry_async`]; no per-attempt timeout.
pub fn retry_blocking<T, E, F>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Result<T, E>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let backoff = policy.backoff_for(attempt);
            debug!(operation, attempt, ?backoff, "Retrying after backoff");
            std::thread::sleep(backoff);
        }
        attempt += 1;

        let last = match op() {
            Ok(value) => return Ok(value),
            Err(e) => AttemptError::Failed(e),
        };

        if attempt >= policy.max_attempts() {
            return Err(RetryExhausted {
                operation,
                attempts: attempt,
                last,
            });
        }
        debug!(operation, attempt, error = %last, "Attempt failed");
    }
}
