//! Retry loop with exponential backoff and error classification.
//!
//! Attempt 1 runs immediately. After failed attempt `n` the loop sleeps
//! [`RetryPolicy::backoff_delay`]`(n)` and tries again, up to
//! `max_attempts` in total. Only errors whose [`ErrorKind`] is retryable
//! keep the loop going; anything else ends it at once.
//!
//! [`ErrorKind`]: crate::error::ErrorKind

use std::future::Future;

use tracing::{info, warn};

use crate::config::RetryPolicy;
use crate::error::GenerationError;

/// Run `attempt_fn` until it succeeds, fails with a non-retryable error,
/// or `policy.max_attempts` attempts have been made.
///
/// `attempt_fn` receives the 1-based attempt number. The error of the
/// final attempt is returned on failure. A `max_attempts` of zero is
/// treated as one.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt_fn: F,
) -> Result<T, GenerationError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match attempt_fn(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let kind = err.kind();
        if !kind.is_retryable() {
            warn!(attempt, kind = %kind, error = %err, "non-retryable failure");
            return Err(err);
        }
        if attempt >= max_attempts {
            warn!(attempt, kind = %kind, error = %err, "retry attempts exhausted");
            return Err(err);
        }

        let delay = policy.backoff_delay(attempt);
        info!(
            attempt,
            kind = %kind,
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "attempt failed; backing off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// [`run_with_retry`], degraded to `None` on failure.
///
/// The failure is logged rather than surfaced, so one failed slot never
/// aborts the rest of a batch.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, attempt_fn: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    match run_with_retry(policy, attempt_fn).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(kind = %e.kind(), error = %e, "generation failed");
            None
        }
    }
}
