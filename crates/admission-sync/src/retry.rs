//! Bounded retry with exponential backoff

use admission_core::{BackendError, RetryPolicy};
use std::future::Future;

/// Final error after the retry budget was spent or a non-retryable error hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    /// Attempts made
    pub attempts: u32,
    /// Last error observed
    pub error: BackendError,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.attempts()` attempts were made
///
/// Sleeps `policy.delay_for(n)` after failed attempt `n`, so the waits grow
/// strictly.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut f: F,
) -> Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(operation, attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                let attempts = attempt + 1;
                if attempts >= max_attempts || !error.is_retryable() {
                    tracing::warn!(operation, attempts, error = %error, "giving up");
                    return Err(RetryFailure { attempts, error });
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "transient error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
