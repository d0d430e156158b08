//! Retry controller
//!
//! Re-invokes a remote operation while its classified error is retryable and
//! the attempt budget is not spent. Backoff is linear in the attempt number:
//! `delay = base_delay * multiplier * attempt`, where generation uses twice the
//! multiplier of upload.

use crate::error::ClassifiedError;
use crate::types::RemoteOperation;
use std::future::Future;
use std::time::Duration;

/// Per-operation retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff unit
    pub base_delay: Duration,
    /// Operation weight applied on top of the attempt number
    pub multiplier: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
    pub const GENERATION_MULTIPLIER: u32 = 2;

    #[inline]
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_retries,
            base_delay,
            multiplier,
        }
    }

    /// Default policy for an operation
    #[must_use]
    pub fn for_operation(operation: RemoteOperation) -> Self {
        let multiplier = match operation {
            RemoteOperation::UploadPhoto => 1,
            RemoteOperation::GenerateAltar => Self::GENERATION_MULTIPLIER,
        };
        Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_BASE_DELAY, multiplier)
    }

    /// With a different base delay
    #[inline]
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Total tries including the first
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the retry that follows failed attempt `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier)
            .saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::for_operation(RemoteOperation::UploadPhoto)
    }
}

/// Run `invoke` under `policy`.
///
/// Only errors flagged retryable are retried. When the budget is exhausted, or
/// the error is final, the last error is returned; if more than one attempt was
/// made its message carries the attempt count.
pub async fn retry<T, F, Fut>(
    operation: RemoteOperation,
    policy: &RetryPolicy,
    mut invoke: F,
) -> Result<T, ClassifiedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match invoke().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(%operation, attempt, "remote operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < policy.max_attempts() => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    %operation,
                    attempt,
                    code = %err.code(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "remote operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::debug!(%operation, attempt, code = %err.code(), "giving up");
                return Err(err.with_attempts(attempt));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn generation_backs_off_twice_as_long() {
        let upload = RetryPolicy::for_operation(RemoteOperation::UploadPhoto);
        let generate = RetryPolicy::for_operation(RemoteOperation::GenerateAltar);

        assert_eq!(upload.delay_for(1), Duration::from_millis(1000));
        assert_eq!(upload.delay_for(3), Duration::from_millis(3000));
        assert_eq!(generate.delay_for(1), Duration::from_millis(2000));
        assert_eq!(generate.delay_for(3), Duration::from_millis(6000));
        assert_eq!(upload.max_attempts(), 4);
        assert_eq!(generate.max_attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn always_retryable_is_attempted_four_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::for_operation(RemoteOperation::UploadPhoto);

        let counter = Arc::clone(&calls);
        let started = tokio::time::Instant::now();
        let result: Result<(), _> = retry(RemoteOperation::UploadPhoto, &policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ClassifiedError::timeout()) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.code(), &ErrorCode::Timeout);
        assert!(err.is_retryable());
        assert!(err.message().ends_with("(intentos: 4)"));
        // 1s + 2s + 3s of backoff
        assert!(started.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn generation_backoff_totals_twelve_seconds() {
        let policy = RetryPolicy::for_operation(RemoteOperation::GenerateAltar);
        let started = tokio::time::Instant::now();
        let _ = retry(RemoteOperation::GenerateAltar, &policy, || async {
            Err::<(), _>(ClassifiedError::network())
        })
        .await;
        assert!(started.elapsed() >= Duration::from_secs(12));
        assert!(started.elapsed() < Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_immediately_without_annotation() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = retry(RemoteOperation::UploadPhoto, &RetryPolicy::default(), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ClassifiedError::incomplete_response()) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!err.message().contains("intentos"));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_when_a_later_attempt_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = retry(RemoteOperation::GenerateAltar, &RetryPolicy::default(), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ClassifiedError::network())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_when_error_turns_final() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: Result<(), _> = retry(RemoteOperation::UploadPhoto, &RetryPolicy::default(), || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ClassifiedError::timeout())
                } else {
                    Err(ClassifiedError::unknown("bad photo"))
                }
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.message(), "bad photo (intentos: 2)");
        assert_eq!(err.code(), &ErrorCode::UnknownError);
    }
}
