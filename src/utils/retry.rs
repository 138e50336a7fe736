use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff Retry
// ============================================================================
//
// Used when establishing the database pool at startup, where the database
// container may still be coming up. Reconciliation runs are never retried.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failure
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_millis(((delay.as_millis() as f64) * self.multiplier) as u64).min(self.max_delay)
    }
}

#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success(T),
    /// Still failing after `max_attempts`
    Failed(E),
    /// Error classified as permanent; no further attempts were made
    PermanentFailure(E),
}

impl<T, E> RetryResult<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed(e) | RetryResult::PermanentFailure(e) => Err(e),
        }
    }
}

/// Whether an error is worth another attempt
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

impl IsTransient for sqlx::Error {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed
        )
    }
}

/// Retry `operation` with exponential backoff while its errors are transient
pub async fn retry_on_transient<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Operation succeeded after retry");
                }
                return RetryResult::Success(result);
            }
            Err(error) => {
                if !error.is_transient() {
                    tracing::error!(error = %error, "Permanent failure detected, not retrying");
                    return RetryResult::PermanentFailure(error);
                }

                if attempt >= config.max_attempts {
                    tracing::error!(
                        attempt = attempt,
                        error = %error,
                        "Operation failed after all retries"
                    );
                    return RetryResult::Failed(error);
                }

                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying after delay"
                );

                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "transient={}", self.transient)
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(fast(), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError { transient: true })
                } else {
                    Ok("connected")
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success("connected")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let result = retry_on_transient(fast(), |_attempt| async {
            Err::<(), _>(TestError { transient: true })
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(fast(), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TestError { transient: false })
            }
        })
        .await;

        assert!(matches!(result, RetryResult::PermanentFailure(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(result.into_result().is_err());
    }

    #[test]
    fn test_delay_is_capped() {
        let config = fast();
        assert_eq!(config.next_delay(Duration::from_millis(5)), Duration::from_millis(10));
        assert_eq!(config.next_delay(Duration::from_millis(15)), Duration::from_millis(20));
    }
}
