//! Retry policy for directory requests.
//!
//! Only rate limiting (429) and server-side errors (5xx) are retried, plus
//! transport failures. Client errors are final.

use std::future::Future;

use crate::config::RetryConfig;
use crate::resilience::backoff::backoff_for;
use crate::roster::{DirectoryError, DirectoryResult};

/// Whether a directory failure is worth another attempt.
pub fn is_retryable(error: &DirectoryError) -> bool {
    match error {
        DirectoryError::Transport(_) => true,
        DirectoryError::Status(status) => *status == 429 || (500..600).contains(status),
        _ => false,
    }
}

/// Run `operation` until it succeeds, fails permanently, or the attempt
/// budget is spent.
pub async fn retry<T, F, Fut>(config: &RetryConfig, mut operation: F) -> DirectoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DirectoryResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retryable(&err) && attempt < max_attempts => {
                let delay = backoff_for(config, attempt);
                tracing::debug!(attempt, delay = ?delay, error = %err, "Retrying directory request");
                tokio::time::sleep(delay).await;
            }
            Err(err) if is_retryable(&err) && max_attempts > 1 => {
                return Err(DirectoryError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable(&DirectoryError::Status(429)));
        assert!(is_retryable(&DirectoryError::Status(503)));
        assert!(is_retryable(&DirectoryError::Transport("reset".into())));
        assert!(!is_retryable(&DirectoryError::Status(404)));
        assert!(!is_retryable(&DirectoryError::Decode("bad json".into())));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry(&fast(), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DirectoryError::Status(503))
            } else {
                Ok("page")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_after_budget() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: DirectoryResult<()> = retry(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DirectoryError::Status(429))
        })
        .await;
        assert!(matches!(result, Err(DirectoryError::Exhausted { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: DirectoryResult<()> = retry(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DirectoryError::Status(403))
        })
        .await;
        assert!(matches!(result, Err(DirectoryError::Status(403))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
