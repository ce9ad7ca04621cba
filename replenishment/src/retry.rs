//! Retry-with-jittered-backoff for optimistic-locking conflicts (spec §5, §7): a caller
//! that loses a row race gets up to 3 attempts before `ConcurrentModification` surfaces.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{Error, Result};

const MAX_ATTEMPTS: u32 = 3;

/// Retries `attempt` up to [`MAX_ATTEMPTS`] times while it fails with
/// `Error::ConcurrentModification`, sleeping an exponentially growing, jittered delay between
/// tries. Any other error, or the final attempt's `ConcurrentModification`, is returned as-is.
pub async fn on_concurrent_modification<T, F, Fut>(mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(Error::ConcurrentModification { ids }) if attempts < MAX_ATTEMPTS => {
                let jitter_ms = rand::thread_rng().gen_range(50..=250);
                let backoff_ms = 100u64 * 2u64.pow(attempts - 1) + jitter_ms;
                tracing::warn!(attempts, ?ids, backoff_ms, "concurrent modification, retrying");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let calls = AtomicU32::new(0);
        let result = on_concurrent_modification(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::ConcurrentModification { ids: vec![Uuid::nil()] })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_error_after_exhausting_attempts() {
        let calls = AtomicU32::new(0);
        let result = on_concurrent_modification(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::ConcurrentModification { ids: vec![Uuid::nil()] }) }
        })
        .await;

        assert!(matches!(result, Err(Error::ConcurrentModification { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn does_not_retry_other_errors() {
        let calls = AtomicU32::new(0);
        let result = on_concurrent_modification(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::NoEligibleSuggestions) }
        })
        .await;

        assert!(matches!(result, Err(Error::NoEligibleSuggestions)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
