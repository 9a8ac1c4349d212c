use crate::error::CoreError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

const INITIAL_DELAY_MS: u64 = 500;
const JITTER_MAX_MS: u64 = 150;

/// Run `f` up to `max_attempts` times, doubling the delay each retry and
/// adding jitter in `[0, 150ms)`. Only retriable errors (rate-limited,
/// timeout, gateway-transient) are retried; everything else propagates
/// immediately. Exhausting attempts yields `RetriesExhausted`.
pub async fn run<T, F, Fut>(mut f: F, max_attempts: u32, name: &str) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempt = 0u32;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && attempt < max_attempts => {
                let jitter = rand::thread_rng().gen_range(0..JITTER_MAX_MS);
                log::warn!(
                    "{name}: attempt {attempt}/{max_attempts} failed ({err}), retrying in {}ms",
                    delay_ms + jitter
                );
                tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                delay_ms = delay_ms.saturating_mul(2);
            }
            Err(err) if err.is_retriable() => {
                return Err(CoreError::RetriesExhausted(format!("{name}: {err}")));
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = run(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CoreError>(42)
            },
            3,
            "test",
        )
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = run(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(CoreError::RateLimited("429".into()))
                } else {
                    Ok(7)
                }
            },
            5,
            "test",
        )
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries() {
        let result = run(
            || async { Err::<i32, _>(CoreError::Timeout("slow".into())) },
            2,
            "test",
        )
        .await;
        assert!(matches!(result, Err(CoreError::RetriesExhausted(_))));
    }

    #[tokio::test]
    async fn propagates_non_retriable_immediately() {
        let calls = AtomicU32::new(0);
        let result = run(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(CoreError::MintNotFound("x".into()))
            },
            5,
            "test",
        )
        .await;
        assert!(matches!(result, Err(CoreError::MintNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
