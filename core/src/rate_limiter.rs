use std::sync::Mutex;
use std::time::Instant;

/// Token bucket gate, one per rate-limited endpoint: websocket-message,
/// generic RPC, mint-validation RPC. Refill rate and burst size are
/// configuration-time; `acquire` either blocks until `n` tokens are
/// available or, in non-blocking mode, returns `false` immediately.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    refill_per_sec: f64,
    burst: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(refill_per_sec: f64, burst: f64) -> Self {
        RateLimiter {
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
            refill_per_sec,
            burst,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.burst);
        state.last_refill = now;
    }

    /// Non-blocking: refuse immediately if `n` tokens aren't available.
    pub fn try_acquire(&self, n: f64) -> bool {
        let mut state = self.state.lock().expect("rate limiter mutex poisoned");
        self.refill(&mut state);
        if state.tokens >= n {
            state.tokens -= n;
            true
        } else {
            false
        }
    }

    /// Blocking: wait (async-sleep in small steps) until `n` tokens are free.
    pub async fn acquire(&self, n: f64) {
        loop {
            if self.try_acquire(n) {
                return;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_when_empty() {
        let limiter = RateLimiter::new(1.0, 1.0);
        assert!(limiter.try_acquire(1.0));
        assert!(!limiter.try_acquire(1.0));
    }

    #[tokio::test]
    async fn blocking_acquire_eventually_succeeds() {
        let limiter = RateLimiter::new(1000.0, 1.0);
        assert!(limiter.try_acquire(1.0));
        tokio::time::timeout(tokio::time::Duration::from_secs(1), limiter.acquire(1.0))
            .await
            .expect("acquire should not hang");
    }
}
