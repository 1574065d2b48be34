//! In-memory fixed-window rate limiter.
//!
//! Keyed by an arbitrary string (the recovery flow keys by normalized email).
//! Counters live in process memory only; a restart clears them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

impl Bucket {
    fn new(window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + window,
        }
    }

    fn check_and_increment(&mut self, limit: u32, window: Duration) -> bool {
        let now = Instant::now();

        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + window;
        }

        if self.count < limit {
            self.count += 1;
            true
        } else {
            false
        }
    }
}

#[derive(Clone)]
pub struct RequestRateLimiter {
    buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    limit: u32,
    window: Duration,
    max_buckets: usize,
}

impl RequestRateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            limit,
            window,
            max_buckets: 10_000,
        }
    }

    /// Record one attempt for `key`. Returns false once the window's quota is
    /// spent.
    pub async fn allow(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;

        // Drop expired buckets before the map can grow without bound.
        if buckets.len() >= self.max_buckets {
            let now = Instant::now();
            buckets.retain(|_, b| b.reset_at > now);
        }

        buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.window))
            .check_and_increment(self.limit, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_limit_then_blocks() {
        let limiter = RequestRateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(limiter.allow("a@example.com").await);
        }
        assert!(!limiter.allow("a@example.com").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RequestRateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.allow("a@example.com").await);
        assert!(!limiter.allow("a@example.com").await);
        assert!(limiter.allow("b@example.com").await);
    }

    #[tokio::test]
    async fn window_expiry_resets_quota() {
        let limiter = RequestRateLimiter::new(1, Duration::from_millis(20));

        assert!(limiter.allow("a@example.com").await);
        assert!(!limiter.allow("a@example.com").await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.allow("a@example.com").await);
    }
}
