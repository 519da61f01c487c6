//! Token bucket rate limiter
//!
//! Tokens refill continuously at `max_requests / window`. The bucket starts
//! full and holds `max_requests * burst_allowance` tokens, so a quiet client
//! may burst above the sustained rate before it is paced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use adflow_domain::RateLimitSettings;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

// Absorbs float drift so a bucket refilled for exactly one token admits it.
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Counter snapshot for a [`TokenBucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimiterStats {
    /// Tokens handed out.
    pub acquired: u64,
    /// Acquisitions that had to wait for a refill.
    pub delayed: u64,
}

/// Token bucket shared by every request of one executor.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
    acquired: AtomicU64,
    delayed: AtomicU64,
}

impl TokenBucket {
    /// Allow `max_requests` per `window` with a bucket of
    /// `max_requests * burst_allowance` tokens (never less than one).
    pub fn new(max_requests: u32, window: Duration, burst_allowance: f64) -> Self {
        let sustained = f64::from(max_requests.max(1));
        let capacity = (sustained * burst_allowance).floor().max(1.0);
        let refill_per_sec = sustained / window.as_secs_f64().max(f64::EPSILON);

        Self {
            capacity,
            refill_per_sec,
            bucket: Mutex::new(Bucket { tokens: capacity, last_refill: Instant::now() }),
            acquired: AtomicU64::new(0),
            delayed: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_requests,
            Duration::from_secs(settings.window_secs),
            settings.burst_allowance,
        )
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn capacity(&self) -> u64 {
        self.capacity as u64
    }

    /// Tokens currently in the bucket, refill included.
    pub fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }

    /// Take a token without waiting.
    pub fn try_acquire(&self) -> bool {
        let taken = self.take_or_wait().is_none();
        if taken {
            self.acquired.fetch_add(1, Ordering::Relaxed);
        }
        taken
    }

    /// Take a token, sleeping until the bucket has refilled one.
    pub async fn acquire(&self) {
        let mut waited = false;
        while let Some(wait) = self.take_or_wait() {
            if !waited {
                self.delayed.fetch_add(1, Ordering::Relaxed);
                waited = true;
            }
            debug!(wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX), "rate limited");
            tokio::time::sleep(wait).await;
        }
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            delayed: self.delayed.load(Ordering::Relaxed),
        }
    }

    /// Consume a token, or return how long until one is available.
    fn take_or_wait(&self) -> Option<Duration> {
        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket);

        if bucket.tokens + TOKEN_EPSILON >= 1.0 {
            bucket.tokens = (bucket.tokens - 1.0).max(0.0);
            return None;
        }
        Some(Duration::from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec))
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            bucket.tokens = elapsed.mul_add(self.refill_per_sec, bucket.tokens).min(self.capacity);
            bucket.last_refill = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_is_free_then_paced() {
        // 2 per second, capacity 3
        let limiter = TokenBucket::new(2, Duration::from_secs(1), 1.5);
        assert_eq!(limiter.capacity(), 3);

        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(started.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::from_millis(500));
        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));

        assert_eq!(limiter.stats(), RateLimiterStats { acquired: 5, delayed: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn try_acquire_never_waits() {
        let limiter = TokenBucket::new(1, Duration::from_secs(1), 1.0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.try_acquire());
        assert_eq!(limiter.stats().acquired, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refill_is_capped_at_capacity() {
        let limiter = TokenBucket::new(60, Duration::from_secs(60), 1.5);
        assert_eq!(limiter.capacity(), 90);
        for _ in 0..90 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!((limiter.available() - 90.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_defaults_allow_sixty_a_minute() {
        let limiter = TokenBucket::from_settings(&RateLimitSettings::default());
        for _ in 0..90 {
            limiter.acquire().await;
        }
        let started = Instant::now();
        limiter.acquire().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }
}
