//! Per-key rate limiting.
//!
//! Each key owns a token bucket holding at most `capacity` tokens that
//! refills continuously at `capacity / window`. A full bucket admits a
//! burst of `capacity` requests; after a full window of silence the key is
//! back to full capacity.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn refill(&mut self, capacity: f64, window_secs: f64, now: Instant) {
        self.tokens = refilled(self.tokens, self.last_update, capacity, window_secs, now);
        if now > self.last_update {
            self.last_update = now;
        }
    }

    fn try_acquire(&mut self, capacity: f64, window_secs: f64, now: Instant) -> bool {
        self.refill(capacity, window_secs, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token count after refilling from `since` to `now`.
///
/// Multiplies before dividing so that integral windows rebuild exactly
/// `capacity`; a full window of silence always restores the bucket.
fn refilled(tokens: f64, since: Instant, capacity: f64, window_secs: f64, now: Instant) -> f64 {
    let elapsed = now.saturating_duration_since(since).as_secs_f64();
    if elapsed >= window_secs {
        return capacity;
    }
    (tokens + elapsed * capacity / window_secs).min(capacity)
}

/// Result of one consume-and-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Whole tokens left after this request.
    pub remaining: u64,
    /// Seconds until the next token, when denied.
    pub retry_after_secs: u64,
}

/// Sharded per-key limiter. Consume-and-check is atomic per key because
/// the bucket is mutated under its map shard lock.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, TokenBucket>,
    capacity: f64,
    window: Duration,
}

impl RateLimiter {
    /// `capacity` requests per `window`. Zero values are raised to the minimum.
    pub fn new(capacity: u64, window: Duration) -> Self {
        let capacity = capacity.max(1) as f64;
        let window = if window.is_zero() {
            Duration::from_secs(1)
        } else {
            window
        };
        Self {
            buckets: DashMap::new(),
            capacity,
            window,
        }
    }

    pub fn try_consume(&self, key: &str) -> bool {
        self.check(key).allowed
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Consume one token for `key` as of `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity, now));

        let window_secs = self.window.as_secs_f64();
        let allowed = bucket.try_acquire(self.capacity, window_secs, now);
        let retry_after_secs = if allowed {
            0
        } else {
            let missing = 1.0 - bucket.tokens;
            ((missing * window_secs / self.capacity).ceil() as u64).max(1)
        };

        RateLimitDecision {
            allowed,
            remaining: bucket.tokens.floor() as u64,
            retry_after_secs,
        }
    }

    /// Tokens currently available for `key` without consuming any.
    pub fn remaining(&self, key: &str) -> u64 {
        match self.buckets.get(key) {
            Some(bucket) => refilled(
                bucket.tokens,
                bucket.last_update,
                self.capacity,
                self.window.as_secs_f64(),
                Instant::now(),
            )
            .floor() as u64,
            None => self.capacity as u64,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity as u64
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Keys seen so far. State is never evicted.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}
