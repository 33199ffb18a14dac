//! Token bucket gating outbound calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::retry::duration_ms;

/// Rate limiter settings: sustained rate and burst allowance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Tokens added per second.
    pub per_second: f64,
    /// Bucket capacity; the bucket starts full.
    pub burst: u32,
}

impl RateLimit {
    /// Construct a limit.
    #[must_use]
    pub const fn new(per_second: f64, burst: u32) -> Self {
        Self { per_second, burst }
    }

    pub(crate) fn validate(&self) -> ClientResult<()> {
        if !self.per_second.is_finite() || self.per_second <= 0.0 {
            return Err(ClientError::config(format!(
                "rate limit must be a positive number of requests per second, got {}",
                self.per_second
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refreshed_at: Instant,
}

/// Token bucket shared by every call made through one client.
///
/// Safe to use from concurrent callers; the bucket state sits behind its own
/// mutex which is never held across a sleep.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a full bucket.
    #[must_use]
    pub fn new(limit: RateLimit) -> Self {
        let capacity = f64::from(limit.burst);
        Self {
            per_second: limit.per_second,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                refreshed_at: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available and take it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RateLimit`] when `cancel` fires before a token
    /// becomes available, or when the bucket has zero capacity.
    pub async fn acquire(&self, cancel: &CancellationToken) -> ClientResult<()> {
        if self.capacity < 1.0 {
            return Err(ClientError::RateLimit {
                reason: "limiter burst is zero",
            });
        }

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled_while_waiting());
            }

            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let elapsed = now.saturating_duration_since(bucket.refreshed_at);
                bucket.tokens = elapsed
                    .as_secs_f64()
                    .mul_add(self.per_second, bucket.tokens)
                    .min(self.capacity);
                bucket.refreshed_at = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - bucket.tokens) / self.per_second)
            };

            tracing::trace!(wait_ms = duration_ms(wait), "waiting for rate limiter token");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled_while_waiting()),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}

const fn cancelled_while_waiting() -> ClientError {
    ClientError::RateLimit {
        reason: "cancelled while waiting for a token",
    }
}
