//! Retry policy and bounded exponential backoff.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Maximum number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Shortest backoff between attempts.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);
/// Longest backoff between attempts.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// When and how long to wait before re-sending a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub min_backoff: Duration,
    /// Upper bound for any delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_retries: 0,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// A server supplied `Retry-After` wins over the exponential schedule but
    /// is still capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(after) = retry_after {
            return after.min(self.max_backoff);
        }
        let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.min_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Whether a response with `status` should be retried.
    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS
            || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
    }

    /// Whether a transport failure should be retried. Errors raised while
    /// building the request would fail identically on every attempt.
    #[must_use]
    pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
        !err.is_builder() && !err.is_redirect()
    }
}

/// `Retry-After` in delta-seconds form for 429 and 503 responses.
pub(crate) fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn backoff_doubles_within_bounds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0, None), Duration::from_secs(1));
        assert_eq!(policy.backoff(1, None), Duration::from_secs(2));
        assert_eq!(policy.backoff(2, None), Duration::from_secs(4));
        assert_eq!(policy.backoff(3, None), Duration::from_secs(5));
        assert_eq!(policy.backoff(40, None), Duration::from_secs(5));
    }

    #[test]
    fn retry_after_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.backoff(0, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.backoff(0, Some(Duration::from_secs(120))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(RetryPolicy::is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(RetryPolicy::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn retry_after_header_only_for_throttling_statuses() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(
            retry_after(StatusCode::SERVICE_UNAVAILABLE, &headers),
            Some(Duration::from_secs(3))
        );
        assert_eq!(retry_after(StatusCode::INTERNAL_SERVER_ERROR, &headers), None);

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(StatusCode::TOO_MANY_REQUESTS, &headers), None);
    }
}
