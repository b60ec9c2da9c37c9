//! Rate limit header parsing.
//!
//! The SDK never waits or retries on its own. When the API answers with
//! `429 Too Many Requests`, the headers are parsed into a [`RateLimitInfo`]
//! that is attached to [`Error::RateLimit`](crate::Error::RateLimit), so callers
//! can decide how long to back off.

use http::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Information extracted from rate limit headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// When the rate limit resets (from `X-RateLimit-Reset` or `RateLimit-Reset`).
    pub reset_at: Option<SystemTime>,

    /// How long to wait before retrying (from `Retry-After`).
    pub retry_after: Option<Duration>,

    /// Number of requests remaining in the current window.
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Recognized headers:
    /// - `Retry-After` (seconds or HTTP date)
    /// - `X-RateLimit-Reset` (Unix timestamp)
    /// - `RateLimit-Reset` (Unix timestamp)
    /// - `X-RateLimit-Remaining`
    ///
    /// # Examples
    ///
    /// ```
    /// use bundleup::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "60".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers);
    /// assert_eq!(info.retry_after, Some(std::time::Duration::from_secs(60)));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            reset_at: parse_rate_limit_reset(headers),
            retry_after: parse_retry_after(headers),
            remaining: parse_rate_limit_remaining(headers),
        }
    }

    /// Returns the recommended delay before the next attempt, capped at `max_wait`.
    ///
    /// Prefers `retry_after`, otherwise computes the time left until `reset_at`.
    /// Returns `None` when neither is known or the reset time already passed.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        let until_reset = self.reset_at?.duration_since(SystemTime::now()).ok()?;
        Some(until_reset.min(max_wait))
    }

    /// Returns `true` if no rate limit headers were present.
    pub fn is_empty(&self) -> bool {
        self.reset_at.is_none() && self.retry_after.is_none() && self.remaining.is_none()
    }
}

/// Parses the `Retry-After` header in either delay-seconds or HTTP-date form.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    // A date in the past means "retry now".
    Some(
        date_time
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}

fn parse_rate_limit_reset(headers: &HeaderMap) -> Option<SystemTime> {
    ["x-ratelimit-reset", "ratelimit-reset"]
        .iter()
        .filter_map(|name| headers.get(*name)?.to_str().ok()?.trim().parse::<u64>().ok())
        .map(|timestamp| UNIX_EPOCH + Duration::from_secs(timestamp))
        .next()
}

fn parse_rate_limit_remaining(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("x-ratelimit-remaining")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("60"));

        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_retry_after_http_date_in_past() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );

        assert_eq!(parse_retry_after(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_retry_after_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("soon"));

        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_parse_rate_limit_reset_prefers_x_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("100"));
        headers.insert("ratelimit-reset", HeaderValue::from_static("200"));

        assert_eq!(
            parse_rate_limit_reset(&headers),
            Some(UNIX_EPOCH + Duration::from_secs(100))
        );
    }

    #[test]
    fn test_parse_rate_limit_reset_draft_header() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-reset", HeaderValue::from_static("200"));

        assert_eq!(
            parse_rate_limit_reset(&headers),
            Some(UNIX_EPOCH + Duration::from_secs(200))
        );
    }

    #[test]
    fn test_rate_limit_info_with_reset_and_remaining() {
        let mut headers = HeaderMap::new();
        let future_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 2;

        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from_str(&future_timestamp.to_string()).unwrap(),
        );
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));

        let info = RateLimitInfo::from_headers(&headers);
        assert!(info.reset_at.is_some());
        assert_eq!(info.remaining, Some(0));
        assert!(!info.is_empty());

        // Unix timestamps are whole seconds, so up to a second can be lost.
        let delay = info.delay(Duration::from_secs(300)).unwrap();
        assert!(
            delay <= Duration::from_secs(3),
            "Delay should be at most 3 seconds, got {:?}",
            delay
        );
    }

    #[test]
    fn test_rate_limit_delay_capped_by_max_wait() {
        let info = RateLimitInfo {
            reset_at: None,
            retry_after: Some(Duration::from_secs(600)),
            remaining: Some(0),
        };

        assert_eq!(
            info.delay(Duration::from_secs(300)),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_empty_headers() {
        let info = RateLimitInfo::from_headers(&HeaderMap::new());
        assert!(info.is_empty());
        assert_eq!(info.delay(Duration::from_secs(10)), None);
    }
}
