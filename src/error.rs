//! Error types for BundleUp API calls.
//!
//! Every fallible operation returns [`Error`]. The variants fall into three
//! groups:
//!
//! - the API error family: [`Error::Validation`], [`Error::Authentication`],
//!   [`Error::NotFound`], [`Error::RateLimit`] and [`Error::Api`]
//!   ([`Error::is_api_error`]);
//! - connectivity failures, where no response was received at all:
//!   [`Error::Connectivity`] and [`Error::Timeout`] ([`Error::is_connectivity`]);
//! - local usage and encoding problems such as [`Error::Closed`].

use crate::rate_limit::RateLimitInfo;
use http::{HeaderMap, StatusCode};
use std::fmt;

/// Details of a non-2xx response from the BundleUp API.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// The HTTP status code.
    pub status: StatusCode,
    /// Human readable message taken from the response body, or a generic one.
    pub message: String,
    /// The raw response body.
    pub raw_response: String,
    /// The response headers.
    pub headers: HeaderMap,
    /// Rate limit headers, parsed for `429` responses.
    pub rate_limit_info: Option<RateLimitInfo>,
}

impl ApiError {
    /// Builds an `ApiError` from a failed response.
    pub fn new(status: StatusCode, headers: HeaderMap, raw_response: impl Into<String>) -> Self {
        let raw_response = raw_response.into();
        let message = extract_message(&raw_response).unwrap_or_else(|| generic_message(status));
        let rate_limit_info = if status == StatusCode::TOO_MANY_REQUESTS {
            Some(RateLimitInfo::from_headers(&headers))
        } else {
            None
        };

        Self {
            status,
            message,
            raw_response,
            headers,
            rate_limit_info,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status.as_u16())
    }
}

/// The error type for all BundleUp SDK operations.
///
/// # Examples
///
/// ```no_run
/// use bundleup::{BundleUp, Error, ListParams};
///
/// # async fn example() -> Result<(), Error> {
/// let bundleup = BundleUp::new("your-api-key")?;
///
/// match bundleup.connections().retrieve("conn_123").await {
///     Ok(connection) => println!("Found {:?}", connection.name),
///     Err(Error::NotFound(_)) => println!("No such connection"),
///     Err(Error::Authentication(err)) => eprintln!("Bad API key: {}", err.message),
///     Err(e) if e.is_connectivity() => eprintln!("API unreachable: {}", e),
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Caller input was rejected before any request was sent.
    ///
    /// Raised for an empty API key, an empty id or connection id, or a
    /// payload that is not a JSON object or lacks a required field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The API answered `401 Unauthorized`.
    #[error("Authentication failed: {0}")]
    Authentication(ApiError),

    /// The API answered `404 Not Found`.
    #[error("Not found: {0}")]
    NotFound(ApiError),

    /// The API answered `429 Too Many Requests`.
    ///
    /// The wrapped [`ApiError`] carries the parsed rate limit headers.
    #[error("Rate limit exceeded: {0}")]
    RateLimit(ApiError),

    /// The API answered with any other non-2xx status.
    #[error("API error: {0}")]
    Api(ApiError),

    /// The request could not be completed at the network level
    /// (DNS failure, connection refused, TLS failure, ...).
    #[error("Connectivity error: {0}")]
    Connectivity(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// The client was closed and can no longer issue requests.
    #[error("Client is closed")]
    Closed,

    /// A 2xx response body could not be decoded into the expected type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid client configuration, such as a malformed header value.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err)
        } else {
            Error::Connectivity(err)
        }
    }
}

impl Error {
    /// Maps a non-2xx response onto the matching error variant.
    ///
    /// | Status | Variant |
    /// |--------|---------|
    /// | 401 | [`Error::Authentication`] |
    /// | 404 | [`Error::NotFound`] |
    /// | 429 | [`Error::RateLimit`] |
    /// | other | [`Error::Api`] |
    ///
    /// # Examples
    ///
    /// ```
    /// use bundleup::Error;
    /// use http::{HeaderMap, StatusCode};
    ///
    /// let err = Error::from_response(
    ///     StatusCode::UNAUTHORIZED,
    ///     HeaderMap::new(),
    ///     r#"{"message": "Invalid API key"}"#,
    /// );
    ///
    /// assert!(matches!(err, Error::Authentication(_)));
    /// assert_eq!(err.message(), Some("Invalid API key"));
    /// ```
    pub fn from_response(
        status: StatusCode,
        headers: HeaderMap,
        raw_response: impl Into<String>,
    ) -> Self {
        let api_error = ApiError::new(status, headers, raw_response);
        match status {
            StatusCode::UNAUTHORIZED => Error::Authentication(api_error),
            StatusCode::NOT_FOUND => Error::NotFound(api_error),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimit(api_error),
            _ => Error::Api(api_error),
        }
    }

    /// Returns `true` for the API error family: validation failures and every
    /// error built from an API response.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Authentication(_)
                | Error::NotFound(_)
                | Error::RateLimit(_)
                | Error::Api(_)
        )
    }

    /// Returns `true` if the API could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity(_) | Error::Timeout(_))
    }

    /// Returns the API response details if this error was built from one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Authentication(err)
            | Error::NotFound(err)
            | Error::RateLimit(err)
            | Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => self.api_error().map(|err| err.status),
        }
    }

    /// Returns the human readable message of API and validation errors.
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::Validation(message) => Some(message),
            _ => self.api_error().map(|err| err.message.as_str()),
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => self.api_error().map(|err| err.raw_response.as_str()),
        }
    }

    /// Returns rate limit information for [`Error::RateLimit`].
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        self.api_error()?.rate_limit_info.as_ref()
    }
}

/// A specialized `Result` type for BundleUp SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pulls a message out of a JSON error body.
///
/// Looks at `message`, then `error` (a string, or an object with its own
/// `message`), then `error_description`.
fn extract_message(raw_response: &str) -> Option<String> {
    let body: serde_json::Value = serde_json::from_str(raw_response).ok()?;

    let candidates = [
        body.get("message"),
        body.get("error"),
        body.get("error").and_then(|error| error.get("message")),
        body.get("error_description"),
    ];

    let message = candidates
        .into_iter()
        .flatten()
        .filter_map(serde_json::Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string);
    message
}

fn generic_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("Request failed with status {} {}", status.as_u16(), reason),
        None => format!("Request failed with status {}", status.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(status: u16, body: &str) -> Error {
        Error::from_response(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            body,
        )
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(map(401, ""), Error::Authentication(_)));
        assert!(matches!(map(404, ""), Error::NotFound(_)));
        assert!(matches!(map(429, ""), Error::RateLimit(_)));
        assert!(matches!(map(400, ""), Error::Api(_)));
        assert!(matches!(map(403, ""), Error::Api(_)));
        assert!(matches!(map(500, ""), Error::Api(_)));

        let err = map(503, "");
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_message_from_message_field() {
        let err = map(400, r#"{"message": "name is required", "error": "bad_request"}"#);
        assert_eq!(err.message(), Some("name is required"));
    }

    #[test]
    fn test_message_from_error_field() {
        let err = map(401, r#"{"error": "Invalid API key"}"#);
        assert_eq!(err.message(), Some("Invalid API key"));
    }

    #[test]
    fn test_message_from_nested_error_object() {
        let err = map(500, r#"{"error": {"code": "internal", "message": "boom"}}"#);
        assert_eq!(err.message(), Some("boom"));
    }

    #[test]
    fn test_message_falls_back_to_status() {
        let err = map(404, "<html>not here</html>");
        assert_eq!(err.message(), Some("Request failed with status 404 Not Found"));
        assert_eq!(err.raw_response(), Some("<html>not here</html>"));

        let err = map(502, r#"{"detail": "upstream"}"#);
        assert_eq!(err.message(), Some("Request failed with status 502 Bad Gateway"));
    }

    #[test]
    fn test_rate_limit_info_only_on_429() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", "30".parse().unwrap());

        let err = Error::from_response(StatusCode::TOO_MANY_REQUESTS, headers.clone(), "");
        assert_eq!(
            err.rate_limit_info().and_then(|info| info.retry_after),
            Some(std::time::Duration::from_secs(30))
        );

        let err = Error::from_response(StatusCode::SERVICE_UNAVAILABLE, headers, "");
        assert!(err.rate_limit_info().is_none());
    }

    #[test]
    fn test_error_families() {
        assert!(Error::Validation("id cannot be empty".into()).is_api_error());
        assert!(map(500, "").is_api_error());
        assert!(!map(500, "").is_connectivity());
        assert!(!Error::Closed.is_api_error());
        assert!(!Error::Closed.is_connectivity());
    }

    #[test]
    fn test_display_includes_status() {
        let err = map(500, r#"{"message": "boom"}"#);
        assert_eq!(err.to_string(), "API error: boom (status 500)");
    }
}
