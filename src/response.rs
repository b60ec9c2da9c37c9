//! Response wrapper that keeps the decoded body next to the HTTP details.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful (2xx) response from the BundleUp API.
///
/// Derefs to the decoded `data`, so most callers can ignore the wrapper.
///
/// # Examples
///
/// ```no_run
/// use bundleup::Client;
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let client = Client::builder().api_key("your-api-key").build()?;
///
/// let response = client.get::<serde_json::Value>("/connections").await?;
/// println!("Status: {}", response.status);
/// println!("Request took {:?}", response.latency);
/// println!("Body: {}", response.raw_body);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response body.
    pub data: T,

    /// The raw response body as received. Empty for bodiless responses.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    /// Assembles a response from its decoded body and HTTP details.
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// ```
    /// # use bundleup::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let page = Response::new(
    ///     vec!["conn_1", "conn_2"],
    ///     r#"["conn_1","conn_2"]"#.to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(12),
    /// );
    ///
    /// let count = page.map(|ids| ids.len());
    /// assert_eq!(count.data, 2);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Discards the metadata and returns the decoded body.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Returns a header value by name, if present and valid UTF-8.
    ///
    /// Useful for reading rate limit headers on successful calls:
    ///
    /// ```
    /// # use bundleup::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("x-ratelimit-remaining", HeaderValue::from_static("41"));
    ///
    /// let response = Response::new((), String::new(), StatusCode::NO_CONTENT, headers, Duration::ZERO);
    /// assert_eq!(response.header("x-ratelimit-remaining"), Some("41"));
    /// assert!(response.is_bodiless());
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// `true` when the API answered without a body, as it does for most
    /// deletes. `data` then holds the decoded empty value.
    pub fn is_bodiless(&self) -> bool {
        self.raw_body.trim().is_empty()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
