//! The request client every BundleUp call goes through.
//!
//! [`Client`] owns the connection pool, the base URL and the auth header.
//! It serializes bodies and query parameters, maps non-2xx responses onto
//! [`Error`] and decodes JSON bodies. Use [`ClientBuilder`] to configure one.

use crate::{
    metadata::{QueryParams, RequestMetadata},
    validate, Error, Response, Result,
};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use url::Url;

/// The production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.bundleup.io/v1";

/// Environment variable read by [`Client::from_env`] for the API key.
pub const API_KEY_ENV: &str = "BUNDLEUP_API_KEY";

/// Environment variable read by [`Client::from_env`] for the base URL.
pub const BASE_URL_ENV: &str = "BUNDLEUP_BASE_URL";

const DEFAULT_USER_AGENT: &str = concat!("bundleup-rust/", env!("CARGO_PKG_VERSION"));

/// An authenticated HTTP client for the BundleUp API.
///
/// Cloning is cheap; clones share the configuration and the connection
/// pool. Closing any clone closes all of them.
///
/// # Examples
///
/// ```no_run
/// use bundleup::Client;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let client = Client::builder()
///     .api_key("your-api-key")
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let connections = client.get::<serde_json::Value>("/connections").await?.into_data();
/// println!("{}", connections);
///
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// `None` once the client has been closed.
    http_client: RwLock<Option<reqwest::Client>>,
    base_url: Url,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client for the production API with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a client from `BUNDLEUP_API_KEY` and the optional
    /// `BUNDLEUP_BASE_URL` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_ENV)
            .ok_or_else(|| Error::Configuration(format!("{} is not set", API_KEY_ENV)))?;

        let mut builder = Self::builder().api_key(api_key);
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            builder = builder.base_url(base_url)?;
        }
        builder.build()
    }

    /// The base URL every request path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Releases this client's handle on the connection pool.
    ///
    /// Every later request on this client or any of its clones fails with
    /// [`Error::Closed`]. Requests already in flight run to completion.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let mut slot = self
            .inner
            .http_client
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            tracing::debug!(base_url = %self.inner.base_url, "Closed BundleUp client");
        }
    }

    /// Returns `true` once [`Client::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner
            .http_client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Makes a single request and decodes the response.
    ///
    /// The body is only sent for POST, PUT and PATCH. A 2xx response with an
    /// empty body decodes as an empty value (`{}`, `[]` or `null`, whichever
    /// `Res` accepts). Non-2xx responses become the matching [`Error`]
    /// variant. No request is ever retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bundleup::{Client, RequestMetadata};
    /// use http::Method;
    /// use serde_json::{json, Value};
    ///
    /// # async fn example() -> Result<(), bundleup::Error> {
    /// let client = Client::new("your-api-key")?;
    ///
    /// let metadata = RequestMetadata::new(Method::POST, "/webhooks");
    /// let body = json!({"url": "https://example.com/hook", "events": ["connection.created"]});
    ///
    /// let webhook = client.request::<_, Value>(metadata, Some(&body)).await?;
    /// println!("Created webhook {}", webhook.data["id"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn request<Req, Res>(
        &self,
        metadata: RequestMetadata,
        body: Option<&Req>,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let http_client = self.http_client()?;

        let mut url = self.endpoint(&metadata.path);
        if !metadata.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in metadata.query.iter() {
                pairs.append_pair(key, value);
            }
        }

        tracing::debug!(
            method = %metadata.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut request = http_client
            .request(metadata.method.clone(), url)
            .headers(self.inner.default_headers.clone())
            .headers(metadata.headers.clone());

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = body {
            if accepts_body(&metadata.method) {
                let json = serde_json::to_value(body)
                    .map_err(|e| Error::SerializationFailed(e.to_string()))?;
                request = request.json(&json);
            } else {
                tracing::debug!(
                    method = %metadata.method,
                    "Dropping request body for method without payload"
                );
            }
        }

        let start_time = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = Error::from(e);
                tracing::warn!(
                    error = %error,
                    method = %metadata.method,
                    path = %metadata.path,
                    "Request failed"
                );
                return Err(error);
            }
        };

        self.parse_response(response, start_time).await
    }

    /// Joins a relative path onto the base URL, keeping any base path prefix.
    /// A query string inlined in `path` replaces the base URL's query.
    pub(crate) fn endpoint(&self, path: &str) -> Url {
        let mut url = self.inner.base_url.clone();
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base_path, path.trim_start_matches('/')));
        if query.is_some() {
            url.set_query(query);
        }
        url
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        self.inner
            .http_client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::Closed)
    }

    async fn parse_response<Res>(
        &self,
        response: reqwest::Response,
        start_time: Instant,
    ) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let raw_response = response.text().await.unwrap_or_default();
            let latency = start_time.elapsed();

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    latency_ms = latency.as_millis(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else {
                tracing::warn!(
                    status = status.as_u16(),
                    latency_ms = latency.as_millis(),
                    response = %raw_response,
                    "Server error"
                );
            }

            return Err(Error::from_response(status, headers, raw_response));
        }

        let raw_body = response.text().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        match decode_body::<Res>(&raw_body) {
            Ok(data) => Ok(Response::new(data, raw_body, status, headers, latency)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }

    /// Makes a GET request to the specified path.
    pub async fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::GET, path);
        self.request::<(), Res>(metadata, None).await
    }

    /// Makes a GET request with query parameters.
    pub async fn get_with_query<Res>(
        &self,
        path: impl Into<String>,
        query: &QueryParams,
    ) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::GET, path).with_query(query);
        self.request::<(), Res>(metadata, None).await
    }

    /// Makes a POST request to the specified path with a JSON body.
    pub async fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::POST, path);
        self.request(metadata, Some(body)).await
    }

    /// Makes a PUT request to the specified path with a JSON body.
    pub async fn put<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::PUT, path);
        self.request(metadata, Some(body)).await
    }

    /// Makes a PATCH request to the specified path with a JSON body.
    pub async fn patch<Req, Res>(
        &self,
        path: impl Into<String>,
        body: &Req,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::PATCH, path);
        self.request(metadata, Some(body)).await
    }

    /// Makes a DELETE request to the specified path.
    pub async fn delete<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let metadata = RequestMetadata::new(Method::DELETE, path);
        self.request::<(), Res>(metadata, None).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn accepts_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Decodes a response body; an empty body decodes as the first empty JSON
/// value (`{}`, `[]`, `null`) that `T` accepts.
fn decode_body<T: DeserializeOwned>(raw_body: &str) -> serde_json::Result<T> {
    if raw_body.trim().is_empty() {
        if let Some(Ok(empty)) = ["{}", "[]", "null"]
            .iter()
            .map(|empty| serde_json::from_str::<T>(empty))
            .find(|decoded| decoded.is_ok())
        {
            return Ok(empty);
        }
    }
    serde_json::from_str(raw_body)
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use bundleup::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), bundleup::Error> {
/// let client = ClientBuilder::new()
///     .api_key("your-api-key")
///     .base_url("https://api.staging.bundleup.io/v1")?
///     .timeout(Duration::from_secs(30))
///     .default_header("X-Request-Source", "billing-sync")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            default_headers: HeaderMap::new(),
            user_agent: None,
            timeout: None,
            http_client: None,
        }
    }

    /// Sets the API key sent as a bearer token. Required.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the base URL (defaults to [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Overrides the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses an existing `reqwest::Client` (and its connection pool) instead
    /// of building a new one.
    ///
    /// Closing the BundleUp client only drops its own handle; the pool stays
    /// alive while other clones of `http_client` exist.
    pub fn http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the API key is missing or empty, and
    /// [`Error::Configuration`] if the base URL cannot carry a path or the
    /// HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let api_key = self.api_key.unwrap_or_default();
        validate::non_empty(&api_key, "api_key")?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if base_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "Base URL cannot be used as a base: {}",
                base_url
            )));
        }

        let mut authorization = HeaderValue::try_from(format!("Bearer {}", api_key))
            .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?;
        authorization.set_sensitive(true);

        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::try_from(user_agent)
            .map_err(|e| Error::Configuration(format!("Invalid user agent: {}", e)))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(AUTHORIZATION, authorization);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, user_agent);
        for (name, value) in &self.default_headers {
            default_headers.insert(name.clone(), value.clone());
        }

        let http_client = match self.http_client {
            Some(http_client) => http_client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::Configuration(format!("Failed to build HTTP client: {}", e))
            })?,
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client: RwLock::new(Some(http_client)),
                base_url,
                default_headers,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn test_client(base_url: &str) -> Client {
        Client::builder()
            .api_key("test-api-key")
            .base_url(base_url)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_from_lookup() {
        let missing = Client::from_lookup(|_| None);
        assert!(matches!(missing, Err(Error::Configuration(_))));

        let client = Client::from_lookup(|name| match name {
            API_KEY_ENV => Some("env-key".to_string()),
            BASE_URL_ENV => Some("http://localhost:8080/v2".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/v2");

        let client =
            Client::from_lookup(|name| (name == API_KEY_ENV).then(|| "k".to_string())).unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(Client::new(""), Err(Error::Validation(_))));
        assert!(matches!(Client::new("   "), Err(Error::Validation(_))));
        assert!(matches!(Client::builder().build(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_default_base_url() {
        let client = Client::new("test-api-key").unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = test_client("https://api.bundleup.io/v1");
        assert_eq!(
            client.endpoint("connections").as_str(),
            "https://api.bundleup.io/v1/connections"
        );
        assert_eq!(
            client.endpoint("/connections/conn_1").as_str(),
            "https://api.bundleup.io/v1/connections/conn_1"
        );

        let client = test_client("https://api.bundleup.io/v1/");
        assert_eq!(
            client.endpoint("/webhooks").as_str(),
            "https://api.bundleup.io/v1/webhooks"
        );
    }

    #[test]
    fn test_endpoint_with_inline_query() {
        let client = test_client("https://api.bundleup.io/v1");
        assert_eq!(
            client.endpoint("/connections/c1/proxy/users?page=2").as_str(),
            "https://api.bundleup.io/v1/connections/c1/proxy/users?page=2"
        );
    }

    #[test]
    fn test_endpoint_without_base_path() {
        let client = test_client("http://localhost:8080");
        assert_eq!(
            client.endpoint("integrations").as_str(),
            "http://localhost:8080/integrations"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = Client::builder()
            .api_key("test-api-key")
            .base_url("mailto:ops@example.com")
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let client = test_client("http://localhost:8080");
        let clone = client.clone();
        assert!(!clone.is_closed());

        client.close();
        client.close();
        assert!(clone.is_closed());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = test_client("http://localhost:8080");
        let debug = format!("{:?}", client);
        assert!(debug.contains("localhost"));
        assert!(!debug.contains("test-api-key"));
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_body::<Value>("").unwrap(), json!({}));
        assert_eq!(decode_body::<Value>("  \n").unwrap(), json!({}));
        assert_eq!(decode_body::<Vec<Value>>("").unwrap(), Vec::<Value>::new());
        decode_body::<()>("").unwrap();
        assert_eq!(decode_body::<Option<u32>>("").unwrap(), None);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body::<Value>(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert!(decode_body::<u32>("").is_err());
        assert!(decode_body::<Value>("not json").is_err());
    }

    #[test]
    fn test_accepts_body() {
        assert!(accepts_body(&Method::POST));
        assert!(accepts_body(&Method::PUT));
        assert!(accepts_body(&Method::PATCH));
        assert!(!accepts_body(&Method::GET));
        assert!(!accepts_body(&Method::DELETE));
    }
}
