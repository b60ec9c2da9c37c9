//! Passthrough requests to the third-party API behind a connection.

use crate::{validate, Client, Error, RequestMetadata, Response, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};

/// Header identifying the connection a proxied or unified request targets.
pub const CONNECTION_ID_HEADER: &str = "bu-connection-id";

/// Forwards requests to `/connections/{connection_id}/proxy{path}`.
///
/// The response of the upstream service is returned as-is, subject to the
/// usual status mapping: a 404 from the provider is an [`Error::NotFound`].
///
/// # Examples
///
/// ```no_run
/// use bundleup::BundleUp;
/// use serde_json::{json, Value};
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let bundleup = BundleUp::new("your-api-key")?;
/// let proxy = bundleup.proxy("conn_123")?;
///
/// let users: Value = proxy.get("/users").await?;
/// let created: Value = proxy
///     .post("/users", Some(&json!({"name": "John Doe", "email": "john@example.com"})))
///     .await?;
/// println!("{} -> {}", users, created);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Proxy {
    client: Client,
    connection_id: String,
    /// `/connections/{connection_id}/proxy` with the id percent-encoded.
    base_path: String,
    headers: HeaderMap,
}

impl Proxy {
    /// Creates a proxy for `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `connection_id` is empty.
    pub fn new(client: Client, connection_id: impl Into<String>) -> Result<Self> {
        let connection_id = connection_id.into();
        let headers = connection_headers(&connection_id)?;
        let base_path = format!(
            "/connections/{}/proxy",
            validate::path_segment(&connection_id, "connection_id")?
        );

        Ok(Self {
            client,
            connection_id,
            base_path,
            headers,
        })
    }

    /// The connection requests are forwarded through.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Adds a header sent with every request through this proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Forwards a request with any verb.
    pub async fn request<Req, Res>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Req>,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let path = self.proxy_path(path)?;
        let metadata = RequestMetadata::new(method, path).with_headers(&self.headers);
        self.client.request(metadata, body).await
    }

    /// Forwards a GET and decodes the upstream body into `Res`.
    ///
    /// A leading `/` is optional and a `?query` suffix is passed through.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bundleup::BundleUp;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize)]
    /// struct Repo {
    ///     full_name: String,
    /// }
    ///
    /// # async fn example() -> Result<(), bundleup::Error> {
    /// let bundleup = BundleUp::new("your-api-key")?;
    /// let github = bundleup.proxy("conn_github")?;
    ///
    /// let repos: Vec<Repo> = github.get("user/repos?per_page=10").await?;
    /// for repo in repos {
    ///     println!("{}", repo.full_name);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get<Res: DeserializeOwned>(&self, path: &str) -> Result<Res> {
        self.request::<(), Res>(Method::GET, path, None)
            .await
            .map(Response::into_data)
    }

    /// Forwards a POST with an optional JSON body.
    pub async fn post<Req, Res>(&self, path: &str, body: Option<&Req>) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.request(Method::POST, path, body)
            .await
            .map(Response::into_data)
    }

    /// Forwards a PUT with an optional JSON body.
    pub async fn put<Req, Res>(&self, path: &str, body: Option<&Req>) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.request(Method::PUT, path, body)
            .await
            .map(Response::into_data)
    }

    /// Forwards a PATCH with an optional JSON body.
    pub async fn patch<Req, Res>(&self, path: &str, body: Option<&Req>) -> Result<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.request(Method::PATCH, path, body)
            .await
            .map(Response::into_data)
    }

    /// Forwards a DELETE. Upstream services often answer with no body, in
    /// which case `Res` decodes from an empty value.
    pub async fn delete<Res: DeserializeOwned>(&self, path: &str) -> Result<Res> {
        self.request::<(), Res>(Method::DELETE, path, None)
            .await
            .map(Response::into_data)
    }

    fn proxy_path(&self, path: &str) -> Result<String> {
        let path = validate::relative_path(path, "path")?;
        let separator = if path.starts_with('/') { "" } else { "/" };
        Ok(format!("{}{}{}", self.base_path, separator, path))
    }
}

/// Validates `connection_id` and builds the header that scopes requests to it.
pub(crate) fn connection_headers(connection_id: &str) -> Result<HeaderMap> {
    let connection_id = validate::non_empty(connection_id, "connection_id")?;
    let value = HeaderValue::try_from(connection_id)
        .map_err(|e| Error::Validation(format!("Invalid connection_id: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(CONNECTION_ID_HEADER), value);
    Ok(headers)
}
