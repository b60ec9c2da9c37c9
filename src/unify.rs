//! Normalized read-only views over chat, git and project management
//! integrations.
//!
//! Every accessor issues one GET on
//! `/connections/{connection_id}/unify/<domain>/<name>` and returns a
//! [`Page`]. Use [`Page::next_params`] to walk the cursor.

use crate::proxy::connection_headers;
use crate::{validate, Client, ListParams, Page, RequestMetadata, Response, Result};
use http::{HeaderMap, Method};
use serde_json::Value;

/// Unified API for one connection.
///
/// # Examples
///
/// ```no_run
/// use bundleup::{BundleUp, ListParams};
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let bundleup = BundleUp::new("your-api-key")?;
/// let unify = bundleup.unify("conn_123")?;
///
/// let channels = unify.chat().channels(&ListParams::new().limit(50).include_raw(true)).await?;
/// println!("{} channels, more: {}", channels.data.len(), channels.has_more());
///
/// let repos = unify.git().repos(&ListParams::new().limit(25)).await?;
/// println!("{} repositories", repos.data.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Unify {
    connection_id: String,
    chat: Chat,
    git: Git,
    pm: Pm,
}

impl Unify {
    /// Creates the unified API for `connection_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) if
    /// `connection_id` is empty.
    pub fn new(client: Client, connection_id: impl Into<String>) -> Result<Self> {
        let connection_id = connection_id.into();
        let scope = UnifyScope {
            headers: connection_headers(&connection_id)?,
            base_path: format!(
                "/connections/{}/unify",
                validate::path_segment(&connection_id, "connection_id")?
            ),
            client,
        };

        Ok(Self {
            connection_id,
            chat: Chat {
                scope: scope.clone(),
            },
            git: Git {
                scope: scope.clone(),
            },
            pm: Pm { scope },
        })
    }

    /// The connection the unified views read from.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Chat: channels.
    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Git: repositories, pull requests, tags and releases.
    pub fn git(&self) -> &Git {
        &self.git
    }

    /// Project management: issues.
    pub fn pm(&self) -> &Pm {
        &self.pm
    }
}

#[derive(Debug, Clone)]
struct UnifyScope {
    client: Client,
    base_path: String,
    headers: HeaderMap,
}

impl UnifyScope {
    async fn fetch(&self, path: &str, params: &ListParams) -> Result<Page<Value>> {
        let metadata = RequestMetadata::new(Method::GET, format!("{}{}", self.base_path, path))
            .with_headers(&self.headers)
            .with_query(&params.to_query());

        self.client
            .request::<(), Page<Value>>(metadata, None)
            .await
            .map(Response::into_data)
    }
}

/// Unified chat endpoints.
#[derive(Debug, Clone)]
pub struct Chat {
    scope: UnifyScope,
}

impl Chat {
    /// Lists chat channels.
    pub async fn channels(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/chat/channels", params).await
    }
}

/// Unified git endpoints.
#[derive(Debug, Clone)]
pub struct Git {
    scope: UnifyScope,
}

impl Git {
    /// Lists repositories.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bundleup::{BundleUp, ListParams};
    ///
    /// # async fn example() -> Result<(), bundleup::Error> {
    /// let bundleup = BundleUp::new("your-api-key")?;
    /// let git = bundleup.unify("conn_github")?.git().clone();
    ///
    /// let mut params = ListParams::new().limit(100);
    /// loop {
    ///     let page = git.repos(&params).await?;
    ///     for repo in &page.data {
    ///         println!("{}", repo["name"]);
    ///     }
    ///     match page.next_params(&params) {
    ///         Some(next) => params = next,
    ///         None => break,
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn repos(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/git/repos", params).await
    }

    /// Lists pull requests.
    pub async fn pulls(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/git/pulls", params).await
    }

    /// Lists tags.
    pub async fn tags(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/git/tags", params).await
    }

    /// Lists releases.
    pub async fn releases(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/git/releases", params).await
    }
}

/// Unified project management endpoints.
#[derive(Debug, Clone)]
pub struct Pm {
    scope: UnifyScope,
}

impl Pm {
    /// Lists issues.
    pub async fn issues(&self, params: &ListParams) -> Result<Page<Value>> {
        self.scope.fetch("/pm/issues", params).await
    }
}
