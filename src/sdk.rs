//! The top-level SDK entry point.

use crate::resource::{Connections, Integrations, Webhooks};
use crate::{Client, ClientBuilder, Proxy, Result, Unify};
use std::ops::Deref;

/// BundleUp API client.
///
/// Owns one [`Client`] and one instance of each collection client, all
/// sharing the same connection pool. Connection-scoped clients are created
/// on demand with [`BundleUp::proxy`] and [`BundleUp::unify`].
///
/// # Examples
///
/// ```no_run
/// use bundleup::{BundleUp, ListParams};
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let bundleup = BundleUp::new("your-api-key")?;
///
/// let connections = bundleup.connections().list(&ListParams::new()).await?;
/// let integrations = bundleup.integrations().list(&ListParams::new()).await?;
/// println!("{} connections, {} integrations", connections.len(), integrations.len());
///
/// bundleup.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BundleUp {
    client: Client,
    connections: Connections,
    integrations: Integrations,
    webhooks: Webhooks,
}

impl BundleUp {
    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) if `api_key`
    /// is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Client::new(api_key).map(Self::from_client)
    }

    /// Returns a [`ClientBuilder`]; finish with [`BundleUp::from_client`].
    pub fn builder() -> ClientBuilder {
        Client::builder()
    }

    /// Creates a client from `BUNDLEUP_API_KEY` and `BUNDLEUP_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Client::from_env().map(Self::from_client)
    }

    /// Wraps an already configured [`Client`].
    pub fn from_client(client: Client) -> Self {
        Self {
            connections: Connections::new(client.clone()),
            integrations: Integrations::new(client.clone()),
            webhooks: Webhooks::new(client.clone()),
            client,
        }
    }

    /// The underlying request client, for endpoints without a wrapper.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Connections between the account and third-party services.
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Supported integrations.
    pub fn integrations(&self) -> &Integrations {
        &self.integrations
    }

    /// Registered webhooks.
    pub fn webhooks(&self) -> &Webhooks {
        &self.webhooks
    }

    /// Creates a passthrough client for `connection_id`.
    pub fn proxy(&self, connection_id: impl Into<String>) -> Result<Proxy> {
        Proxy::new(self.client.clone(), connection_id)
    }

    /// Creates the unified API for `connection_id`.
    pub fn unify(&self, connection_id: impl Into<String>) -> Result<Unify> {
        Unify::new(self.client.clone(), connection_id)
    }

    /// Closes the shared connection pool handle. See [`Client::close`].
    pub fn close(&self) {
        self.client.close();
    }

    /// Returns `true` once [`BundleUp::close`] has been called on any clone.
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    /// Returns a guard that closes this client when it goes out of scope,
    /// whether the scope ends normally, returns early or unwinds.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bundleup::{BundleUp, Error, ListParams};
    ///
    /// # async fn example() -> Result<(), Error> {
    /// let bundleup = BundleUp::new("your-api-key")?;
    /// {
    ///     let scoped = bundleup.scope();
    ///     scoped.webhooks().list(&ListParams::new()).await?;
    /// }
    ///
    /// let result = bundleup.webhooks().list(&ListParams::new()).await;
    /// assert!(matches!(result, Err(Error::Closed)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn scope(&self) -> ScopedClient {
        ScopedClient {
            bundleup: self.clone(),
        }
    }
}

/// Closes its [`BundleUp`] client on drop. Derefs to [`BundleUp`].
#[derive(Debug)]
pub struct ScopedClient {
    bundleup: BundleUp,
}

impl Deref for ScopedClient {
    type Target = BundleUp;

    fn deref(&self) -> &Self::Target {
        &self.bundleup
    }
}

impl Drop for ScopedClient {
    fn drop(&mut self) {
        self.bundleup.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::panic::AssertUnwindSafe;

    #[test]
    fn test_new_rejects_empty_api_key() {
        assert!(matches!(BundleUp::new(""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_resource_namespaces() {
        let bundleup = BundleUp::new("test-api-key").unwrap();
        assert_eq!(bundleup.connections().namespace(), "connections");
        assert_eq!(bundleup.integrations().namespace(), "integrations");
        assert_eq!(bundleup.webhooks().namespace(), "webhooks");
    }

    #[test]
    fn test_connection_scoped_clients() {
        let bundleup = BundleUp::new("test-api-key").unwrap();

        assert_eq!(bundleup.proxy("conn_1").unwrap().connection_id(), "conn_1");
        assert_eq!(bundleup.unify("conn_1").unwrap().connection_id(), "conn_1");
        assert!(matches!(bundleup.proxy(""), Err(Error::Validation(_))));
        assert!(matches!(bundleup.unify(""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_scope_closes_on_drop() {
        let bundleup = BundleUp::new("test-api-key").unwrap();
        {
            let scoped = bundleup.scope();
            assert!(!scoped.is_closed());
        }
        assert!(bundleup.is_closed());
    }

    #[test]
    fn test_scope_closes_on_unwind() {
        let bundleup = BundleUp::new("test-api-key").unwrap();
        let scoped_bundleup = bundleup.clone();

        let result = std::panic::catch_unwind(AssertUnwindSafe(move || {
            let _scoped = scoped_bundleup.scope();
            panic!("boom");
        }));

        assert!(result.is_err());
        assert!(bundleup.is_closed());
    }
}
