//! CRUD clients for the `connections`, `integrations` and `webhooks`
//! collections.
//!
//! All three share one implementation, [`Resource`], parameterized by a
//! [`ResourceKind`] that names the collection, its record type and the
//! fields `create` insists on.

use crate::models::{Connection, Integration, Webhook};
use crate::{validate, Client, ListParams, RequestMetadata, Response, Result};
use http::Method;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Describes one REST collection of the BundleUp API.
pub trait ResourceKind {
    /// Collection path segment, e.g. `connections`.
    const NAMESPACE: &'static str;

    /// Keys a `create` payload must contain with a non-null value.
    const REQUIRED_ON_CREATE: &'static [&'static str] = &[];

    /// Verb used by `update`.
    const UPDATE_METHOD: Method = Method::PATCH;

    /// Record type returned by the collection.
    type Record: DeserializeOwned;
}

/// Marker for the `/connections` collection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionKind;

impl ResourceKind for ConnectionKind {
    const NAMESPACE: &'static str = "connections";
    const REQUIRED_ON_CREATE: &'static [&'static str] = &["integration_id"];
    type Record = Connection;
}

/// Marker for the `/integrations` collection.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationKind;

impl ResourceKind for IntegrationKind {
    const NAMESPACE: &'static str = "integrations";
    type Record = Integration;
}

/// Marker for the `/webhooks` collection.
#[derive(Debug, Clone, Copy)]
pub struct WebhookKind;

impl ResourceKind for WebhookKind {
    const NAMESPACE: &'static str = "webhooks";
    const REQUIRED_ON_CREATE: &'static [&'static str] = &["url", "events"];
    type Record = Webhook;
}

/// Client for the `/connections` collection.
pub type Connections = Resource<ConnectionKind>;

/// Client for the `/integrations` collection.
pub type Integrations = Resource<IntegrationKind>;

/// Client for the `/webhooks` collection.
pub type Webhooks = Resource<WebhookKind>;

/// List, create, retrieve, update and delete operations on one collection.
///
/// Ids and payloads are checked locally first; a rejected input fails with
/// [`Error::Validation`](crate::Error::Validation) without touching the
/// network.
///
/// # Examples
///
/// ```no_run
/// use bundleup::{BundleUp, ListParams};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), bundleup::Error> {
/// let bundleup = BundleUp::new("your-api-key")?;
///
/// let active = bundleup
///     .connections()
///     .list(&ListParams::new().filter("status", "active").limit(50))
///     .await?;
/// println!("{} active connections", active.len());
///
/// let created = bundleup
///     .connections()
///     .create(&json!({"name": "My Connection", "integration_id": "int_github"}))
///     .await?;
/// println!("Created {:?}", created.id);
/// # Ok(())
/// # }
/// ```
pub struct Resource<K: ResourceKind> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> Resource<K> {
    pub(crate) fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// The collection path segment, e.g. `connections`.
    pub fn namespace(&self) -> &'static str {
        K::NAMESPACE
    }

    /// Lists records, forwarding `params` as query parameters.
    pub async fn list(&self, params: &ListParams) -> Result<Vec<K::Record>> {
        self.client
            .get_with_query(collection_path::<K>(), &params.to_query())
            .await
            .map(Response::into_data)
    }

    /// Fetches one record by id.
    pub async fn retrieve(&self, id: &str) -> Result<K::Record> {
        let path = item_path::<K>(id)?;
        self.client.get(path).await.map(Response::into_data)
    }

    /// Creates a record.
    ///
    /// `payload` must serialize to a JSON object carrying every key in
    /// [`ResourceKind::REQUIRED_ON_CREATE`]; it is sent unchanged.
    pub async fn create<P>(&self, payload: &P) -> Result<K::Record>
    where
        P: Serialize + ?Sized,
    {
        let object = validate::json_object(payload, "payload")?;
        validate::required_keys(&object, K::REQUIRED_ON_CREATE, "payload")?;

        self.client
            .post(collection_path::<K>(), &object)
            .await
            .map(Response::into_data)
    }

    /// Updates a record with the fields in `payload`.
    pub async fn update<P>(&self, id: &str, payload: &P) -> Result<K::Record>
    where
        P: Serialize + ?Sized,
    {
        let path = item_path::<K>(id)?;
        let object = validate::json_object(payload, "payload")?;

        let metadata = RequestMetadata::new(K::UPDATE_METHOD, path);
        self.client
            .request(metadata, Some(&object))
            .await
            .map(Response::into_data)
    }

    /// Deletes a record. Any 2xx status counts as success; the body is ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = item_path::<K>(id)?;
        self.client.delete::<IgnoredAny>(path).await?;
        Ok(())
    }
}

impl<K: ResourceKind> Clone for Resource<K> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<K: ResourceKind> fmt::Debug for Resource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("namespace", &K::NAMESPACE)
            .finish()
    }
}

fn collection_path<K: ResourceKind>() -> String {
    format!("/{}", K::NAMESPACE)
}

fn item_path<K: ResourceKind>(id: &str) -> Result<String> {
    let id = validate::path_segment(id, "id")?;
    Ok(format!("/{}/{}", K::NAMESPACE, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_paths() {
        assert_eq!(collection_path::<ConnectionKind>(), "/connections");
        assert_eq!(
            item_path::<WebhookKind>("wh_1").unwrap(),
            "/webhooks/wh_1"
        );
        assert_eq!(
            item_path::<ConnectionKind>("../webhooks/wh_1").unwrap(),
            "/connections/..%2Fwebhooks%2Fwh_1"
        );
        assert!(matches!(
            item_path::<IntegrationKind>(""),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            item_path::<IntegrationKind>(".."),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_required_fields() {
        assert_eq!(ConnectionKind::REQUIRED_ON_CREATE, &["integration_id"]);
        assert!(IntegrationKind::REQUIRED_ON_CREATE.is_empty());
        assert_eq!(WebhookKind::REQUIRED_ON_CREATE, &["url", "events"]);
        assert_eq!(ConnectionKind::UPDATE_METHOD, Method::PATCH);
    }
}
