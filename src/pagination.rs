//! Cursor pagination parameters and the paged response envelope.

use crate::metadata::{QueryParams, QueryValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters accepted by list and unify endpoints.
///
/// `limit`, `after` and `include_raw` are the common pagination knobs;
/// anything else (such as a `status` filter) goes into `filters`.
///
/// # Examples
///
/// ```
/// use bundleup::ListParams;
///
/// let params = ListParams::new().limit(50).filter("status", "active");
/// let query = params.to_query();
///
/// assert_eq!(query.get("limit"), Some("50"));
/// assert_eq!(query.get("status"), Some("active"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    /// Maximum number of items per page.
    pub limit: Option<u32>,
    /// Cursor returned as `next_cursor` by the previous page.
    pub after: Option<String>,
    /// Ask unify endpoints to include the provider's unprocessed payload.
    pub include_raw: Option<bool>,
    /// Resource specific filters.
    pub filters: QueryParams,
}

impl ListParams {
    /// Empty parameters: server defaults for page size and cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continues after the given cursor.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    /// Requests the provider's raw payload in [`Page::raw`].
    pub fn include_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = Some(include_raw);
        self
    }

    /// Adds a resource specific filter such as `status=active`.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.filters.insert(key, value);
        self
    }

    /// Serializes the parameters. Filters come first, then `limit`, `after`
    /// and `include_raw`; unset values are omitted.
    pub fn to_query(&self) -> QueryParams {
        let mut query = self.filters.clone();
        query.insert_opt("limit", self.limit);
        query.insert_opt("after", self.after.as_deref());
        query.insert_opt("include_raw", self.include_raw);
        query
    }
}

/// A page of results from a unify endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Value> {
    /// The normalized items.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    /// The provider's unprocessed items, when `include_raw` was requested.
    #[serde(rename = "_raw", default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Vec<Value>>,

    /// Cursor information for fetching the next page.
    #[serde(default)]
    pub metadata: PageMetadata,
}

/// Pagination state returned alongside a [`Page`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Returns `true` if the server reported more items after this page.
    pub fn has_more(&self) -> bool {
        self.metadata.has_more && self.metadata.next_cursor.is_some()
    }

    /// Builds the parameters for the following page from the ones used to
    /// fetch this one, or `None` if this was the last page.
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
    /// let mut params = ListParams::new().limit(100);
    /// loop {
    ///     let page = unify.pm().issues(&params).await?;
    ///     println!("{} issues", page.data.len());
    ///     match page.next_params(&params) {
    ///         Some(next) => params = next,
    ///         None => break,
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn next_params(&self, current: &ListParams) -> Option<ListParams> {
        if !self.metadata.has_more {
            return None;
        }
        let cursor = self.metadata.next_cursor.as_ref()?;
        Some(ListParams {
            after: Some(cursor.clone()),
            ..current.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_query_omits_unset_values() {
        let query = ListParams::new().to_query();
        assert!(query.is_empty());

        let query = ListParams::new().limit(10).include_raw(false).to_query();
        let pairs: Vec<_> = query.iter().collect();
        assert_eq!(pairs, vec![("limit", "10"), ("include_raw", "false")]);
    }

    #[test]
    fn test_to_query_with_filters_and_cursor() {
        let query = ListParams::new()
            .filter("status", "active")
            .limit(50)
            .after("cursor_1")
            .to_query();

        assert_eq!(query.get("status"), Some("active"));
        assert_eq!(query.get("limit"), Some("50"));
        assert_eq!(query.get("after"), Some("cursor_1"));
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_page_deserializes_raw_and_metadata() {
        let page: Page = serde_json::from_value(json!({
            "data": [{"id": "1", "name": "general"}],
            "_raw": [{"original": "data"}],
            "metadata": {"has_more": true, "next_cursor": "cursor123"}
        }))
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.raw, Some(vec![json!({"original": "data"})]));
        assert!(page.has_more());
    }

    #[test]
    fn test_page_tolerates_missing_fields() {
        let page: Page = serde_json::from_value(json!({"data": []})).unwrap();
        assert_eq!(page.raw, None);
        assert_eq!(page.metadata, PageMetadata::default());

        let page: Page = serde_json::from_value(json!({})).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_next_params() {
        let current = ListParams::new().limit(25).include_raw(true);

        let page: Page = serde_json::from_value(json!({
            "data": [],
            "metadata": {"has_more": true, "next_cursor": "c2"}
        }))
        .unwrap();
        let next = page.next_params(&current).unwrap();
        assert_eq!(next.after.as_deref(), Some("c2"));
        assert_eq!(next.limit, Some(25));
        assert_eq!(next.include_raw, Some(true));

        let last: Page = serde_json::from_value(json!({
            "data": [],
            "metadata": {"has_more": false, "next_cursor": null}
        }))
        .unwrap();
        assert_eq!(last.next_params(&current), None);
    }
}
