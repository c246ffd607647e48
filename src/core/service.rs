//! Service trait for collection backends

use crate::core::error::ViewError;
use crate::core::query::QueryParams;
use crate::core::record::Item;
use async_trait::async_trait;
use serde_json::Value;

/// One page of a collection as returned by a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub items: Vec<Item>,

    /// Total number of items matching the query across all pages
    pub total_count: usize,

    /// Number of pages the backend reports, when it reports one
    pub page_count: Option<usize>,
}

impl FetchedPage {
    /// A page holding the whole collection
    pub fn complete(items: Vec<Item>) -> Self {
        let total_count = items.len();
        Self {
            items,
            total_count,
            page_count: None,
        }
    }
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The backend returned the created or updated item
    Item(Item),
    /// The backend returned an action result that is not an item
    Value(Value),
    /// The backend only acknowledged success
    Done,
}

impl MutationOutcome {
    pub fn item(&self) -> Option<&Item> {
        match self {
            MutationOutcome::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// Service trait for a collection endpoint family
///
/// Implementations talk to one resource (`/api/<resource>`). The engine is
/// agnostic to how they do it: the REST client speaks HTTP, the in-memory
/// service keeps a vector.
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// Name of the resource served (e.g. "invoices")
    fn resource(&self) -> &str;

    /// Fetch one page of the collection
    async fn fetch(&self, params: &QueryParams) -> Result<FetchedPage, ViewError>;

    /// Create a new item
    async fn create(&self, body: Value) -> Result<MutationOutcome, ViewError>;

    /// Apply a partial update to an item
    async fn update(&self, id: &str, patch: Value) -> Result<MutationOutcome, ViewError>;

    /// Delete an item
    async fn delete(&self, id: &str) -> Result<MutationOutcome, ViewError>;

    /// Run a domain action on an item (`POST /<resource>/<id>/<action>`)
    async fn action(
        &self,
        id: &str,
        action: &str,
        body: Option<Value>,
    ) -> Result<MutationOutcome, ViewError>;
}
