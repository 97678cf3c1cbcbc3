use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DocResult, LiveQuery};

/// One uploaded image.
///
/// `derived_path` and `derived_url` are set together, exactly once, by
/// the transform pipeline; the uploading client never writes them.
/// `original_path` is `None` only for externally-hosted placeholder
/// assets, which the pipeline never touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDoc {
    pub id: String,
    pub owner_id: String,
    pub owner_label: String,
    pub original_path: Option<String>,
    pub derived_path: Option<String>,
    pub original_url: String,
    pub derived_url: Option<String>,
    /// Monotonic server timestamp (microseconds), assigned on create.
    pub created_at: i64,
    pub processed: bool,
}

impl AssetDoc {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        owner_label: impl Into<String>,
        original_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            owner_label: owner_label.into(),
            original_path: None,
            derived_path: None,
            original_url: original_url.into(),
            derived_url: None,
            created_at: 0,
            processed: false,
        }
    }

    pub fn with_original_path(mut self, path: impl Into<String>) -> Self {
        self.original_path = Some(path.into());
        self
    }
}

/// The two derivative references, applied in a single write.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRefs {
    pub derived_path: String,
    pub derived_url: String,
}

/// Which slice of the collection a query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetScope {
    All,
    Owner(String),
}

impl AssetScope {
    pub fn matches(&self, doc: &AssetDoc) -> bool {
        match self {
            AssetScope::All => true,
            AssetScope::Owner(owner) => &doc.owner_id == owner,
        }
    }
}

/// The `assets` collection.
#[async_trait]
pub trait AssetDocs: Send + Sync {
    /// Insert a new document; the store assigns `created_at`.
    async fn create(&self, doc: AssetDoc) -> DocResult<AssetDoc>;

    async fn get(&self, id: &str) -> DocResult<Option<AssetDoc>>;

    /// Field-equality query on `original_path`.
    async fn find_by_original_path(&self, path: &str) -> DocResult<Vec<AssetDoc>>;

    /// All documents in scope, ordered by `created_at` descending.
    async fn list(&self, scope: &AssetScope) -> DocResult<Vec<AssetDoc>>;

    /// Single-write reconciliation: sets `derived_path`,
    /// `derived_url` and `processed = true` on one document.
    async fn apply_derivative(&self, id: &str, refs: DerivedRefs) -> DocResult<AssetDoc>;

    /// Live query over the scoped, ordered collection. The returned
    /// handle owns the subscription; dropping or cancelling it
    /// releases the live-query resource.
    fn watch(&self, scope: AssetScope) -> LiveQuery<AssetDoc>;
}
