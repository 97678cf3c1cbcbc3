use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{DocResult, LiveQuery};

/// Proof that a user purchased full-resolution access to one asset.
///
/// Keyed by `(user_id, asset_id)`; at most one document per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementDoc {
    pub user_id: String,
    pub asset_id: String,
    pub payment_reference: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub purchased_at: i64,
}

impl EntitlementDoc {
    /// Composite document key, `<uid>_<assetId>`.
    pub fn key(&self) -> String {
        composite_key(&self.user_id, &self.asset_id)
    }
}

pub fn composite_key(user_id: &str, asset_id: &str) -> String {
    format!("{user_id}_{asset_id}")
}

/// The `entitlements` collection.
#[async_trait]
pub trait EntitlementDocs: Send + Sync {
    /// Idempotent keyed set: the first grant for a key wins, later
    /// grants for the same key return the stored document unchanged.
    async fn grant(&self, doc: EntitlementDoc) -> DocResult<EntitlementDoc>;

    async fn get(&self, user_id: &str, asset_id: &str) -> DocResult<Option<EntitlementDoc>>;

    async fn list_for_user(&self, user_id: &str) -> DocResult<Vec<EntitlementDoc>>;

    /// Live query over one user's entitlements.
    fn watch_user(&self, user_id: &str) -> LiveQuery<EntitlementDoc>;
}
