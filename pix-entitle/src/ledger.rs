use std::collections::HashSet;
use std::sync::Arc;

use pix_docs::{DocError, DocResult, EntitlementDoc, EntitlementDocs};

/// Read-back view over the entitlement collection.
///
/// The webhook reconciler is the sole writer; a purchasing client
/// only observes the grant appearing, so a client that dies between
/// charge and confirmation loses nothing.
pub struct EntitlementLedger {
    docs: Arc<dyn EntitlementDocs>,
}

impl EntitlementLedger {
    pub fn new(docs: Arc<dyn EntitlementDocs>) -> Self {
        Self { docs }
    }

    pub async fn lookup(
        &self,
        user_id: &str,
        asset_id: &str,
    ) -> DocResult<Option<EntitlementDoc>> {
        self.docs.get(user_id, asset_id).await
    }

    pub async fn is_entitled(&self, user_id: &str, asset_id: &str) -> DocResult<bool> {
        Ok(self.lookup(user_id, asset_id).await?.is_some())
    }

    /// The asset ids this user may view in full resolution.
    pub async fn entitled_assets(&self, user_id: &str) -> DocResult<HashSet<String>> {
        Ok(self
            .docs
            .list_for_user(user_id)
            .await?
            .into_iter()
            .map(|d| d.asset_id)
            .collect())
    }

    /// Resolve once the grant for `(user, asset)` exists, waiting on
    /// the live entitlement stream if it does not yet. Callers bound
    /// the wait with their own timeout.
    pub async fn await_grant(
        &self,
        user_id: &str,
        asset_id: &str,
    ) -> DocResult<EntitlementDoc> {
        let mut live = self.docs.watch_user(user_id);

        let found = |docs: &[EntitlementDoc]| {
            docs.iter().find(|d| d.asset_id == asset_id).cloned()
        };

        if let Some(doc) = found(&live.current()) {
            return Ok(doc);
        }
        while let Some(snapshot) = live.changed().await {
            if let Some(doc) = found(&snapshot) {
                return Ok(doc);
            }
        }
        Err(DocError::not_found(format!("{user_id}_{asset_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pix_docs::MemoryEntitlements;

    fn entitlement(user: &str, asset: &str) -> EntitlementDoc {
        EntitlementDoc {
            user_id: user.to_string(),
            asset_id: asset.to_string(),
            payment_reference: format!("pi_{asset}"),
            amount: 100,
            currency: "usd".to_string(),
            purchased_at: 1,
        }
    }

    #[tokio::test]
    async fn entitled_assets_collects_only_this_user() {
        let store = Arc::new(MemoryEntitlements::new());
        store.grant(entitlement("u1", "a")).await.unwrap();
        store.grant(entitlement("u1", "b")).await.unwrap();
        store.grant(entitlement("u2", "c")).await.unwrap();

        let ledger = EntitlementLedger::new(store);
        let mine = ledger.entitled_assets("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.contains("a") && mine.contains("b"));
        assert!(ledger.is_entitled("u1", "a").await.unwrap());
        assert!(!ledger.is_entitled("u1", "c").await.unwrap());
    }

    #[tokio::test]
    async fn await_grant_resolves_when_the_webhook_lands() {
        let store = Arc::new(MemoryEntitlements::new());
        let ledger = EntitlementLedger::new(store.clone());

        let waiter = tokio::spawn({
            let store = store.clone();
            async move {
                EntitlementLedger::new(store)
                    .await_grant("u1", "a")
                    .await
                    .unwrap()
            }
        });

        tokio::task::yield_now().await;
        store.grant(entitlement("u1", "a")).await.unwrap();

        let doc = waiter.await.unwrap();
        assert_eq!(doc.payment_reference, "pi_a");
        // Already-present grants resolve immediately.
        let again = ledger.await_grant("u1", "a").await.unwrap();
        assert_eq!(again.payment_reference, "pi_a");
    }
}
