use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::entitlement::composite_key;
use crate::{
    AssetDoc, AssetDocs, AssetScope, DerivedRefs, DocError, DocResult, EntitlementDoc,
    EntitlementDocs, LiveQuery,
};
use crate::live::Publisher;

fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Strictly increasing server clock shared by a collection, so two
/// documents created in the same microsecond still order stably.
struct MonotonicClock(AtomicI64);

impl MonotonicClock {
    fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    fn next(&self) -> i64 {
        let now = now_micros();
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .map(|prev| now.max(prev + 1))
            .unwrap_or(now)
    }
}

fn sorted_desc(mut docs: Vec<AssetDoc>) -> Vec<AssetDoc> {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    docs
}

/// In-memory `assets` collection with live queries.
pub struct MemoryAssets {
    docs: RwLock<HashMap<String, AssetDoc>>,
    clock: MonotonicClock,
    publisher: Mutex<Publisher<AssetScope, AssetDoc>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            clock: MonotonicClock::new(),
            publisher: Mutex::new(Publisher::new()),
        }
    }

    fn snapshot(&self, scope: &AssetScope) -> Vec<AssetDoc> {
        let docs = self.docs.read().unwrap();
        sorted_desc(
            docs.values()
                .filter(|d| scope.matches(d))
                .cloned()
                .collect(),
        )
    }

    fn notify(&self) {
        let mut publisher = self.publisher.lock().unwrap();
        publisher.publish(|scope| self.snapshot(scope));
    }
}

impl Default for MemoryAssets {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetDocs for MemoryAssets {
    async fn create(&self, mut doc: AssetDoc) -> DocResult<AssetDoc> {
        doc.created_at = self.clock.next();
        self.docs
            .write()
            .unwrap()
            .insert(doc.id.clone(), doc.clone());
        self.notify();
        Ok(doc)
    }

    async fn get(&self, id: &str) -> DocResult<Option<AssetDoc>> {
        Ok(self.docs.read().unwrap().get(id).cloned())
    }

    async fn find_by_original_path(&self, path: &str) -> DocResult<Vec<AssetDoc>> {
        let docs = self.docs.read().unwrap();
        Ok(sorted_desc(
            docs.values()
                .filter(|d| d.original_path.as_deref() == Some(path))
                .cloned()
                .collect(),
        ))
    }

    async fn list(&self, scope: &AssetScope) -> DocResult<Vec<AssetDoc>> {
        Ok(self.snapshot(scope))
    }

    async fn apply_derivative(&self, id: &str, refs: DerivedRefs) -> DocResult<AssetDoc> {
        let updated = {
            let mut docs = self.docs.write().unwrap();
            let doc = docs.get_mut(id).ok_or_else(|| DocError::not_found(id))?;
            doc.derived_path = Some(refs.derived_path);
            doc.derived_url = Some(refs.derived_url);
            doc.processed = true;
            doc.clone()
        };
        self.notify();
        Ok(updated)
    }

    fn watch(&self, scope: AssetScope) -> LiveQuery<AssetDoc> {
        let initial = self.snapshot(&scope);
        self.publisher.lock().unwrap().subscribe(scope, initial)
    }
}

/// In-memory `entitlements` collection with live queries.
pub struct MemoryEntitlements {
    docs: RwLock<HashMap<String, EntitlementDoc>>,
    publisher: Mutex<Publisher<String, EntitlementDoc>>,
}

impl MemoryEntitlements {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            publisher: Mutex::new(Publisher::new()),
        }
    }

    fn snapshot(&self, user_id: &str) -> Vec<EntitlementDoc> {
        let docs = self.docs.read().unwrap();
        let mut list: Vec<EntitlementDoc> = docs
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at).then(a.key().cmp(&b.key())));
        list
    }

    fn notify(&self) {
        let mut publisher = self.publisher.lock().unwrap();
        publisher.publish(|user_id| self.snapshot(user_id));
    }
}

impl Default for MemoryEntitlements {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntitlementDocs for MemoryEntitlements {
    async fn grant(&self, doc: EntitlementDoc) -> DocResult<EntitlementDoc> {
        let key = doc.key();
        let stored = {
            let mut docs = self.docs.write().unwrap();
            match docs.get(&key) {
                Some(existing) => {
                    debug!(key, "entitlement already granted, keeping original");
                    existing.clone()
                }
                None => {
                    docs.insert(key.clone(), doc.clone());
                    doc
                }
            }
        };
        self.notify();
        Ok(stored)
    }

    async fn get(&self, user_id: &str, asset_id: &str) -> DocResult<Option<EntitlementDoc>> {
        let key = composite_key(user_id, asset_id);
        Ok(self.docs.read().unwrap().get(&key).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> DocResult<Vec<EntitlementDoc>> {
        Ok(self.snapshot(user_id))
    }

    fn watch_user(&self, user_id: &str) -> LiveQuery<EntitlementDoc> {
        let initial = self.snapshot(user_id);
        self.publisher
            .lock()
            .unwrap()
            .subscribe(user_id.to_string(), initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, owner: &str, path: &str) -> AssetDoc {
        AssetDoc::new(id, owner, "Owner", format!("https://cdn.test/{path}"))
            .with_original_path(path)
    }

    fn entitlement(user: &str, asset: &str, reference: &str) -> EntitlementDoc {
        EntitlementDoc {
            user_id: user.to_string(),
            asset_id: asset.to_string(),
            payment_reference: reference.to_string(),
            amount: 100,
            currency: "usd".to_string(),
            purchased_at: now_micros(),
        }
    }

    #[tokio::test]
    async fn create_assigns_strictly_increasing_timestamps() {
        let store = MemoryAssets::new();
        let a = store.create(asset("a", "u1", "original/a/a.jpg")).await.unwrap();
        let b = store.create(asset("b", "u1", "original/b/b.jpg")).await.unwrap();
        assert!(b.created_at > a.created_at);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_respects_scope() {
        let store = MemoryAssets::new();
        store.create(asset("a", "u1", "original/a/a.jpg")).await.unwrap();
        store.create(asset("b", "u2", "original/b/b.jpg")).await.unwrap();
        store.create(asset("c", "u1", "original/c/c.jpg")).await.unwrap();

        let all = store.list(&AssetScope::All).await.unwrap();
        assert_eq!(
            all.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );

        let mine = store
            .list(&AssetScope::Owner("u1".to_string()))
            .await
            .unwrap();
        assert_eq!(
            mine.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["c", "a"]
        );
    }

    #[tokio::test]
    async fn apply_derivative_is_one_write() {
        let store = MemoryAssets::new();
        store.create(asset("a", "u1", "original/a/a.jpg")).await.unwrap();

        let updated = store
            .apply_derivative(
                "a",
                DerivedRefs {
                    derived_path: "derived/a/preview_a.jpg".to_string(),
                    derived_url: "https://cdn.test/derived/a/preview_a.jpg".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(updated.processed);
        assert_eq!(updated.derived_path.as_deref(), Some("derived/a/preview_a.jpg"));
        assert!(updated.derived_url.is_some());
    }

    #[tokio::test]
    async fn watch_delivers_snapshots_on_change() {
        let store = MemoryAssets::new();
        let mut live = store.watch(AssetScope::All);
        assert!(live.current().is_empty());

        store.create(asset("a", "u1", "original/a/a.jpg")).await.unwrap();
        let snapshot = live.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "a");
    }

    #[tokio::test]
    async fn dropped_watchers_are_pruned() {
        let store = MemoryAssets::new();
        let live = store.watch(AssetScope::All);
        drop(live);
        store.create(asset("a", "u1", "original/a/a.jpg")).await.unwrap();
        assert_eq!(store.publisher.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn grant_is_idempotent_first_write_wins() {
        let store = MemoryEntitlements::new();
        let first = store.grant(entitlement("u1", "a", "pi_1")).await.unwrap();
        let second = store.grant(entitlement("u1", "a", "pi_1")).await.unwrap();

        assert_eq!(first.payment_reference, "pi_1");
        assert_eq!(second.payment_reference, "pi_1");
        assert_eq!(store.list_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn watch_user_sees_only_that_users_grants() {
        let store = MemoryEntitlements::new();
        let mut live = store.watch_user("u1");

        store.grant(entitlement("u2", "a", "pi_other")).await.unwrap();
        store.grant(entitlement("u1", "b", "pi_mine")).await.unwrap();

        // Two publishes happened; the final snapshot is what matters.
        let mut snapshot = live.changed().await.unwrap();
        if snapshot.is_empty() {
            snapshot = live.changed().await.unwrap();
        }
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].asset_id, "b");
    }
}
