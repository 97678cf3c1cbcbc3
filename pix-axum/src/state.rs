use std::sync::Arc;

use pix_docs::{AssetDocs, EntitlementDocs};
use pix_entitle::{EntitlementLedger, IntentIssuer, WebhookReconciler};

use crate::auth::TokenVerifier;

/// Shared handler state. Everything inside is immutable after
/// startup and shared by `Arc`, so cloning is cheap and handlers
/// stay stateless per call.
pub struct AppState {
    pub issuer: Arc<IntentIssuer>,
    pub reconciler: Arc<WebhookReconciler>,
    pub ledger: Arc<EntitlementLedger>,
    pub assets: Arc<dyn AssetDocs>,
    pub entitlements: Arc<dyn EntitlementDocs>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            issuer: Arc::clone(&self.issuer),
            reconciler: Arc::clone(&self.reconciler),
            ledger: Arc::clone(&self.ledger),
            assets: Arc::clone(&self.assets),
            entitlements: Arc::clone(&self.entitlements),
            verifier: Arc::clone(&self.verifier),
        }
    }
}
