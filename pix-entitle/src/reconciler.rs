use std::sync::Arc;

use tracing::{info, warn};

use pix_core::GateError;
use pix_docs::{EntitlementDoc, EntitlementDocs};
use pix_pay::{EventKind, WebhookEvent, WebhookVerifier};

/// What a delivery amounted to. Everything except a bad signature or
/// a store failure is acknowledged so the processor stops
/// redelivering.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// A verified successful payment became an entitlement.
    Granted(EntitlementDoc),
    /// Recognized event, observed and logged, nothing to write.
    Observed(EventKind),
    /// Unrecognized kind, or a success event without the correlating
    /// metadata needed to key an entitlement.
    Ignored(EventKind),
}

/// Verifies webhook deliveries and is the sole writer of
/// entitlements: the correlating `{uid, assetId}` pair travels in the
/// intent metadata and comes back inside the verified event, so the
/// grant does not depend on the purchasing client surviving its
/// checkout flow.
pub struct WebhookReconciler {
    verifier: WebhookVerifier,
    entitlements: Arc<dyn EntitlementDocs>,
}

impl WebhookReconciler {
    pub fn new(verifier: WebhookVerifier, entitlements: Arc<dyn EntitlementDocs>) -> Self {
        Self {
            verifier,
            entitlements,
        }
    }

    /// Handle one delivery: raw body plus signature header.
    ///
    /// Signature verification comes first and is the endpoint's only
    /// authentication; a failure produces a client error and zero
    /// side effects.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<ReconcileOutcome, GateError> {
        let event = self
            .verifier
            .verify(payload, signature)
            .map_err(|e| GateError::bad_signature(e.to_string()))?;
        self.dispatch(event).await
    }

    /// As `handle`, with an explicit clock for deterministic tests.
    pub async fn handle_at(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<ReconcileOutcome, GateError> {
        let event = self
            .verifier
            .verify_at(payload, signature, now)
            .map_err(|e| GateError::bad_signature(e.to_string()))?;
        self.dispatch(event).await
    }

    async fn dispatch(&self, event: WebhookEvent) -> Result<ReconcileOutcome, GateError> {
        match event.kind {
            EventKind::PaymentIntentSucceeded => {
                let meta = &event.object.metadata;
                if !meta.is_correlated() {
                    warn!(
                        event = %event.id,
                        intent = %event.object.id,
                        "success event without correlating metadata, no grant"
                    );
                    return Ok(ReconcileOutcome::Ignored(event.kind));
                }

                let doc = EntitlementDoc {
                    user_id: meta.uid.clone(),
                    asset_id: meta.image_id.clone(),
                    payment_reference: event.object.id.clone(),
                    amount: event.object.amount,
                    currency: event.object.currency.clone(),
                    purchased_at: chrono::Utc::now().timestamp_micros(),
                };

                // A store failure here must NOT be acknowledged: the
                // processor will redeliver and the grant is idempotent.
                let stored = self.entitlements.grant(doc).await.map_err(|e| {
                    GateError::internal(format!("entitlement write failed: {e}"))
                })?;

                info!(
                    user = %stored.user_id,
                    asset = %stored.asset_id,
                    reference = %stored.payment_reference,
                    "entitlement granted"
                );
                Ok(ReconcileOutcome::Granted(stored))
            }
            EventKind::PaymentIntentFailed => {
                warn!(event = %event.id, intent = %event.object.id, "payment failed");
                Ok(ReconcileOutcome::Observed(event.kind))
            }
            EventKind::ChargeSucceeded => {
                info!(event = %event.id, charge = %event.object.id, "charge succeeded");
                Ok(ReconcileOutcome::Observed(event.kind))
            }
            EventKind::Other(_) => {
                info!(event = %event.id, kind = event.kind.as_str(), "unhandled event kind");
                Ok(ReconcileOutcome::Ignored(event.kind))
            }
        }
    }
}
