//! # pix-entitle: the entitlement service
//!
//! Two stateless halves plus a read-back view:
//! - `IntentIssuer` authenticates a caller, walks the amount
//!   validation ladder, and asks the payment processor for a
//!   client-usable secret.
//! - `WebhookReconciler` verifies signed deliveries and is the sole
//!   writer of entitlement documents.
//! - `EntitlementLedger` is what everything else uses to observe
//!   grants.

mod issuer;
mod ledger;
mod reconciler;

pub use issuer::{AmountLimits, IntentIssuer, IssueRequest, IssuedIntent};
pub use ledger::EntitlementLedger;
pub use reconciler::{ReconcileOutcome, WebhookReconciler};
