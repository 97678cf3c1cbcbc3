//! # pix-pay: payment processor boundary for Pixgate
//!
//! The processor is an external collaborator: this crate holds the
//! `PaymentProcessor` trait, a REST-backed client, the webhook
//! signature verifier plus typed events, and an in-memory processor
//! for tests. Nothing here persists anything locally - a payment
//! intent lives processor-side and the core only ever holds its
//! opaque client secret.

mod error;
mod processor;
mod rest_client;
pub mod testing;
pub mod webhook;

pub use error::{PayError, PayResult};
pub use processor::{CreatedIntent, IntentMetadata, IntentRequest, PaymentProcessor};
pub use rest_client::RestProcessor;
pub use webhook::{
    signature_header, EventKind, PaymentObject, SignatureError, WebhookEvent, WebhookVerifier,
    DEFAULT_TOLERANCE_SECS,
};
