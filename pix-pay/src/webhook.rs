//! Webhook authenticity and event decoding.
//!
//! Signature verification is the endpoint's only authentication: the
//! header carries a timestamp and one or more HMAC-SHA256 digests of
//! `"{t}.{raw body}"` under a shared secret
//! (`t=<unix>,v1=<hex>[,v1=<hex>...]`). Verification must happen on
//! the raw bytes before any JSON parsing.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::IntentMetadata;

type HmacSha256 = Hmac<Sha256>;

/// Default acceptance window for the signed timestamp, seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,

    #[error("no candidate digest matched the payload")]
    NoMatch,

    #[error("signed timestamp outside tolerance ({age_secs}s old)")]
    Expired { age_secs: i64 },

    #[error("unparsable event payload: {0}")]
    BadPayload(String),
}

/// The event kinds the reconciler dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    ChargeSucceeded,
    Other(String),
}

impl EventKind {
    fn from_wire(kind: &str) -> Self {
        match kind {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            "charge.succeeded" => Self::ChargeSucceeded,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::ChargeSucceeded => "charge.succeeded",
            Self::Other(s) => s,
        }
    }
}

/// The payment object inside an event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentObject {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: IntentMetadata,
}

/// A verified, decoded webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub kind: EventKind,
    pub object: PaymentObject,
}

#[derive(Deserialize)]
struct WireEvent {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: WireData,
}

#[derive(Deserialize)]
struct WireData {
    object: PaymentObject,
}

/// Verifies webhook signatures against a shared secret.
///
/// Construct once at startup and share by reference; the verifier is
/// immutable.
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, secs: i64) -> Self {
        self.tolerance_secs = secs;
        self
    }

    /// Verify `header` against `payload` and decode the event.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<WebhookEvent, SignatureError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// As `verify`, with an explicit clock for deterministic tests.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<WebhookEvent, SignatureError> {
        let (timestamp, candidates) = parse_header(header)?;

        let age = now - timestamp;
        if age.abs() > self.tolerance_secs {
            return Err(SignatureError::Expired { age_secs: age });
        }

        let matched = candidates.iter().any(|candidate| {
            let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                .expect("hmac accepts any key length");
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(candidate).is_ok()
        });
        if !matched {
            return Err(SignatureError::NoMatch);
        }

        let wire: WireEvent = serde_json::from_slice(payload)
            .map_err(|e| SignatureError::BadPayload(e.to_string()))?;
        Ok(WebhookEvent {
            id: wire.id,
            kind: EventKind::from_wire(&wire.kind),
            object: wire.data.object,
        })
    }
}

fn parse_header(header: &str) -> Result<(i64, Vec<Vec<u8>>), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for item in header.split(',') {
        let (k, v) = item
            .trim()
            .split_once('=')
            .ok_or(SignatureError::MalformedHeader)?;
        match k {
            "t" => {
                timestamp =
                    Some(v.parse::<i64>().map_err(|_| SignatureError::MalformedHeader)?);
            }
            "v1" => {
                candidates
                    .push(hex::decode(v).map_err(|_| SignatureError::MalformedHeader)?);
            }
            // Unknown schemes are skipped, same as future-proof
            // processor SDKs do.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    Ok((timestamp, candidates))
}

/// Compute a valid signature header for `payload` at `timestamp`.
/// Used by local tooling and tests to fabricate deliveries.
pub fn signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    format!("t={timestamp},v1={}", hex::encode(digest))
}
