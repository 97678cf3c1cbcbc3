//! # Errors
//!
//! Pixgate uses a small set of structured errors with stable,
//! client-facing codes. Core goals:
//! - consistent status codes + kebab-case error codes
//! - can be carried through anyhow::Error (handlers stay `?`-friendly)
//! - transport-agnostic (the HTTP crate decides how to serialize)
//!
//! Anything a client sees is one of the enumerable codes below (or a
//! code supplied by the payment processor); raw internal messages only
//! ever reach the logs.

use std::fmt;

use anyhow::Error as AnyError;

/// A convenience result type for Pixgate core APIs.
pub type GateResult<T> = std::result::Result<T, AnyError>;

/// The enumerable failure classes of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,      // 400
    InvalidAmount,   // 400
    AmountTooSmall,  // 400
    BadSignature,    // 400
    Unauthenticated, // 401
    InvalidToken,    // 401
    AmountTooLarge,  // 403
    NotFound,        // 404
    Internal,        // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::InvalidAmount => 400,
            ErrorKind::AmountTooSmall => 400,
            ErrorKind::BadSignature => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::InvalidToken => 401,
            ErrorKind::AmountTooLarge => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }

    /// Stable client-facing code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::InvalidAmount => "invalid-amount",
            ErrorKind::AmountTooSmall => "amount-too-small",
            ErrorKind::BadSignature => "bad-signature",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::InvalidToken => "invalid-token",
            ErrorKind::AmountTooLarge => "amount-too-large",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// A structured Pixgate error that can live inside `anyhow::Error`.
///
/// - `kind` fixes the status code and the default client code
/// - `code_override` lets an upstream system (the payment processor)
///   supply its own stable code while keeping `kind`'s status
/// - `data` is merged into the client payload (e.g. the minimum for
///   an `amount-too-small` rejection)
/// - `source` never reaches a client
#[derive(Debug)]
pub struct GateError {
    pub kind: ErrorKind,
    pub message: String,
    pub code_override: Option<String>,
    pub data: Option<serde_json::Value>,
    pub source: Option<AnyError>,
}

impl GateError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code_override: None,
            data: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code_override = Some(code.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    /// The code a client will see: the override if an upstream system
    /// supplied one, the kind's code otherwise.
    pub fn code(&self) -> &str {
        self.code_override
            .as_deref()
            .unwrap_or_else(|| self.kind.code())
    }

    /// Convert into `anyhow::Error` so it flows through `?` chains.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` back to a `GateError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&GateError> {
        err.chain().find_map(|e| e.downcast_ref::<GateError>())
    }

    /// Turn any error into a GateError:
    /// - if it's already a GateError, keep it (lossless)
    /// - otherwise wrap as Internal
    pub fn normalize(err: AnyError) -> GateError {
        match err.downcast::<GateError>() {
            Ok(gate) => gate,
            Err(other) => {
                GateError::new(ErrorKind::Internal, other.to_string()).with_source(other)
            }
        }
    }

    /// Client payload: `{"error": <code>}` plus any `data` fields,
    /// never the message or the source.
    pub fn to_client_json(&self) -> serde_json::Value {
        let mut base = serde_json::Map::new();
        base.insert(
            "error".to_string(),
            serde_json::Value::String(self.code().to_string()),
        );
        if let Some(serde_json::Value::Object(extra)) = &self.data {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::Value::Object(base)
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidAmount, msg)
    }
    pub fn amount_too_small(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmountTooSmall, msg)
    }
    pub fn bad_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadSignature, msg)
    }
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, msg)
    }
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, msg)
    }
    pub fn amount_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmountTooLarge, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg)
    }

    /// An upstream failure surfaced under the upstream's own stable
    /// code (falling back to `internal` is the caller's concern).
    pub fn upstream(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg).with_code(code)
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code(), self.status_code(), self.message)
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(GateError::invalid_amount("x").code(), "invalid-amount");
        assert_eq!(GateError::amount_too_large("x").status_code(), 403);
        assert_eq!(GateError::unauthenticated("x").status_code(), 401);
    }

    #[test]
    fn upstream_code_wins_over_kind() {
        let err = GateError::upstream("card-declined", "processor said no");
        assert_eq!(err.code(), "card-declined");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn client_json_merges_data_but_never_message() {
        let err = GateError::amount_too_small("below minimum")
            .with_data(serde_json::json!({"min": 50, "currency": "usd"}));
        let payload = err.to_client_json();
        assert_eq!(payload["error"], "amount-too-small");
        assert_eq!(payload["min"], 50);
        assert!(payload.get("message").is_none());
    }

    #[test]
    fn survives_an_anyhow_round_trip() {
        let any = GateError::invalid_token("expired").into_anyhow();
        let back = GateError::from_anyhow(&any).expect("downcast");
        assert_eq!(back.code(), "invalid-token");
    }
}
