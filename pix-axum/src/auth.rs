//! Bearer-token identity resolution.
//!
//! Token verification itself belongs to an external identity
//! provider; the boundary here is the `TokenVerifier` trait. The
//! static implementation backs local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use pix_core::{GateError, Identity};

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolve a bearer token into a verified identity.
    async fn verify(&self, token: &str) -> Result<Identity, GateError>;
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Fixed token table, for local runs and tests.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parse a `token:uid[,token:uid...]` table, the format the
    /// binary accepts from configuration.
    pub fn from_table(table: &str) -> Self {
        let mut verifier = Self::new();
        for pair in table.split(',') {
            if let Some((token, uid)) = pair.trim().split_once(':') {
                if !token.is_empty() && !uid.is_empty() {
                    verifier.tokens.insert(token.to_string(), Identity::new(uid));
                }
            }
        }
        verifier
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, GateError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| GateError::invalid_token("unknown bearer token"))
    }
}
