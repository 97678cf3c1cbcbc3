use std::sync::Arc;

use serde_json::json;
use tracing::error;

use pix_core::{GateError, Identity};
use pix_pay::{IntentMetadata, IntentRequest, PaymentProcessor};

/// Chargeable bounds, minor currency units. One fixed currency per
/// deployment.
#[derive(Debug, Clone)]
pub struct AmountLimits {
    pub currency: String,
    pub min: i64,
    pub max: i64,
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            min: 50,
            max: 1_000_000,
        }
    }
}

/// What a caller asks for. `amount` stays a raw JSON value so the
/// validation ladder - not the deserializer - decides what a valid
/// amount is and answers with the documented code.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub amount: serde_json::Value,
    pub asset_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct IssuedIntent {
    pub client_secret: String,
}

/// Issues payment intents for full-resolution access.
///
/// Stateless per call; holds only the immutable processor handle and
/// limits, both built once at startup. Nothing is persisted locally -
/// the minted intent lives processor-side until confirmed.
pub struct IntentIssuer {
    processor: Arc<dyn PaymentProcessor>,
    limits: AmountLimits,
}

impl IntentIssuer {
    pub fn new(processor: Arc<dyn PaymentProcessor>, limits: AmountLimits) -> Self {
        Self { processor, limits }
    }

    pub fn limits(&self) -> &AmountLimits {
        &self.limits
    }

    /// Validation ladder, in order, each a distinct rejection; no
    /// processor call happens unless every rung passes.
    pub async fn issue(
        &self,
        identity: Option<&Identity>,
        req: IssueRequest,
    ) -> Result<IssuedIntent, GateError> {
        let identity =
            identity.ok_or_else(|| GateError::unauthenticated("caller identity required"))?;

        let amount = req
            .amount
            .as_i64()
            .filter(|a| *a > 0)
            .ok_or_else(|| GateError::invalid_amount(format!("not a positive integer: {}", req.amount)))?;

        if amount < self.limits.min {
            return Err(GateError::amount_too_small(format!(
                "{} is below the minimum chargeable amount",
                amount
            ))
            .with_data(json!({
                "min": self.limits.min,
                "currency": self.limits.currency,
            })));
        }

        if amount > self.limits.max {
            return Err(GateError::amount_too_large(format!(
                "{} exceeds the configured ceiling {}",
                amount, self.limits.max
            )));
        }

        let request = IntentRequest {
            amount,
            currency: self.limits.currency.clone(),
            metadata: IntentMetadata::hd_view(identity.uid(), &req.asset_id, &req.file_name),
        };

        let intent = self.processor.create_intent(request).await.map_err(|e| {
            error!(error = %e, asset = %req.asset_id, "intent creation failed");
            match e.stable_code() {
                Some(code) => GateError::upstream(code, "payment intent creation failed"),
                None => GateError::internal("payment intent creation failed"),
            }
        })?;

        Ok(IssuedIntent {
            client_secret: intent.client_secret,
        })
    }
}
