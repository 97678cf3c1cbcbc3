use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

use crate::{CreatedIntent, IntentRequest, PayError, PaymentProcessor, PayResult};

/// REST-backed processor client (Stripe-compatible wire shape).
///
/// Immutable after construction; build one at process start and share
/// it behind an `Arc`.
pub struct RestProcessor {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct WireIntent {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestProcessor {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for RestProcessor {
    async fn create_intent(&self, req: IntentRequest) -> PayResult<CreatedIntent> {
        let url = format!(
            "{}/v1/payment_intents",
            self.base_url.trim_end_matches('/')
        );
        let amount = req.amount.to_string();
        let form: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", req.currency.as_str()),
            ("metadata[uid]", req.metadata.uid.as_str()),
            ("metadata[imageId]", req.metadata.image_id.as_str()),
            ("metadata[fileName]", req.metadata.file_name.as_str()),
            ("metadata[purpose]", req.metadata.purpose.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(PayError::transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(PayError::transport)?;

        if status.is_success() {
            let intent: WireIntent = serde_json::from_slice(&body)
                .map_err(|e| PayError::protocol(format!("bad intent body: {e}")))?;
            return Ok(CreatedIntent {
                id: intent.id,
                client_secret: intent.client_secret,
            });
        }

        match serde_json::from_slice::<WireErrorEnvelope>(&body) {
            Ok(envelope) => {
                let code = envelope
                    .error
                    .code
                    .or(envelope.error.kind)
                    .unwrap_or_else(|| "processor-error".to_string());
                error!(status = %status, code, "intent creation rejected");
                Err(PayError::Rejected {
                    code,
                    message: envelope.error.message.unwrap_or_default(),
                })
            }
            Err(_) => {
                error!(status = %status, "unreadable processor error body");
                Err(PayError::protocol(format!("http {status}")))
            }
        }
    }
}
