use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::PayResult;

/// Correlating metadata attached to every intent. The webhook
/// reconciler reads these fields back out of verified events, so the
/// wire names must stay stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentMetadata {
    #[serde(default)]
    pub uid: String,
    #[serde(default, rename = "imageId")]
    pub image_id: String,
    #[serde(default, rename = "fileName")]
    pub file_name: String,
    #[serde(default)]
    pub purpose: String,
}

impl IntentMetadata {
    pub fn hd_view(uid: &str, image_id: &str, file_name: &str) -> Self {
        Self {
            uid: uid.to_string(),
            image_id: image_id.to_string(),
            file_name: file_name.to_string(),
            purpose: "hd_view".to_string(),
        }
    }

    /// Whether the metadata carries the pair needed to key an
    /// entitlement.
    pub fn is_correlated(&self) -> bool {
        !self.uid.is_empty() && !self.image_id.is_empty()
    }
}

/// A request for one payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub metadata: IntentMetadata,
}

/// What the processor hands back: its id plus the client-usable
/// secret. The intent itself lives processor-side.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

/// The processor boundary. Implementations hold immutable
/// configuration built once at process start.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(&self, req: IntentRequest) -> PayResult<CreatedIntent>;
}
