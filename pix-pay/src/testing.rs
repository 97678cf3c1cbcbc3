//! Test doubles for the processor boundary.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{CreatedIntent, IntentRequest, PayError, PaymentProcessor, PayResult};

/// In-memory processor that records every request it sees.
///
/// Succeeds by default; `failing_with` flips it into a rejection mode
/// so callers can assert their error mapping.
pub struct StaticProcessor {
    requests: Mutex<Vec<IntentRequest>>,
    counter: AtomicU64,
    rejection: Option<(String, String)>,
}

impl StaticProcessor {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            rejection: None,
        }
    }

    pub fn failing_with(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rejection: Some((code.into(), message.into())),
            ..Self::new()
        }
    }

    /// Every request this processor has seen.
    pub fn requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for StaticProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for StaticProcessor {
    async fn create_intent(&self, req: IntentRequest) -> PayResult<CreatedIntent> {
        self.requests.lock().unwrap().push(req);

        if let Some((code, message)) = &self.rejection {
            return Err(PayError::Rejected {
                code: code.clone(),
                message: message.clone(),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(CreatedIntent {
            id: format!("pi_test_{n}"),
            client_secret: format!("pi_test_{n}_secret"),
        })
    }
}
