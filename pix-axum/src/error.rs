use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pix_core::errors::GateError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // If it's a GateError (even wrapped by anyhow contexts),
        // answer with its status and stable code.
        if let Some(gate) = GateError::from_anyhow(&self.0) {
            let status = StatusCode::from_u16(gate.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!(code = gate.code(), detail = %gate.message, "request failed");
            }
            return (status, Json(gate.to_client_json())).into_response();
        }

        // Fallback: anything unclassified is an opaque internal error.
        error!(error = %self.0, "unclassified request failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "internal"})),
        )
            .into_response()
    }
}
