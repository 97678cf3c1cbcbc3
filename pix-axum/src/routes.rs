use axum::{
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use pix_core::errors::GateError;
use pix_docs::AssetScope;
use pix_entitle::IssueRequest;

use crate::{auth::bearer_token, ApiError, AppState};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-pay-signature";

fn map_json_rejection(rejection: JsonRejection) -> ApiError {
    GateError::bad_request(format!("unreadable JSON body: {rejection}")).into()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentBody {
    /// Raw JSON value: the validation ladder decides what a valid
    /// amount is, so the deserializer must not.
    #[serde(default)]
    amount: serde_json::Value,
    #[serde(default)]
    image_id: String,
    #[serde(default)]
    file_name: String,
}

#[derive(Deserialize)]
struct AssetFeedQuery {
    owner: Option<String>,
}

async fn health() -> &'static str {
    "ok"
}

async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<IntentBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Authentication first: an unauthenticated caller learns nothing
    // about the body.
    let token = bearer_token(&headers)
        .ok_or_else(|| GateError::unauthenticated("missing bearer token"))?;
    let identity = state.verifier.verify(token).await?;

    let Json(body) = body.map_err(map_json_rejection)?;

    let issued = state
        .issuer
        .issue(
            Some(&identity),
            IssueRequest {
                amount: body.amount,
                asset_id: body.image_id,
                file_name: body.file_name,
            },
        )
        .await?;

    Ok(Json(json!({ "clientSecret": issued.client_secret })))
}

async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    state.reconciler.handle(&body, signature).await?;

    // Signature verified: acknowledge whatever the event was, so the
    // processor stops redelivering.
    Ok(Json(json!({ "received": true })))
}

async fn asset_feed(
    State(state): State<AppState>,
    Query(query): Query<AssetFeedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let scope = match query.owner {
        Some(owner) => AssetScope::Owner(owner),
        None => AssetScope::All,
    };
    let docs = state
        .assets
        .list(&scope)
        .await
        .map_err(|e| GateError::internal(format!("asset feed failed: {e}")))?;
    Ok(Json(serde_json::to_value(docs).map_err(|e| {
        GateError::internal(format!("asset feed serialization failed: {e}"))
    })?))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/assets", get(asset_feed))
        .route("/payments/intent", post(create_payment_intent))
        .route("/payments/webhook", post(payment_webhook))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
