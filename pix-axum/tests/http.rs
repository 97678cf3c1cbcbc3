use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pix_axum::{build, Collaborators, PixApp, StaticTokenVerifier, SIGNATURE_HEADER};
use pix_blob::{MemoryObjectStore, NotificationBus, ObjectStore};
use pix_core::{AppConfig, Identity};
use pix_docs::{AssetDoc, AssetDocs, EntitlementDocs, MemoryAssets, MemoryEntitlements};
use pix_pay::testing::StaticProcessor;
use pix_pay::signature_header;

const WEBHOOK_SECRET: &str = "whsec_http_test";

struct Harness {
    app: PixApp,
    processor: Arc<StaticProcessor>,
    assets: Arc<MemoryAssets>,
    entitlements: Arc<MemoryEntitlements>,
}

fn harness_with(processor: StaticProcessor) -> Harness {
    let processor = Arc::new(processor);
    let assets = Arc::new(MemoryAssets::new());
    let entitlements = Arc::new(MemoryEntitlements::new());
    let bus = NotificationBus::default();
    let blobs: Arc<dyn ObjectStore> =
        Arc::new(MemoryObjectStore::new("media", bus.clone()));

    let mut config = AppConfig::new();
    config.set("payments.webhook_secret", WEBHOOK_SECRET);
    let verifier = StaticTokenVerifier::new()
        .with_token("tok-alice", Identity::new("alice").with_label("Alice"));

    let app = build(
        config.snapshot(),
        bus,
        Collaborators {
            processor: processor.clone(),
            verifier: Arc::new(verifier),
            blobs,
            assets: assets.clone(),
            entitlements: entitlements.clone(),
        },
    );

    Harness {
        app,
        processor,
        assets,
        entitlements,
    }
}

fn harness() -> Harness {
    harness_with(StaticProcessor::new())
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn intent_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/payments/intent")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn webhook_request(body: &[u8], header: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header(SIGNATURE_HEADER, header)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

fn success_event(uid: &str, asset: &str, reference: &str) -> Vec<u8> {
    json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": reference,
            "amount": 100,
            "currency": "usd",
            "metadata": {
                "uid": uid,
                "imageId": asset,
                "fileName": "cat.jpg",
                "purpose": "hd_view"
            }
        }}
    })
    .to_string()
    .into_bytes()
}

fn signed(body: &[u8]) -> String {
    signature_header(WEBHOOK_SECRET, body, chrono_now())
}

fn chrono_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

#[tokio::test]
async fn health_ok() {
    let h = harness();

    let res = h
        .app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn intent_requires_a_bearer_token() {
    let h = harness();

    let res = h
        .app
        .router
        .oneshot(intent_request(None, json!({"amount": 100})))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
    assert_eq!(json_body(res).await["error"], "unauthenticated");
    assert_eq!(h.processor.request_count(), 0);
}

#[tokio::test]
async fn intent_rejects_unknown_tokens() {
    let h = harness();

    let res = h
        .app
        .router
        .oneshot(intent_request(Some("tok-mallory"), json!({"amount": 100})))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
    assert_eq!(json_body(res).await["error"], "invalid-token");
    assert_eq!(h.processor.request_count(), 0);
}

#[tokio::test]
async fn intent_rejects_non_integer_amounts() {
    let h = harness();

    for bad in [json!({"amount": 10.5}), json!({"amount": -3}), json!({})] {
        let res = h
            .app
            .router
            .clone()
            .oneshot(intent_request(Some("tok-alice"), bad.clone()))
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 400, "{bad}");
        assert_eq!(json_body(res).await["error"], "invalid-amount");
    }
    assert_eq!(h.processor.request_count(), 0);
}

#[tokio::test]
async fn intent_reports_the_minimum_for_small_amounts() {
    let h = harness();

    let res = h
        .app
        .router
        .oneshot(intent_request(Some("tok-alice"), json!({"amount": 1})))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["error"], "amount-too-small");
    assert_eq!(body["min"], 50);
    assert_eq!(body["currency"], "usd");
    assert_eq!(h.processor.request_count(), 0);
}

#[tokio::test]
async fn intent_enforces_the_ceiling_without_touching_the_processor() {
    let h = harness();

    let res = h
        .app
        .router
        .clone()
        .oneshot(intent_request(
            Some("tok-alice"),
            json!({"amount": 1_000_001}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 403);
    assert_eq!(json_body(res).await["error"], "amount-too-large");
    assert_eq!(h.processor.request_count(), 0);

    // The documented in-bounds example really is in bounds.
    let res = h
        .app
        .router
        .oneshot(intent_request(
            Some("tok-alice"),
            json!({"amount": 100_000, "imageId": "a1", "fileName": "cat.jpg"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
}

#[tokio::test]
async fn intent_returns_only_the_client_secret() {
    let h = harness();

    let res = h
        .app
        .router
        .oneshot(intent_request(
            Some("tok-alice"),
            json!({"amount": 100, "imageId": "a1", "fileName": "cat.jpg"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    let secret = body["clientSecret"].as_str().unwrap();
    assert!(secret.ends_with("_secret"));
    assert_eq!(body.as_object().unwrap().len(), 1);

    let seen = h.processor.requests();
    assert_eq!(seen[0].metadata.uid, "alice");
    assert_eq!(seen[0].metadata.image_id, "a1");
}

#[tokio::test]
async fn processor_failures_surface_a_stable_code_only() {
    let h = harness_with(StaticProcessor::failing_with(
        "card_declined",
        "bank ref 4411, cardholder Jane Doe",
    ));

    let res = h
        .app
        .router
        .oneshot(intent_request(Some("tok-alice"), json!({"amount": 100})))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body, json!({"error": "card_declined"}));
}

#[tokio::test]
async fn webhook_rejects_bad_signatures_with_zero_side_effects() {
    let h = harness();
    let body = success_event("alice", "a1", "pi_1");
    let forged = signature_header("whsec_wrong", &body, chrono_now());

    let res = h
        .app
        .router
        .oneshot(webhook_request(&body, &forged))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["error"], "bad-signature");
    assert!(h
        .entitlements
        .list_for_user("alice")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn webhook_grants_entitlements_idempotently() {
    let h = harness();
    let body = success_event("alice", "a1", "pi_1");
    let header = signed(&body);

    for _ in 0..2 {
        let res = h
            .app
            .router
            .clone()
            .oneshot(webhook_request(&body, &header))
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(json_body(res).await, json!({"received": true}));
    }

    let grants = h.entitlements.list_for_user("alice").await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].payment_reference, "pi_1");
    assert_eq!(grants[0].asset_id, "a1");

    assert!(h
        .app
        .state
        .ledger
        .is_entitled("alice", "a1")
        .await
        .unwrap());
}

#[tokio::test]
async fn webhook_acknowledges_unrecognized_events() {
    let h = harness();
    let body = json!({
        "id": "evt_9",
        "type": "customer.created",
        "data": { "object": { "id": "cus_1" } }
    })
    .to_string()
    .into_bytes();

    let res = h
        .app
        .router
        .oneshot(webhook_request(&body, &signed(&body)))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!({"received": true}));
}

#[tokio::test]
async fn asset_feed_lists_documents_newest_first() {
    let h = harness();
    h.assets
        .create(AssetDoc::new("a", "alice", "Alice", "https://cdn.test/a.jpg"))
        .await
        .unwrap();
    h.assets
        .create(AssetDoc::new("b", "bob", "Bob", "https://cdn.test/b.jpg"))
        .await
        .unwrap();

    let res = h
        .app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/assets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], "b");
    assert_eq!(list[1]["id"], "a");

    let res = h
        .app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/assets?owner=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["ownerId"], "alice");
}
