//! # pix-axum: HTTP boundary and wiring for Pixgate
//!
//! Builds the router over an [`AppState`] of immutable,
//! constructed-once collaborators. `build` assembles an app from
//! explicit collaborators (tests swap in in-memory doubles);
//! `build_from_env` is the binary's path, backed by the filesystem
//! object store and the REST payment processor.

pub mod auth;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::warn;

use pix_blob::{DefaultKeyStrategy, FsObjectStore, NotificationBus, ObjectStore};
use pix_core::{AppConfig, ConfigSnapshot};
use pix_docs::{AssetDocs, EntitlementDocs, MemoryAssets, MemoryEntitlements};
use pix_entitle::{AmountLimits, EntitlementLedger, IntentIssuer, WebhookReconciler};
use pix_pay::{PaymentProcessor, RestProcessor, WebhookVerifier};
use pix_pipeline::{TransformConfig, TransformWorker};

pub use auth::{bearer_token, StaticTokenVerifier, TokenVerifier};
pub use error::ApiError;
pub use routes::{router, SIGNATURE_HEADER};
pub use state::AppState;

/// The external collaborators an app is wired to.
pub struct Collaborators {
    pub processor: Arc<dyn PaymentProcessor>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub blobs: Arc<dyn ObjectStore>,
    pub assets: Arc<dyn AssetDocs>,
    pub entitlements: Arc<dyn EntitlementDocs>,
}

/// A fully wired application.
pub struct PixApp {
    pub router: Router,
    pub state: AppState,
    pub bus: NotificationBus,
    pub worker: Arc<TransformWorker>,
    pub config: ConfigSnapshot,
}

impl PixApp {
    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

/// Assemble an app from explicit collaborators.
pub fn build(config: ConfigSnapshot, bus: NotificationBus, collab: Collaborators) -> PixApp {
    let limits = AmountLimits {
        currency: config
            .get_string("payments.currency")
            .unwrap_or_else(|| "usd".to_string()),
        min: config.get_i64("payments.min_amount").unwrap_or(50),
        max: config.get_i64("payments.max_amount").unwrap_or(1_000_000),
    };
    let issuer = Arc::new(IntentIssuer::new(Arc::clone(&collab.processor), limits));

    let webhook_secret = config
        .get_string("payments.webhook_secret")
        .unwrap_or_else(|| {
            warn!("payments.webhook_secret unset, falling back to the dev secret");
            "whsec_dev".to_string()
        });
    let reconciler = Arc::new(WebhookReconciler::new(
        WebhookVerifier::new(webhook_secret),
        Arc::clone(&collab.entitlements),
    ));
    let ledger = Arc::new(EntitlementLedger::new(Arc::clone(&collab.entitlements)));

    let transform = TransformConfig {
        max_width: config.get_u32("pipeline.max_width").unwrap_or(400),
        max_height: config.get_u32("pipeline.max_height").unwrap_or(300),
        jpeg_quality: config
            .get_u32("pipeline.jpeg_quality")
            .map(|q| q.min(100) as u8)
            .unwrap_or(80),
        scratch_dir: config.get_string("pipeline.scratch_dir").map(Into::into),
    };
    let worker = Arc::new(TransformWorker::new(
        Arc::clone(&collab.blobs),
        Arc::clone(&collab.assets),
        Arc::new(DefaultKeyStrategy),
        transform,
    ));

    let state = AppState {
        issuer,
        reconciler,
        ledger,
        assets: collab.assets,
        entitlements: collab.entitlements,
        verifier: collab.verifier,
    };

    PixApp {
        router: router(state.clone()),
        state,
        bus,
        worker,
        config,
    }
}

/// The binary's wiring: configuration from the environment, objects
/// on the local filesystem, documents in memory, payments over REST.
pub fn build_from_env() -> anyhow::Result<PixApp> {
    let mut config = AppConfig::new();
    config.set("http.host", "127.0.0.1");
    config.set("http.port", "3030");
    config.set("blob.bucket", "pixgate-media");
    config.set("blob.root", "./data/blobs");
    config.set("blob.base_url", "http://127.0.0.1:3030/blobs");
    config.set("payments.base_url", "https://api.stripe.com");
    config.load_env("PIXGATE__");
    let snapshot = config.snapshot();

    let secret_key = snapshot
        .get_string("payments.secret_key")
        .context("payments.secret_key is required (PIXGATE__PAYMENTS__SECRET_KEY)")?;
    let processor: Arc<dyn PaymentProcessor> = Arc::new(RestProcessor::new(
        snapshot
            .get_string("payments.base_url")
            .unwrap_or_else(|| "https://api.stripe.com".to_string()),
        secret_key,
    ));

    let verifier: Arc<dyn TokenVerifier> = Arc::new(
        snapshot
            .get_string("auth.static_tokens")
            .map(|table| StaticTokenVerifier::from_table(&table))
            .unwrap_or_default(),
    );

    let bus = NotificationBus::default();
    let blobs: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(
        snapshot
            .get_string("blob.bucket")
            .unwrap_or_else(|| "pixgate-media".to_string()),
        snapshot
            .get_string("blob.root")
            .unwrap_or_else(|| "./data/blobs".to_string()),
        snapshot
            .get_string("blob.base_url")
            .unwrap_or_else(|| "http://127.0.0.1:3030/blobs".to_string()),
        bus.clone(),
    ));

    let assets: Arc<dyn AssetDocs> = Arc::new(MemoryAssets::new());
    let entitlements: Arc<dyn EntitlementDocs> = Arc::new(MemoryEntitlements::new());

    Ok(build(
        snapshot,
        bus,
        Collaborators {
            processor,
            verifier,
            blobs,
            assets,
            entitlements,
        },
    ))
}
