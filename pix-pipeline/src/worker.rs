use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use pix_blob::{file_name, FinalizeEvent, KeyStrategy, ObjectStore, DERIVED_MARKER};
use pix_docs::{AssetDoc, AssetDocs, DerivedRefs, DocError};

use crate::filter::{classify, SkipReason};
use crate::resize::derive_preview;
use crate::PipelineError;

/// Tunables for one worker instance.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    /// Where scoped temporaries are created; system temp when `None`.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_width: 400,
            max_height: 300,
            jpeg_quality: 80,
            scratch_dir: None,
        }
    }
}

/// What one invocation did.
#[derive(Debug)]
pub enum TransformOutcome {
    /// The filtering contract short-circuited; nothing was touched.
    Skipped(SkipReason),
    /// Derivative published. `asset_id` is the reconciled document,
    /// `None` when no (unambiguous) document claimed the path.
    Completed {
        derived_key: String,
        derived_url: String,
        asset_id: Option<String>,
    },
}

/// The transform worker. Stateless per invocation: every `handle`
/// call stands alone and concurrent calls for distinct objects are
/// safe. Temporary files live in a directory scoped to the call and
/// are released on every exit path.
pub struct TransformWorker {
    blobs: Arc<dyn ObjectStore>,
    assets: Arc<dyn AssetDocs>,
    keys: Arc<dyn KeyStrategy>,
    config: TransformConfig,
}

impl TransformWorker {
    pub fn new(
        blobs: Arc<dyn ObjectStore>,
        assets: Arc<dyn AssetDocs>,
        keys: Arc<dyn KeyStrategy>,
        config: TransformConfig,
    ) -> Self {
        Self {
            blobs,
            assets,
            keys,
            config,
        }
    }

    pub async fn handle(&self, event: &FinalizeEvent) -> Result<TransformOutcome, PipelineError> {
        if let Some(reason) = classify(event, self.keys.as_ref()) {
            info!(key = %event.name, ?reason, "skipping notification");
            return Ok(TransformOutcome::Skipped(reason));
        }

        // Scoped temporaries: the guard removes the directory when it
        // drops, including on the error paths below.
        let scratch = match &self.config.scratch_dir {
            Some(dir) => tempfile::tempdir_in(dir)?,
            None => tempfile::tempdir()?,
        };
        let filename = file_name(&event.name).to_string();
        let local_original = scratch.path().join(&filename);
        let local_preview = scratch.path().join(format!("{DERIVED_MARKER}{filename}"));

        match self.blobs.download(&event.name, &local_original).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(key = %event.name, "source object vanished before download");
                return Ok(TransformOutcome::Skipped(SkipReason::SourceMissing));
            }
            Err(e) => return Err(e.into()),
        }

        let (src, dst) = (local_original.clone(), local_preview.clone());
        let (max_w, max_h, quality) = (
            self.config.max_width,
            self.config.max_height,
            self.config.jpeg_quality,
        );
        let (width, height) =
            tokio::task::spawn_blocking(move || derive_preview(&src, &dst, max_w, max_h, quality))
                .await
                .map_err(|e| PipelineError::Task(e.to_string()))??;

        let derived_key =
            self.keys
                .derived_key(&event.name)
                .ok_or_else(|| PipelineError::UnderivableKey {
                    key: event.name.clone(),
                })?;

        self.blobs
            .upload(&local_preview, &derived_key, Some("image/jpeg"))
            .await?;
        self.blobs.make_public(&derived_key).await?;
        let derived_url = self.blobs.public_url(&derived_key);

        info!(
            original = %event.name,
            derived = %derived_key,
            width,
            height,
            "derivative published"
        );

        let asset_id = self.reconcile(&event.name, &derived_key, &derived_url).await?;

        Ok(TransformOutcome::Completed {
            derived_key,
            derived_url,
            asset_id,
        })
    }

    /// Point the owning asset document at the derivative.
    ///
    /// Correlation order: the asset id embedded in the key's directory
    /// segment wins when the referenced document claims this path; the
    /// field-equality query is the fallback. An ambiguous query result
    /// is resolved deterministically to the lowest `created_at` and
    /// never updates more than one document. Zero matches are a
    /// logged no-op; only store failures abort the invocation.
    async fn reconcile(
        &self,
        original_key: &str,
        derived_key: &str,
        derived_url: &str,
    ) -> Result<Option<String>, PipelineError> {
        let refs = DerivedRefs {
            derived_path: derived_key.to_string(),
            derived_url: derived_url.to_string(),
        };

        if let Some(correlation_id) = self.keys.correlation_id(original_key) {
            if let Some(doc) = self.assets.get(correlation_id).await? {
                if doc.original_path.as_deref() == Some(original_key) {
                    return self.apply(&doc.id, refs).await;
                }
                warn!(
                    asset = correlation_id,
                    key = original_key,
                    "correlation id does not claim this path, falling back to query"
                );
            }
        }

        let mut matches = self.assets.find_by_original_path(original_key).await?;
        match matches.len() {
            0 => {
                info!(key = original_key, "no asset document claims this path");
                Ok(None)
            }
            1 => self.apply(&matches.remove(0).id, refs).await,
            n => {
                let winner = matches
                    .iter()
                    .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
                    .map(|d| d.id.clone())
                    .unwrap_or_default();
                warn!(
                    key = original_key,
                    matches = n,
                    winner = %winner,
                    "ambiguous original_path, updating earliest document only"
                );
                self.apply(&winner, refs).await
            }
        }
    }

    async fn apply(
        &self,
        asset_id: &str,
        refs: DerivedRefs,
    ) -> Result<Option<String>, PipelineError> {
        match self.assets.apply_derivative(asset_id, refs).await {
            Ok(AssetDoc { id, .. }) => Ok(Some(id)),
            Err(DocError::NotFound { key }) => {
                warn!(asset = %key, "asset document vanished before reconciliation");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Drive a worker from a finalize-notification subscription. Each
/// event gets its own task, so notifications for distinct assets run
/// fully in parallel; a failed invocation is logged and left to the
/// host's redelivery policy.
pub async fn run(worker: Arc<TransformWorker>, mut rx: broadcast::Receiver<FinalizeEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let worker = Arc::clone(&worker);
                tokio::spawn(async move {
                    if let Err(e) = worker.handle(&event).await {
                        error!(key = %event.name, error = %e, "transform invocation failed");
                    }
                });
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "notification subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
