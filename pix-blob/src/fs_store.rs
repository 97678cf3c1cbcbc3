use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::{BlobError, BlobResult, FinalizeEvent, NotificationBus, ObjectHead, ObjectStore};

/// Filesystem-backed object store.
///
/// Objects live under `root/<key>`; content types and public flags are
/// process-local bookkeeping. Finalize notifications are published on
/// the attached bus after the object is durably in place, mirroring
/// the ordering guarantee of hosted stores.
pub struct FsObjectStore {
    bucket: String,
    root: PathBuf,
    base_url: String,
    bus: NotificationBus,
    content_types: RwLock<HashMap<String, String>>,
    public: RwLock<HashSet<String>>,
}

impl FsObjectStore {
    pub fn new(
        bucket: impl Into<String>,
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
        bus: NotificationBus,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            root: root.into(),
            base_url: base_url.into(),
            bus,
            content_types: RwLock::new(HashMap::new()),
            public: RwLock::new(HashSet::new()),
        }
    }

    fn object_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

pub(crate) fn validate_key(key: &str) -> BlobResult<()> {
    if key.is_empty() || key.starts_with('/') {
        return Err(BlobError::invalid(format!("bad object key: {key:?}")));
    }
    if key.split('/').any(|seg| seg == ".." || seg == ".") {
        return Err(BlobError::invalid(format!("bad object key: {key:?}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        local: &Path,
        key: &str,
        content_type: Option<&str>,
    ) -> BlobResult<()> {
        let dest = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local, &dest).await?;

        if let Some(ct) = content_type {
            self.content_types
                .write()
                .unwrap()
                .insert(key.to_string(), ct.to_string());
        }

        debug!(bucket = %self.bucket, key, "object finalized");
        self.bus
            .publish(FinalizeEvent::new(&self.bucket, key, content_type));
        Ok(())
    }

    async fn download(&self, key: &str, local: &Path) -> BlobResult<()> {
        let src = self.object_path(key)?;
        match tokio::fs::copy(&src, local).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::not_found(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn make_public(&self, key: &str) -> BlobResult<()> {
        let path = self.object_path(key)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(BlobError::not_found(key));
        }
        self.public.write().unwrap().insert(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), self.bucket, key)
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let path = self.object_path(key)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::not_found(key))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(ObjectHead {
            size_bytes: meta.len(),
            content_type: self.content_types.read().unwrap().get(key).cloned(),
            public: self.public.read().unwrap().contains(key),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.content_types.write().unwrap().remove(key);
        self.public.write().unwrap().remove(key);
        Ok(())
    }
}
