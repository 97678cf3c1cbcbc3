use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::fs_store::validate_key;
use crate::{BlobError, BlobResult, FinalizeEvent, NotificationBus, ObjectHead, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: Option<String>,
    public: bool,
}

/// In-memory object store, used as a test double.
pub struct MemoryObjectStore {
    bucket: String,
    base_url: String,
    bus: NotificationBus,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>, bus: NotificationBus) -> Self {
        Self {
            bucket: bucket.into(),
            base_url: "https://blobs.example.test".to_string(),
            bus,
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Seed an object directly, bypassing the upload path.
    pub fn insert(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) {
        self.objects.write().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.map(|s| s.to_string()),
                public: false,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        self.objects.write().unwrap().remove(key);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload(
        &self,
        local: &Path,
        key: &str,
        content_type: Option<&str>,
    ) -> BlobResult<()> {
        validate_key(key)?;
        let bytes = tokio::fs::read(local).await?;
        self.objects.write().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.map(|s| s.to_string()),
                public: false,
            },
        );
        self.bus
            .publish(FinalizeEvent::new(&self.bucket, key, content_type));
        Ok(())
    }

    async fn download(&self, key: &str, local: &Path) -> BlobResult<()> {
        validate_key(key)?;
        let bytes = {
            let objects = self.objects.read().unwrap();
            objects
                .get(key)
                .map(|o| o.bytes.clone())
                .ok_or_else(|| BlobError::not_found(key))?
        };
        tokio::fs::write(local, bytes).await?;
        Ok(())
    }

    async fn make_public(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        let mut objects = self.objects.write().unwrap();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| BlobError::not_found(key))?;
        object.public = true;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        validate_key(key)?;
        let objects = self.objects.read().unwrap();
        let object = objects.get(key).ok_or_else(|| BlobError::not_found(key))?;
        Ok(ObjectHead {
            size_bytes: object.bytes.len() as u64,
            content_type: object.content_type.clone(),
            public: object.public,
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        self.objects.write().unwrap().remove(key);
        Ok(())
    }
}
