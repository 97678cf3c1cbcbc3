use std::path::Path;

use async_trait::async_trait;

use crate::BlobResult;

/// Core object storage operations - must be implemented by all storage
/// backends. Pixgate moves whole objects through local paths (the
/// transform pipeline works on scoped temporary files), so the API is
/// path-in/path-out rather than streaming.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store fronts.
    fn bucket(&self) -> &str;

    /// Upload a local file to `key`, finalizing the object.
    async fn upload(
        &self,
        local: &Path,
        key: &str,
        content_type: Option<&str>,
    ) -> BlobResult<()>;

    /// Download the object at `key` into a local file.
    async fn download(&self, key: &str, local: &Path) -> BlobResult<()>;

    /// Mark an object publicly readable.
    async fn make_public(&self, key: &str) -> BlobResult<()>;

    /// Durable URL for a (public) object. Pure key arithmetic, never
    /// a network call.
    fn public_url(&self, key: &str) -> String;

    /// Get object metadata without content.
    async fn head(&self, key: &str) -> BlobResult<ObjectHead>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Metadata about a stored object
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub public: bool,
}
