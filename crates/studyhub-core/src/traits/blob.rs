//! Blob store trait for binary object storage.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadedObject {
    /// Path of the stored object within the bucket.
    pub path: String,
}

/// Trait for binary object storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "memory", "local").
    fn provider_type(&self) -> &str;

    /// Store bytes at the given path, replacing any existing object.
    async fn upload(&self, path: &str, data: Bytes) -> AppResult<UploadedObject>;

    /// Read the object at the given path.
    async fn download(&self, path: &str) -> AppResult<Bytes>;

    /// Remove every listed object. Missing objects are ignored.
    async fn remove(&self, paths: &[String]) -> AppResult<()>;

    /// Create a URL granting read access for `ttl_seconds`.
    async fn signed_url(&self, path: &str, ttl_seconds: u64) -> AppResult<String>;

    /// The unauthenticated URL of an object.
    fn public_url(&self, path: &str) -> String;
}
