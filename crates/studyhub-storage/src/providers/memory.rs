//! In-memory blob store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::blob::{BlobStore, UploadedObject};

/// Blob operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    /// [`BlobStore::upload`].
    Upload,
    /// [`BlobStore::download`].
    Download,
    /// [`BlobStore::remove`].
    Remove,
    /// [`BlobStore::signed_url`].
    Sign,
}

/// Blob store holding objects in a concurrent map.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    bucket: String,
    objects: Arc<DashMap<String, Bytes>>,
    failures: Arc<DashMap<BlobOp, u32>>,
}

impl MemoryBlobStore {
    /// Create an empty store for `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(DashMap::new()),
            failures: Arc::new(DashMap::new()),
        }
    }

    /// Make the next call of `op` fail with a storage error.
    pub fn fail_next(&self, op: BlobOp) {
        *self.failures.entry(op).or_insert(0) += 1;
    }

    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn check(&self, op: BlobOp) -> AppResult<()> {
        if let Some(mut remaining) = self.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::storage(format!("Injected {op:?} failure")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn upload(&self, path: &str, data: Bytes) -> AppResult<UploadedObject> {
        self.check(BlobOp::Upload)?;
        debug!(path, bytes = data.len(), "Stored object");
        self.objects.insert(path.to_string(), data);
        Ok(UploadedObject {
            path: path.to_string(),
        })
    }

    async fn download(&self, path: &str) -> AppResult<Bytes> {
        self.check(BlobOp::Download)?;
        self.objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {path}")))
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        self.check(BlobOp::Remove)?;
        for path in paths {
            self.objects.remove(path);
        }
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_seconds: u64) -> AppResult<String> {
        self.check(BlobOp::Sign)?;
        if !self.objects.contains_key(path) {
            return Err(AppError::not_found(format!("Object not found: {path}")));
        }
        let expires = Utc::now().timestamp() + ttl_seconds as i64;
        Ok(format!("{}?expires={expires}", self.public_url(path)))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_download_remove() {
        let store = MemoryBlobStore::new("materials");
        store.upload("u/a.pdf", Bytes::from("pdf")).await.unwrap();
        assert_eq!(store.download("u/a.pdf").await.unwrap(), Bytes::from("pdf"));
        store
            .remove(&["u/a.pdf".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert!(store.is_empty());
        let err = store.download("u/a.pdf").await.unwrap_err();
        assert_eq!(err.kind, studyhub_core::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let store = MemoryBlobStore::new("materials");
        store.fail_next(BlobOp::Upload);
        assert!(store.upload("p", Bytes::from("x")).await.is_err());
        assert!(store.upload("p", Bytes::from("x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_signed_url_requires_object() {
        let store = MemoryBlobStore::new("materials");
        assert!(store.signed_url("p", 60).await.is_err());
        store.upload("p", Bytes::from("x")).await.unwrap();
        let url = store.signed_url("p", 60).await.unwrap();
        assert!(url.starts_with("memory://materials/p?expires="));
    }
}
