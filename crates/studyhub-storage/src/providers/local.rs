//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tracing::debug;

use studyhub_core::error::{AppError, ErrorKind};
use studyhub_core::result::AppResult;
use studyhub_core::traits::blob::{BlobStore, UploadedObject};

/// Blob store keeping each object as a file beneath a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored objects.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at the given path, creating it if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve an object path to a file beneath the root.
    ///
    /// Only plain path segments are accepted.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid object path: {path}")));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn upload(&self, path: &str, data: Bytes) -> AppResult<UploadedObject> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write object: {path}"),
                e,
            )
        })?;

        debug!(path, bytes = data.len(), "Wrote object");
        Ok(UploadedObject {
            path: path.to_string(),
        })
    }

    async fn download(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Object not found: {path}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read object: {path}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            let full_path = self.resolve(path)?;
            match fs::remove_file(&full_path).await {
                Ok(()) => debug!(path = %path, "Removed object"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to remove object: {path}"),
                        e,
                    ));
                }
            }
        }
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_seconds: u64) -> AppResult<String> {
        let full_path = self.resolve(path)?;
        if !fs::try_exists(&full_path).await.unwrap_or(false) {
            return Err(AppError::not_found(format!("Object not found: {path}")));
        }
        let expires = Utc::now().timestamp() + ttl_seconds as i64;
        Ok(format!("{}?expires={expires}", self.public_url(path)))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "file://{}",
            self.root.join(path.trim_start_matches('/')).display()
        )
    }
}
