//! Memoized signed URLs backed by moka.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use studyhub_core::config::cache::CacheConfig;
use studyhub_core::result::AppResult;

use crate::keys;

/// Caches signed URLs so repeated previews do not re-sign.
///
/// Entries live for the URL lifetime minus a safety margin, so a cached URL
/// is never handed out after it has expired.
#[derive(Debug, Clone)]
pub struct SignedUrlCache {
    bucket: String,
    cache: Cache<String, String>,
}

impl SignedUrlCache {
    /// Create a cache for URLs signed with `ttl_seconds`.
    pub fn new(config: &CacheConfig, bucket: impl Into<String>, ttl_seconds: u64) -> Self {
        let lifetime = ttl_seconds
            .saturating_sub(config.signed_url_margin_seconds)
            .max(1);
        let cache = Cache::builder()
            .max_capacity(config.signed_url_capacity)
            .time_to_live(Duration::from_secs(lifetime))
            .build();
        Self {
            bucket: bucket.into(),
            cache,
        }
    }

    /// Return the cached URL for `path`, or sign a new one with `sign`.
    pub async fn get_or_sign<F, Fut>(&self, path: &str, sign: F) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = AppResult<String>>,
    {
        let key = keys::signed_url(&self.bucket, path);
        if let Some(url) = self.cache.get(&key).await {
            return Ok(url);
        }
        let url = sign().await?;
        self.cache.insert(key, url.clone()).await;
        debug!(path, "Cached signed URL");
        Ok(url)
    }

    /// Forget the URL for `path` (after the object was removed).
    pub async fn evict(&self, path: &str) {
        self.cache
            .invalidate(&keys::signed_url(&self.bucket, path))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_signs_once_per_path() {
        let cache = SignedUrlCache::new(&CacheConfig::default(), "materials", 3600);
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let url = cache
                .get_or_sign("u/a.pdf", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("https://signed/a".to_string())
                })
                .await
                .unwrap();
            assert_eq!(url, "https://signed/a");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_evict_forces_resign() {
        let cache = SignedUrlCache::new(&CacheConfig::default(), "materials", 3600);
        cache
            .get_or_sign("p", || async { Ok("one".to_string()) })
            .await
            .unwrap();
        cache.evict("p").await;
        let url = cache
            .get_or_sign("p", || async { Ok("two".to_string()) })
            .await
            .unwrap();
        assert_eq!(url, "two");
    }

    #[tokio::test]
    async fn test_sign_failure_is_not_cached() {
        let cache = SignedUrlCache::new(&CacheConfig::default(), "materials", 3600);
        let err = cache
            .get_or_sign("p", || async {
                Err(studyhub_core::AppError::storage("offline"))
            })
            .await
            .unwrap_err();
        assert!(err.is_transient());
        let url = cache
            .get_or_sign("p", || async { Ok("ok".to_string()) })
            .await
            .unwrap();
        assert_eq!(url, "ok");
    }
}
