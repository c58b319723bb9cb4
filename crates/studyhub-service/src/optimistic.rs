//! The optimistic mutation contract shared by every service.
//!
//! A mutation with a visible local representation runs as:
//!
//! 1. cancel in-flight fetches of the collection,
//! 2. snapshot the collection,
//! 3. apply the edit locally,
//! 4. dispatch the store request,
//! 5. on failure restore the snapshot and notify once,
//! 6. in every case mark the collection for a reconciling refetch.

use std::future::Future;

use tracing::{debug, warn};

use studyhub_cache::CollectionCache;
use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::notify::{Notification, Notifier};

/// Run `dispatch` with `apply` already visible in `cache`.
///
/// `failure_title` is the headline of the notification sent if the
/// dispatch fails.
pub async fn mutate<T, R, Fut>(
    cache: &CollectionCache<T>,
    notifier: &dyn Notifier,
    failure_title: &str,
    apply: impl FnOnce(&mut Vec<T>),
    dispatch: Fut,
) -> AppResult<R>
where
    T: Clone,
    Fut: Future<Output = AppResult<R>>,
{
    cache.cancel_in_flight();
    let snapshot = cache.snapshot();
    cache.mutate(apply);

    let result = dispatch.await;
    if let Err(e) = &result {
        warn!(key = cache.key(), error = %e, "Optimistic mutation failed, rolling back");
        cache.restore(snapshot);
        report(notifier, failure_title, e);
    }
    cache.invalidate();
    result
}

/// Load a collection, serving the cached copy unless it needs a refetch.
pub async fn load<T, Fut>(cache: &CollectionCache<T>, fetch: impl FnOnce() -> Fut) -> AppResult<Vec<T>>
where
    T: Clone,
    Fut: Future<Output = AppResult<Vec<T>>>,
{
    if !cache.needs_fetch() {
        if let Some(items) = cache.get() {
            return Ok(items);
        }
    }
    refetch(cache, fetch).await
}

/// Fetch a collection and store it unless a newer write superseded the fetch.
///
/// A superseded fetch returns the newer local state instead.
pub async fn refetch<T, Fut>(
    cache: &CollectionCache<T>,
    fetch: impl FnOnce() -> Fut,
) -> AppResult<Vec<T>>
where
    T: Clone,
    Fut: Future<Output = AppResult<Vec<T>>>,
{
    let ticket = cache.begin_fetch();
    let items = fetch().await?;
    if cache.complete_fetch(ticket, items.clone()) {
        debug!(key = cache.key(), count = items.len(), "Fetched collection");
        Ok(items)
    } else {
        Ok(cache.get().unwrap_or_default())
    }
}

/// Send the single failure notification for an operation.
pub fn report(notifier: &dyn Notifier, title: &str, error: &AppError) {
    notifier.notify(Notification::error(title).with_description(error.message.clone()));
}

/// Notify and pass a failed result through.
pub fn reported<R>(notifier: &dyn Notifier, title: &str, result: AppResult<R>) -> AppResult<R> {
    if let Err(e) = &result {
        report(notifier, title, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::MemoryNotifier;

    #[tokio::test]
    async fn test_success_keeps_edit_and_invalidates() {
        let cache = CollectionCache::new("numbers");
        cache.set(vec![1, 2, 3]);
        let notifier = MemoryNotifier::new();

        let out: AppResult<()> = mutate(&cache, &notifier, "Failed", |v| v.retain(|n| *n != 2), async {
            Ok(())
        })
        .await;
        assert!(out.is_ok());
        assert_eq!(cache.get(), Some(vec![1, 3]));
        assert!(cache.is_stale());
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot_and_notifies_once() {
        let cache = CollectionCache::new("numbers");
        cache.set(vec![1, 2, 3]);
        let before = cache.snapshot();
        let notifier = MemoryNotifier::new();

        let out: AppResult<()> = mutate(&cache, &notifier, "Failed", |v| v.clear(), async {
            Err(AppError::store("down"))
        })
        .await;
        assert!(out.is_err());
        assert_eq!(cache.snapshot(), before);
        assert_eq!(notifier.error_count(), 1);
        assert!(cache.is_stale());
    }

    #[tokio::test]
    async fn test_load_uses_cache_until_invalidated() {
        let cache = CollectionCache::new("numbers");
        let first = load(&cache, || async { Ok(vec![1]) }).await.unwrap();
        assert_eq!(first, vec![1]);
        let cached = load(&cache, || async { Ok(vec![2]) }).await.unwrap();
        assert_eq!(cached, vec![1]);
        cache.invalidate();
        let fresh = load(&cache, || async { Ok(vec![2]) }).await.unwrap();
        assert_eq!(fresh, vec![2]);
    }

    #[tokio::test]
    async fn test_superseded_fetch_keeps_local_write() {
        let cache = CollectionCache::new("numbers");
        let out = refetch(&cache, || {
            cache.set(vec![9]);
            async { Ok(vec![1]) }
        })
        .await
        .unwrap();
        assert_eq!(out, vec![9]);
    }
}
