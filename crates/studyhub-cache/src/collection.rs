//! The canonical local copy of one entity collection.
//!
//! Every reader of a collection shares one [`CollectionCache`]. Writers go
//! through one of three paths:
//!
//! - a fetch, bracketed by [`CollectionCache::begin_fetch`] and
//!   [`CollectionCache::complete_fetch`];
//! - an optimistic edit via [`CollectionCache::mutate`], which first
//!   cancels every in-flight fetch;
//! - a rollback via [`CollectionCache::restore`].
//!
//! Cancellation is generational: a fetch whose ticket predates the latest
//! write is discarded when it completes.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

#[derive(Debug)]
struct State<T> {
    items: Option<Vec<T>>,
    generation: u64,
    stale: bool,
}

/// Shared, snapshot-capable cache of one collection.
#[derive(Debug, Clone)]
pub struct CollectionCache<T> {
    key: Arc<str>,
    state: Arc<RwLock<State<T>>>,
}

/// An exact copy of the collection at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    items: Option<Vec<T>>,
}

impl<T> Snapshot<T> {
    /// The captured items (`None` if the collection was never loaded).
    pub fn items(&self) -> Option<&[T]> {
        self.items.as_deref()
    }
}

/// Proof that a fetch was started at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl<T: Clone> CollectionCache<T> {
    /// Create an empty, unloaded cache.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Arc::from(key.into()),
            state: Arc::new(RwLock::new(State {
                items: None,
                generation: 0,
                stale: false,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cache key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// A copy of the current items, if loaded.
    pub fn get(&self) -> Option<Vec<T>> {
        self.read().items.clone()
    }

    /// Read the current items without cloning the collection.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> Option<R> {
        self.read().items.as_deref().map(f)
    }

    /// Whether the collection must be (re)fetched before it is trusted.
    pub fn needs_fetch(&self) -> bool {
        let state = self.read();
        state.items.is_none() || state.stale
    }

    /// Whether the collection was invalidated since the last fetch.
    pub fn is_stale(&self) -> bool {
        self.read().stale
    }

    /// Start a fetch.
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.read().generation,
        }
    }

    /// Store fetched items unless a newer write cancelled this fetch.
    ///
    /// Returns whether the items were accepted.
    pub fn complete_fetch(&self, ticket: FetchTicket, items: Vec<T>) -> bool {
        let mut state = self.write();
        if state.generation != ticket.generation {
            debug!(
                key = %self.key,
                ticket = ticket.generation,
                current = state.generation,
                "Discarding superseded fetch"
            );
            return false;
        }
        state.items = Some(items);
        state.stale = false;
        true
    }

    /// Cancel every in-flight fetch.
    pub fn cancel_in_flight(&self) {
        self.write().generation += 1;
    }

    /// Capture the current collection.
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            items: self.read().items.clone(),
        }
    }

    /// Put back a snapshot exactly as captured.
    pub fn restore(&self, snapshot: Snapshot<T>) {
        let mut state = self.write();
        state.generation += 1;
        state.items = snapshot.items;
        debug!(key = %self.key, "Restored snapshot");
    }

    /// Edit the collection in place, cancelling in-flight fetches first.
    ///
    /// An unloaded collection is edited as if it were empty.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut state = self.write();
        state.generation += 1;
        f(state.items.get_or_insert_with(Vec::new))
    }

    /// Replace the whole collection, cancelling in-flight fetches.
    pub fn set(&self, items: Vec<T>) {
        let mut state = self.write();
        state.generation += 1;
        state.items = Some(items);
        state.stale = false;
    }

    /// Mark the collection for a reconciling refetch.
    pub fn invalidate(&self) {
        self.write().stale = true;
    }
}
