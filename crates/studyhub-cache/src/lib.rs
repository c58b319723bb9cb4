//! # studyhub-cache
//!
//! In-memory caches for StudyHub clients:
//!
//! - [`CollectionCache`]: the canonical local copy of one entity collection,
//!   with an explicit snapshot/restore API for optimistic mutations and
//!   fetch generations so that a late response cannot clobber a newer
//!   optimistic write.
//! - [`SignedUrlCache`]: memoized signed URLs using
//!   [moka](https://crates.io/crates/moka), expiring shortly before the
//!   URLs themselves.

pub mod collection;
pub mod keys;
pub mod signed_url;

pub use collection::{CollectionCache, FetchTicket, Snapshot};
pub use signed_url::SignedUrlCache;
