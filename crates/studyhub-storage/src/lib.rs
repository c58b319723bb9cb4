//! # studyhub-storage
//!
//! Blob store providers for StudyHub:
//!
//! - [`MemoryBlobStore`]: in-process objects, with failure injection for tests
//! - [`LocalBlobStore`]: objects stored under a local directory
//!
//! Both implement [`studyhub_core::traits::BlobStore`].

pub mod mime;
pub mod providers;

pub use providers::local::LocalBlobStore;
pub use providers::memory::{BlobOp, MemoryBlobStore};
