//! # studyhub-database
//!
//! The in-process [`MemoryEntityStore`] backend (with JSON file
//! persistence and failure injection) and the typed repositories that sit
//! on top of any [`studyhub_core::traits::EntityStore`].

pub mod memory;
pub mod repositories;

pub use memory::{MemoryEntityStore, StoreOp};
pub use repositories::{CategoryRepository, MaterialRepository, TagRepository};
