//! Core type definitions used across the StudyHub workspace.

pub mod filter;
pub mod id;
pub mod item;
pub mod sorting;

pub use filter::{FilterField, FilterOp, FilterValue, ListQuery};
pub use id::*;
pub use item::ItemKey;
pub use sorting::{SortDirection, SortField};
