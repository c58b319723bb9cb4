//! Category (folder) domain entities.

pub mod model;
pub mod tree;

pub use model::{Category, CategoryPatch, CreateCategory};
pub use tree::{CategoryNode, CategoryTree, CategoryTreeNode, FlatNode};
