//! Material services: CRUD, trash, upload, and search.

pub mod search;
pub mod service;

pub use search::{CategoryScope, MaterialFilter, MaterialSort, MaterialSortField};
pub use service::{MaterialService, UploadMaterial};
