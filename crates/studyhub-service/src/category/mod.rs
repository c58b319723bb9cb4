//! Category (folder) services.

pub mod service;

pub use service::CategoryService;
