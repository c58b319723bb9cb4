//! # studyhub-core
//!
//! Core crate for StudyHub. Contains the collaborator traits (entity store,
//! blob store, identity provider, notification sink), configuration
//! schemas, typed identifiers, filter/sort types, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other StudyHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
