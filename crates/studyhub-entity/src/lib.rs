//! # studyhub-entity
//!
//! Domain entity models for StudyHub. Every struct in this crate
//! represents an entity store row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`; change sets
//! (`*Patch`) know how to serialize exactly the columns they touch.
//!
//! The [`category::CategoryTree`] derives the folder hierarchy from the
//! flat category collection.

pub mod category;
pub mod material;
pub mod tag;
