//! Tag services.

pub mod service;

pub use service::{DEFAULT_TAG_COLOR, TagService};
