//! Notification sinks.

pub mod sink;

pub use sink::{MemoryNotifier, TracingNotifier};
