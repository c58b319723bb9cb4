//! Batch operations over material selections.

pub mod service;

pub use service::{
    BatchOperation, BatchReport, BatchService, DirectorySink, DownloadSink, TagEditMode,
};
