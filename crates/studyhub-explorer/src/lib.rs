//! # studyhub-explorer
//!
//! The interaction model of the StudyHub file explorer:
//!
//! - [`selection`]: the selection set and selection mode
//! - [`lasso`]: shift-drag rectangle selection
//! - [`dnd`]: drag-and-drop with layered drop targets
//! - [`view_model`]: the explorer view tying them to the services
//!
//! Pointer handlers are synchronous and work on in-memory state. Only
//! drops and batch actions await the services.

pub mod dnd;
pub mod geometry;
pub mod lasso;
pub mod selection;
pub mod view_model;

pub use dnd::{DndOrchestrator, DropEffect, DropOutcome, DropSummary, DropTarget, DropTargetKind};
pub use geometry::{Point, Rect};
pub use lasso::{LassoEngine, LassoSelection, PointerInput, ScrollContainer, SelectableItem};
pub use selection::{SelectionState, SelectionUpdateMode};
pub use view_model::{Breadcrumb, ExplorerViewModel, FolderListing};
