//! Drag-and-drop: payloads, drop-target collision, and the drop flow.

pub mod collision;
pub mod orchestrator;
pub mod payload;

pub use collision::{CollisionDetector, DropTarget, DropTargetKind};
pub use orchestrator::{
    DndOrchestrator, DragSession, DropEffect, DropOutcome, DropSummary, ROOT_NAME, place_name,
};
pub use payload::{DragKind, DragPayload};
