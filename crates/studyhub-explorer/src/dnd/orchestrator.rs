//! Drag-and-drop of folders and materials between folders.
//!
//! Pointer handling (`drag_start`, `drag_over`, `drag_cancel`) is
//! synchronous. Only `drop` suspends, once per persistence request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use studyhub_core::error::AppError;
use studyhub_core::result::AppResult;
use studyhub_core::traits::{Notification, Notifier};
use studyhub_core::types::{CategoryId, ItemKey, MaterialId};
use studyhub_entity::category::CategoryTree;
use studyhub_service::{Services, optimistic};

use super::collision::{CollisionDetector, DropTargetKind};
use super::payload::DragPayload;
use crate::geometry::{Point, Rect};
use crate::selection::SelectionState;

/// Display name of the root folder.
pub const ROOT_NAME: &str = "My Materials";

/// Whether a drop moves or copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropEffect {
    /// Re-parent the dragged items.
    #[default]
    Move,
    /// Duplicate the dragged items under the target.
    Copy,
}

impl DropEffect {
    fn verb(&self) -> &'static str {
        match self {
            Self::Move => "Moved",
            Self::Copy => "Copied",
        }
    }

    fn failure_title(&self) -> &'static str {
        match self {
            Self::Move => "Failed to move items",
            Self::Copy => "Failed to copy items",
        }
    }

    fn blocked_title(&self) -> &'static str {
        match self {
            Self::Move => "Cannot move folder",
            Self::Copy => "Cannot copy folder",
        }
    }
}

/// Per-kind counts for a completed drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSummary {
    /// Folders moved or copied.
    pub folders: usize,
    /// Materials moved or copied.
    pub materials: usize,
    /// Items skipped as no-ops or invalid.
    pub skipped: usize,
    /// Items whose request failed.
    pub failed: usize,
}

impl DropSummary {
    /// Items that were moved or copied.
    pub fn applied(&self) -> usize {
        self.folders + self.materials
    }

    /// "2 folders and 3 files", "1 file", ...
    pub fn describe(&self) -> String {
        let count = |n: usize, one: &str, many: &str| {
            format!("{n} {}", if n == 1 { one } else { many })
        };
        match (self.folders, self.materials) {
            (0, files) => count(files, "file", "files"),
            (folders, 0) => count(folders, "folder", "folders"),
            (folders, files) => format!(
                "{} and {}",
                count(folders, "folder", "folders"),
                count(files, "file", "files")
            ),
        }
    }
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DropOutcome {
    /// No drag in progress or nothing under the pointer.
    NoTarget,
    /// The drop would not change anything.
    Unchanged,
    /// The drop was rejected before any request.
    Blocked(String),
    /// Items were moved.
    Moved(DropSummary),
    /// Items were copied.
    Copied(DropSummary),
    /// The request failed; local state is unchanged.
    Failed(String),
}

/// The drag currently in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    /// What is being dragged.
    pub payload: DragPayload,
    /// Target under the pointer at the last `drag_over`.
    pub over: Option<DropTargetKind>,
}

/// Drives drags from start to drop.
#[derive(Debug)]
pub struct DndOrchestrator {
    services: Services,
    notifier: Arc<dyn Notifier>,
    detector: CollisionDetector,
    session: Option<DragSession>,
}

impl DndOrchestrator {
    /// Creates an orchestrator over `services`.
    pub fn new(services: Services, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            services,
            notifier,
            detector: CollisionDetector::new(),
            session: None,
        }
    }

    /// Registered drop targets.
    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// Drop target registry.
    pub fn detector_mut(&mut self) -> &mut CollisionDetector {
        &mut self.detector
    }

    /// The drag in progress, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Starts dragging `item`. Carries the whole selection when `item` is
    /// part of an active selection.
    pub fn drag_start(&mut self, item: ItemKey, selection: &SelectionState) -> &DragPayload {
        let payload = DragPayload::for_drag(item, selection);
        debug!(item = %item, batch_size = payload.batch_size(), "Drag started");
        &self
            .session
            .insert(DragSession {
                payload,
                over: None,
            })
            .payload
    }

    /// Updates the hovered target.
    pub fn drag_over(&mut self, pointer: Point, drag_rect: Option<Rect>) -> Option<DropTargetKind> {
        let over = self.detector.resolve(pointer, drag_rect).map(|t| t.kind);
        if let Some(session) = self.session.as_mut() {
            session.over = over;
        }
        over
    }

    /// Abandons the drag.
    pub fn drag_cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("Drag cancelled");
        }
    }

    /// Completes the drag at `pointer`.
    ///
    /// A batch drop skips invalid and no-op items, issues one request per
    /// remaining item, and always ends by clearing the selection and
    /// leaving selection mode.
    pub async fn drop(
        &mut self,
        pointer: Point,
        drag_rect: Option<Rect>,
        effect: DropEffect,
        selection: &mut SelectionState,
    ) -> DropOutcome {
        let Some(session) = self.session.take() else {
            return DropOutcome::NoTarget;
        };
        let Some(target) = self.detector.resolve(pointer, drag_rect).map(|t| t.kind) else {
            debug!("Dropped outside every target");
            return DropOutcome::NoTarget;
        };
        let destination = target.destination();

        let tree = match self.services.categories.tree().await {
            Ok(tree) => tree,
            Err(e) => return self.fail(effect.failure_title(), e),
        };
        if let Some(dest) = destination {
            if !tree.contains(&dest) {
                return self.fail(
                    effect.failure_title(),
                    AppError::not_found(format!("Folder {dest} not found")),
                );
            }
        }
        let place = place_name(&tree, destination);

        if session.payload.is_batch() {
            let outcome = self
                .drop_batch(&session.payload, destination, effect, &tree, &place)
                .await;
            selection.exit_mode();
            outcome
        } else {
            self.drop_single(session.payload.item, destination, effect, &tree, &place)
                .await
        }
    }

    async fn drop_single(
        &self,
        item: ItemKey,
        destination: Option<CategoryId>,
        effect: DropEffect,
        tree: &CategoryTree,
        place: &str,
    ) -> DropOutcome {
        let mut summary = DropSummary::default();
        let result = match item {
            ItemKey::Folder(id) => {
                let Some(node) = tree.get(&id) else {
                    return self.fail(
                        effect.failure_title(),
                        AppError::not_found(format!("Folder {id} not found")),
                    );
                };
                if effect == DropEffect::Move && node.category.parent_id == destination {
                    return DropOutcome::Unchanged;
                }
                if !tree.can_reparent(id, destination) {
                    return self.block(effect);
                }
                summary.folders = 1;
                self.apply_folder(id, destination, effect).await
            }
            ItemKey::Material(id) => {
                summary.materials = 1;
                self.apply_material(id, destination, effect).await
            }
        };

        match result {
            Ok(true) => {
                self.notifier.notify(
                    Notification::success(format!("{} {}", effect.verb(), summary.describe()))
                        .with_description(format!("Now in {place}")),
                );
                match effect {
                    DropEffect::Move => DropOutcome::Moved(summary),
                    DropEffect::Copy => DropOutcome::Copied(summary),
                }
            }
            Ok(false) => DropOutcome::Unchanged,
            Err(e) => DropOutcome::Failed(e.message),
        }
    }

    async fn drop_batch(
        &self,
        payload: &DragPayload,
        destination: Option<CategoryId>,
        effect: DropEffect,
        tree: &CategoryTree,
        place: &str,
    ) -> DropOutcome {
        let mut summary = DropSummary::default();

        for id in payload.folders() {
            let valid = match tree.get(&id) {
                None => false,
                Some(node) if effect == DropEffect::Move && node.category.parent_id == destination => {
                    false
                }
                Some(_) => tree.can_reparent(id, destination),
            };
            if !valid {
                warn!(category_id = %id, target = ?destination, "Skipping folder in batch drop");
                summary.skipped += 1;
                continue;
            }
            match self.apply_folder(id, destination, effect).await {
                Ok(true) => summary.folders += 1,
                Ok(false) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }

        let materials = payload.materials();
        match effect {
            DropEffect::Move => self.move_materials(&materials, destination, &mut summary).await,
            DropEffect::Copy => {
                for id in materials {
                    match self.apply_material(id, destination, effect).await {
                        Ok(_) => summary.materials += 1,
                        Err(_) => summary.failed += 1,
                    }
                }
            }
        }

        info!(
            effect = ?effect,
            folders = summary.folders,
            materials = summary.materials,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch drop completed"
        );
        if summary.applied() == 0 {
            return if summary.failed == 0 {
                DropOutcome::Unchanged
            } else {
                DropOutcome::Failed(format!("{} items failed", summary.failed))
            };
        }
        self.notifier.notify(
            Notification::success(format!("{} {}", effect.verb(), summary.describe()))
                .with_description(format!("Now in {place}")),
        );
        match effect {
            DropEffect::Move => DropOutcome::Moved(summary),
            DropEffect::Copy => DropOutcome::Copied(summary),
        }
    }

    async fn move_materials(
        &self,
        ids: &[MaterialId],
        destination: Option<CategoryId>,
        summary: &mut DropSummary,
    ) {
        if ids.is_empty() {
            return;
        }
        let live = match self.services.materials.list().await {
            Ok(live) => live,
            Err(e) => {
                optimistic::report(self.notifier.as_ref(), DropEffect::Move.failure_title(), &e);
                summary.failed += ids.len();
                return;
            }
        };
        let mut movable = Vec::with_capacity(ids.len());
        for id in ids {
            match live.iter().find(|m| m.id == *id) {
                Some(material) if material.category_id != destination => movable.push(*id),
                _ => {
                    debug!(material_id = %id, "Skipping material in batch drop");
                    summary.skipped += 1;
                }
            }
        }
        if movable.is_empty() {
            return;
        }
        match self.services.batch.move_to(&movable, destination).await {
            Ok(report) => {
                summary.materials += report.succeeded.len();
                summary.failed += report.failed.len();
                summary.skipped += report.missing.len();
            }
            Err(e) => {
                optimistic::report(self.notifier.as_ref(), DropEffect::Move.failure_title(), &e);
                summary.failed += movable.len();
            }
        }
    }

    async fn apply_folder(
        &self,
        id: CategoryId,
        destination: Option<CategoryId>,
        effect: DropEffect,
    ) -> AppResult<bool> {
        match effect {
            DropEffect::Move => self.services.categories.move_to(id, destination).await,
            DropEffect::Copy => self
                .services
                .transfer
                .copy_category(id, destination)
                .await
                .map(|_| true),
        }
    }

    async fn apply_material(
        &self,
        id: MaterialId,
        destination: Option<CategoryId>,
        effect: DropEffect,
    ) -> AppResult<bool> {
        match effect {
            DropEffect::Move => self.services.materials.move_to_category(id, destination).await,
            DropEffect::Copy => self
                .services
                .transfer
                .copy_material(id, destination)
                .await
                .map(|_| true),
        }
    }

    fn block(&self, effect: DropEffect) -> DropOutcome {
        let message = "A folder cannot be placed inside itself or one of its subfolders";
        self.notifier
            .notify(Notification::error(effect.blocked_title()).with_description(message));
        DropOutcome::Blocked(message.to_string())
    }

    fn fail(&self, title: &str, error: AppError) -> DropOutcome {
        optimistic::report(self.notifier.as_ref(), title, &error);
        DropOutcome::Failed(error.message)
    }
}

/// Name of a destination folder for messages.
pub fn place_name(tree: &CategoryTree, destination: Option<CategoryId>) -> String {
    destination
        .and_then(|id| tree.get(&id))
        .map(|node| node.category.name.clone())
        .unwrap_or_else(|| ROOT_NAME.to_string())
}
