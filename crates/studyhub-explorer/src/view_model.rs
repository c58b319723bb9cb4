//! The file explorer: current folder, breadcrumb, view mode, selection,
//! lasso and drag-and-drop, and batch actions over the selection.
//!
//! [`ExplorerViewModel`] owns the selection state. Everything else reads
//! it and changes it only through the methods here.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use studyhub_core::config::explorer::{ExplorerConfig, ViewMode};
use studyhub_core::result::AppResult;
use studyhub_core::traits::{Notification, Notifier};
use studyhub_core::types::{CategoryId, ItemKey, TagId};
use studyhub_entity::category::{Category, FlatNode};
use studyhub_entity::material::Material;
use studyhub_service::{
    BatchReport, CategoryScope, DownloadSink, MaterialFilter, MaterialSort, Services, TagEditMode,
};

use crate::dnd::{DndOrchestrator, DragPayload, DropEffect, DropOutcome, DropTargetKind, ROOT_NAME};
use crate::geometry::{Point, Rect};
use crate::lasso::{LassoEngine, LassoSelection, PointerInput, ScrollContainer, SelectableItem};
use crate::selection::{SelectionState, SelectionUpdateMode};

/// One breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Folder id (`None` = root).
    pub id: Option<CategoryId>,
    /// Display name.
    pub name: String,
}

/// Contents of the current folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderListing {
    /// Subfolders, by name.
    pub folders: Vec<Category>,
    /// Materials, in the explorer's sort order.
    pub materials: Vec<Material>,
}

impl FolderListing {
    /// Every item, folders first.
    pub fn keys(&self) -> Vec<ItemKey> {
        self.folders
            .iter()
            .map(|c| ItemKey::Folder(c.id))
            .chain(self.materials.iter().map(|m| ItemKey::Material(m.id)))
            .collect()
    }

    /// Whether the folder is empty.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.materials.is_empty()
    }
}

/// State and actions of one explorer view.
#[derive(Debug)]
pub struct ExplorerViewModel {
    services: Services,
    notifier: Arc<dyn Notifier>,
    current: Option<CategoryId>,
    view_mode: ViewMode,
    sort: MaterialSort,
    selection: SelectionState,
    lasso: LassoEngine,
    dnd: DndOrchestrator,
    expanded: HashSet<CategoryId>,
}

impl ExplorerViewModel {
    /// Opens the explorer at the root folder.
    pub fn new(services: Services, notifier: Arc<dyn Notifier>, config: &ExplorerConfig) -> Self {
        let dnd = DndOrchestrator::new(services.clone(), notifier.clone());
        Self {
            services,
            notifier,
            current: None,
            view_mode: config.default_view_mode,
            sort: MaterialSort::default(),
            selection: SelectionState::new(),
            lasso: LassoEngine::new(),
            dnd,
            expanded: HashSet::new(),
        }
    }

    /// The folder being viewed (`None` = root).
    pub fn current_folder(&self) -> Option<CategoryId> {
        self.current
    }

    /// Opens a folder. Leaves selection mode.
    pub fn navigate(&mut self, folder: Option<CategoryId>) {
        if self.current != folder {
            debug!(folder = ?folder, "Navigating");
            self.current = folder;
            self.selection.exit_mode();
            self.lasso.cancel();
        }
    }

    /// Opens the parent of the current folder.
    pub async fn navigate_up(&mut self) -> AppResult<()> {
        let Some(current) = self.current else {
            return Ok(());
        };
        let tree = self.services.categories.tree().await?;
        let parent = tree
            .ancestor_path(Some(current))
            .iter()
            .rev()
            .nth(1)
            .map(|c| c.id);
        self.navigate(parent);
        Ok(())
    }

    /// Root crumb followed by the path to the current folder.
    pub async fn breadcrumb(&self) -> AppResult<Vec<Breadcrumb>> {
        let tree = self.services.categories.tree().await?;
        let mut crumbs = vec![Breadcrumb {
            id: None,
            name: ROOT_NAME.to_string(),
        }];
        crumbs.extend(tree.ancestor_path(self.current).into_iter().map(|c| Breadcrumb {
            id: Some(c.id),
            name: c.name.clone(),
        }));
        Ok(crumbs)
    }

    /// Grid or list.
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Sets the view mode.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Switches between grid and list.
    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        };
    }

    /// Sets the material order.
    pub fn set_sort(&mut self, sort: MaterialSort) {
        self.sort = sort;
    }

    /// Subfolders and materials of the current folder.
    pub async fn listing(&self) -> AppResult<FolderListing> {
        let tree = self.services.categories.tree().await?;
        let mut folders: Vec<Category> = tree.children_of(self.current).into_iter().cloned().collect();
        folders.sort_by_key(|c| c.name.to_lowercase());
        let filter = MaterialFilter {
            category: CategoryScope::folder(self.current),
            ..MaterialFilter::default()
        };
        let materials = self.services.materials.search(&filter, self.sort).await?;
        Ok(FolderListing { folders, materials })
    }

    /// Navigation tree rows. Only expanded folders show their children.
    pub async fn sidebar(&self) -> AppResult<Vec<FlatNode>> {
        Ok(self.services.categories.tree().await?.flatten(Some(&self.expanded)))
    }

    /// Expands or collapses a navigation tree row.
    pub fn toggle_expanded(&mut self, id: CategoryId) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    /// The selection.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Turns selection mode on or off. Turning it off clears the selection.
    pub fn toggle_selection_mode(&mut self) {
        self.selection.toggle_mode();
    }

    /// Selects or deselects one item.
    pub fn toggle_item(&mut self, key: ItemKey) {
        self.selection.toggle(key);
    }

    /// Selects everything in the current folder.
    pub async fn select_all(&mut self) -> AppResult<()> {
        let keys = self.listing().await?.keys();
        self.selection.enter_mode();
        self.selection.update_many(keys, SelectionUpdateMode::Replace);
        Ok(())
    }

    /// Deselects everything, staying in selection mode.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Replaces the selection with a lasso result.
    pub fn apply_lasso(&mut self, lasso: &LassoSelection) {
        self.selection.enter_mode();
        self.selection.update_many(lasso.keys(), SelectionUpdateMode::Replace);
    }

    /// Pointer-down in the content area.
    pub fn lasso_pointer_down(&mut self, input: PointerInput, container: &ScrollContainer) -> bool {
        self.lasso.pointer_down(input, container)
    }

    /// Pointer-move anywhere.
    pub fn lasso_pointer_move(
        &mut self,
        position: Point,
        container: &ScrollContainer,
        items: &[SelectableItem],
    ) -> bool {
        self.lasso.pointer_move(position, container, items)
    }

    /// Pointer-up anywhere. Commits a running lasso into the selection.
    pub fn lasso_pointer_up(&mut self) -> Option<LassoSelection> {
        let committed = self.lasso.pointer_up()?;
        self.apply_lasso(&committed);
        Some(committed)
    }

    /// The running lasso, for drawing.
    pub fn lasso(&self) -> &LassoEngine {
        &self.lasso
    }

    /// Drag-and-drop state.
    pub fn dnd(&self) -> &DndOrchestrator {
        &self.dnd
    }

    /// Drag-and-drop state, for registering drop targets.
    pub fn dnd_mut(&mut self) -> &mut DndOrchestrator {
        &mut self.dnd
    }

    /// Starts dragging `item`.
    pub fn drag_start(&mut self, item: ItemKey) -> DragPayload {
        self.dnd.drag_start(item, &self.selection).clone()
    }

    /// Updates the hovered drop target.
    pub fn drag_over(&mut self, pointer: Point, drag_rect: Option<Rect>) -> Option<DropTargetKind> {
        self.dnd.drag_over(pointer, drag_rect)
    }

    /// Abandons the drag.
    pub fn drag_cancel(&mut self) {
        self.dnd.drag_cancel();
    }

    /// Drops at `pointer`.
    pub async fn drop(&mut self, pointer: Point, drag_rect: Option<Rect>, effect: DropEffect) -> DropOutcome {
        self.dnd
            .drop(pointer, drag_rect, effect, &mut self.selection)
            .await
    }

    /// Moves the selected materials to the trash.
    pub async fn trash_selected(&mut self) -> AppResult<BatchReport> {
        let ids = self.selection.materials();
        let report = self.services.batch.soft_delete(&ids).await?;
        Ok(self.finish_batch(report, "Moved to trash"))
    }

    /// Permanently deletes the selected materials.
    pub async fn purge_selected(&mut self) -> AppResult<BatchReport> {
        let ids = self.selection.materials();
        let report = self.services.batch.purge(&ids).await?;
        Ok(self.finish_batch(report, "Deleted permanently"))
    }

    /// Moves the selected materials into `target` (`None` = root).
    pub async fn move_selected(&mut self, target: Option<CategoryId>) -> AppResult<BatchReport> {
        let ids = self.selection.materials();
        let report = self.services.batch.move_to(&ids, target).await?;
        Ok(self.finish_batch(report, "Moved"))
    }

    /// Edits the tags of the selected materials.
    pub async fn tag_selected(&mut self, mode: TagEditMode, tag_ids: &[TagId]) -> AppResult<BatchReport> {
        let ids = self.selection.materials();
        let report = self.services.batch.edit_tags(&ids, mode, tag_ids).await?;
        Ok(self.finish_batch(report, "Tags updated"))
    }

    /// Downloads the selected materials one at a time.
    pub async fn download_selected(&mut self, sink: &dyn DownloadSink) -> AppResult<BatchReport> {
        let ids = self.selection.materials();
        let report = self.services.batch.download(&ids, sink).await?;
        Ok(self.finish_batch(report, "Downloaded"))
    }

    fn finish_batch(&mut self, report: BatchReport, title: &str) -> BatchReport {
        if report.is_success() && !report.succeeded.is_empty() {
            let count = report.succeeded.len();
            let noun = if count == 1 { "file" } else { "files" };
            self.notifier
                .notify(Notification::success(title).with_description(format!("{count} {noun}")));
        }
        self.selection.exit_mode();
        report
    }
}
