//! What is being dragged.

use studyhub_core::types::{CategoryId, ItemKey, MaterialId};

use crate::selection::SelectionState;

/// Kind of the grabbed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    /// A folder.
    Folder,
    /// A material.
    Material,
}

/// The grabbed item plus, for selection drags, every selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    /// The item under the pointer when the drag started.
    pub item: ItemKey,
    /// Selected items carried along. Empty for single-item drags.
    pub batch: Vec<ItemKey>,
}

impl DragPayload {
    /// A single-item payload.
    pub fn single(item: ItemKey) -> Self {
        Self {
            item,
            batch: Vec::new(),
        }
    }

    /// The payload for grabbing `item` given the current selection.
    ///
    /// When selection mode is on and `item` is selected, the whole
    /// selection is carried; otherwise only `item`. A one-item selection
    /// is not a batch, so dropping it takes the single-item path and
    /// leaves the selection as it was.
    pub fn for_drag(item: ItemKey, selection: &SelectionState) -> Self {
        if selection.is_active() && !selection.is_empty() && selection.contains(&item) {
            Self {
                item,
                batch: selection.keys().to_vec(),
            }
        } else {
            Self::single(item)
        }
    }

    /// Kind of the grabbed item.
    pub fn kind(&self) -> DragKind {
        if self.item.is_folder() {
            DragKind::Folder
        } else {
            DragKind::Material
        }
    }

    /// Number of items this drag represents.
    pub fn batch_size(&self) -> usize {
        self.batch.len().max(1)
    }

    /// Whether the drag represents more than the grabbed item.
    pub fn is_batch(&self) -> bool {
        self.batch_size() > 1
    }

    fn items(&self) -> &[ItemKey] {
        if self.batch.is_empty() {
            std::slice::from_ref(&self.item)
        } else {
            &self.batch
        }
    }

    /// Folder ids carried, in selection order.
    pub fn folders(&self) -> Vec<CategoryId> {
        self.items().iter().filter_map(ItemKey::as_folder).collect()
    }

    /// Material ids carried, in selection order.
    pub fn materials(&self) -> Vec<MaterialId> {
        self.items().iter().filter_map(ItemKey::as_material).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionUpdateMode;

    #[test]
    fn test_selected_item_carries_selection() {
        let folder = ItemKey::Folder(CategoryId::new());
        let file = ItemKey::Material(MaterialId::new());
        let mut selection = SelectionState::new();
        selection.update_many([folder, file], SelectionUpdateMode::Add);

        let payload = DragPayload::for_drag(file, &selection);
        assert!(payload.is_batch());
        assert_eq!(payload.batch_size(), 2);
        assert_eq!(payload.kind(), DragKind::Material);
        assert_eq!(payload.folders().len(), 1);
        assert_eq!(payload.materials().len(), 1);
    }

    #[test]
    fn test_unselected_item_drags_alone() {
        let mut selection = SelectionState::new();
        selection.update_many([ItemKey::Material(MaterialId::new())], SelectionUpdateMode::Add);
        let other = ItemKey::Folder(CategoryId::new());

        let payload = DragPayload::for_drag(other, &selection);
        assert!(!payload.is_batch());
        assert_eq!(payload.batch_size(), 1);
        assert_eq!(payload.folders(), vec![other.as_folder().expect("folder")]);
    }

    #[test]
    fn test_selection_mode_off_drags_alone() {
        let file = ItemKey::Material(MaterialId::new());
        let mut selection = SelectionState::new();
        selection.update_many([file, ItemKey::Material(MaterialId::new())], SelectionUpdateMode::Add);
        selection.exit_mode();
        assert!(!DragPayload::for_drag(file, &selection).is_batch());
    }

    #[test]
    fn test_one_item_selection_is_not_a_batch() {
        let file = ItemKey::Material(MaterialId::new());
        let mut selection = SelectionState::new();
        selection.update_many([file], SelectionUpdateMode::Add);

        let payload = DragPayload::for_drag(file, &selection);
        assert!(!payload.is_batch());
        assert_eq!(payload.batch_size(), 1);
        assert_eq!(payload.materials(), vec![file.as_material().expect("material")]);
        assert!(selection.is_active());
        assert!(selection.contains(&file));
    }
}
