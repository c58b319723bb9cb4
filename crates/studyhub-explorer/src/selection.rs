//! Explorer selection state.
//!
//! Owned by the view-model and changed only through these setters. The
//! revision counter increments on every change so views can cheaply detect
//! updates.

use std::collections::HashSet;

use studyhub_core::types::{CategoryId, ItemKey, MaterialId};

/// How a multi-item update combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionUpdateMode {
    /// Discard the current selection first.
    Replace,
    /// Union.
    Add,
    /// Flip membership of each item.
    Toggle,
}

/// Selected folders and materials, plus whether selection mode is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    mode: bool,
    items: HashSet<ItemKey>,
    order: Vec<ItemKey>,
    revision: u64,
}

impl SelectionState {
    /// An empty selection with selection mode off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether selection mode is on.
    pub fn is_active(&self) -> bool {
        self.mode
    }

    /// Monotonic revision incremented whenever the selection changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }

    /// Turns selection mode on.
    pub fn enter_mode(&mut self) {
        if !self.mode {
            self.mode = true;
            self.bump();
        }
    }

    /// Turns selection mode off and clears the selection.
    pub fn exit_mode(&mut self) {
        if self.mode || !self.items.is_empty() {
            self.mode = false;
            self.items.clear();
            self.order.clear();
            self.bump();
        }
    }

    /// Toggles selection mode; leaving it clears the selection.
    pub fn toggle_mode(&mut self) {
        if self.mode {
            self.exit_mode();
        } else {
            self.enter_mode();
        }
    }

    /// Whether the item is selected.
    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.contains(key)
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Selected items in selection order.
    pub fn keys(&self) -> &[ItemKey] {
        &self.order
    }

    /// Selected folder ids in selection order.
    pub fn folders(&self) -> Vec<CategoryId> {
        self.order.iter().filter_map(ItemKey::as_folder).collect()
    }

    /// Selected material ids in selection order.
    pub fn materials(&self) -> Vec<MaterialId> {
        self.order.iter().filter_map(ItemKey::as_material).collect()
    }

    /// Flips one item. Selecting turns selection mode on.
    pub fn toggle(&mut self, key: ItemKey) {
        self.update_many([key], SelectionUpdateMode::Toggle);
    }

    /// Selects many items at once. A non-empty result turns selection
    /// mode on.
    pub fn update_many(&mut self, keys: impl IntoIterator<Item = ItemKey>, mode: SelectionUpdateMode) {
        let before = (self.items.len(), self.revision);
        let mut changed = false;
        if mode == SelectionUpdateMode::Replace && !self.items.is_empty() {
            self.items.clear();
            self.order.clear();
            changed = true;
        }
        for key in keys {
            if self.items.insert(key) {
                self.order.push(key);
                changed = true;
            } else if mode == SelectionUpdateMode::Toggle {
                self.items.remove(&key);
                self.order.retain(|k| *k != key);
                changed = true;
            }
        }
        if !self.items.is_empty() {
            self.mode = true;
        }
        if changed || before.0 != self.items.len() {
            self.bump();
        }
    }

    /// Clears the selection but stays in selection mode.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.order.clear();
            self.bump();
        }
    }
}
