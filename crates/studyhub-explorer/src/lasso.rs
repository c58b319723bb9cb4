//! Rectangle ("lasso") multi-select over a scrollable container.
//!
//! The engine is a two-state machine driven by pointer events:
//!
//! - **idle → active** on a shift + pointer-down inside the container that
//!   does not land on an interactive element. The pointer position becomes
//!   the anchor and a zero-size rectangle is seeded.
//! - **active**: every pointer-move recomputes the rectangle between the
//!   anchor and the pointer and the pending selection, synchronously.
//! - **active → idle** on pointer-up anywhere. The pending set is committed,
//!   split into folders and materials by the item marker prefix, and
//!   reported to the completion callback.
//!
//! Positions passed in are viewport coordinates; the rectangle and item
//! bounds are kept in content coordinates so scrolling while dragging does
//! not move the anchor.

use std::fmt;

use tracing::debug;

use studyhub_core::types::{CategoryId, ItemKey, MaterialId};

use crate::geometry::{Point, Rect};

/// Interactive elements the lasso never starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveKind {
    /// A button.
    Button,
    /// A text input.
    Input,
    /// A checkbox.
    Checkbox,
    /// Anything marked draggable.
    Draggable,
    /// A link.
    Link,
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Container background or a non-interactive item area.
    Content,
    /// An interactive descendant.
    Interactive(InteractiveKind),
}

/// A pointer-down event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Viewport position.
    pub position: Point,
    /// Whether shift is held.
    pub shift: bool,
    /// Element under the pointer.
    pub target: HitTarget,
}

/// The scrollable container the lasso operates in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollContainer {
    /// Container bounds in viewport coordinates.
    pub bounds: Rect,
    /// Current scroll offset.
    pub scroll: Point,
}

impl ScrollContainer {
    /// Converts a viewport position to content coordinates.
    pub fn to_content(&self, viewport: Point) -> Point {
        Point::new(
            viewport.x - self.bounds.x + self.scroll.x,
            viewport.y - self.bounds.y + self.scroll.y,
        )
    }
}

/// A selectable element: its `folder-<id>` / `material-<id>` marker and
/// its bounds in content coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectableItem {
    /// Item marker.
    pub marker: String,
    /// Bounds in content coordinates.
    pub rect: Rect,
}

impl SelectableItem {
    /// An item for `key` at `rect`.
    pub fn new(key: ItemKey, rect: Rect) -> Self {
        Self {
            marker: key.to_string(),
            rect,
        }
    }
}

/// A committed lasso selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LassoSelection {
    /// Selected folders.
    pub folders: Vec<CategoryId>,
    /// Selected materials.
    pub materials: Vec<MaterialId>,
}

impl LassoSelection {
    fn from_markers(markers: &[String]) -> Self {
        let mut selection = Self::default();
        for marker in markers {
            match marker.parse::<ItemKey>() {
                Ok(ItemKey::Folder(id)) => selection.folders.push(id),
                Ok(ItemKey::Material(id)) => selection.materials.push(id),
                Err(_) => debug!(marker = %marker, "Ignoring unrecognized lasso marker"),
            }
        }
        selection
    }

    /// All selected items, folders first.
    pub fn keys(&self) -> Vec<ItemKey> {
        self.folders
            .iter()
            .map(|id| ItemKey::Folder(*id))
            .chain(self.materials.iter().map(|id| ItemKey::Material(*id)))
            .collect()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.materials.is_empty()
    }

    /// Number of selected items.
    pub fn len(&self) -> usize {
        self.folders.len() + self.materials.len()
    }
}

type CompletionCallback = Box<dyn FnMut(&LassoSelection) + Send>;

#[derive(Debug, Clone, PartialEq)]
enum LassoState {
    Idle,
    Active {
        anchor: Point,
        rect: Rect,
        pending: Vec<String>,
    },
}

/// Pointer-driven rectangle selection.
pub struct LassoEngine {
    state: LassoState,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for LassoEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LassoEngine")
            .field("state", &self.state)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for LassoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LassoEngine {
    /// An idle engine without a completion callback.
    pub fn new() -> Self {
        Self {
            state: LassoState::Idle,
            on_complete: None,
        }
    }

    /// Sets the callback invoked with each committed selection.
    pub fn on_complete(mut self, callback: impl FnMut(&LassoSelection) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Whether a lasso is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, LassoState::Active { .. })
    }

    /// Current rectangle in content coordinates, while active.
    pub fn rect(&self) -> Option<Rect> {
        match &self.state {
            LassoState::Active { rect, .. } => Some(*rect),
            LassoState::Idle => None,
        }
    }

    /// Markers currently inside the lasso, in item order.
    pub fn pending(&self) -> &[String] {
        match &self.state {
            LassoState::Active { pending, .. } => pending,
            LassoState::Idle => &[],
        }
    }

    /// Handles a pointer-down. Returns `true` if a lasso started.
    pub fn pointer_down(&mut self, input: PointerInput, container: &ScrollContainer) -> bool {
        if self.is_active()
            || !input.shift
            || !container.bounds.contains(input.position)
            || matches!(input.target, HitTarget::Interactive(_))
        {
            return false;
        }
        let anchor = container.to_content(input.position);
        debug!(x = anchor.x, y = anchor.y, "Lasso started");
        self.state = LassoState::Active {
            anchor,
            rect: Rect::from_points(anchor, anchor),
            pending: Vec::new(),
        };
        true
    }

    /// Handles a pointer-move. Recomputes the rectangle and the pending set
    /// from scratch. Returns `false` when idle.
    pub fn pointer_move(
        &mut self,
        position: Point,
        container: &ScrollContainer,
        items: &[SelectableItem],
    ) -> bool {
        let LassoState::Active {
            anchor,
            rect,
            pending,
        } = &mut self.state
        else {
            return false;
        };
        *rect = Rect::from_points(*anchor, container.to_content(position));
        pending.clear();
        pending.extend(
            items
                .iter()
                .filter(|item| rect.intersects(&item.rect))
                .map(|item| item.marker.clone()),
        );
        true
    }

    /// Handles a pointer-up anywhere. Commits the pending set and returns
    /// it, or `None` when idle.
    pub fn pointer_up(&mut self) -> Option<LassoSelection> {
        let LassoState::Active { pending, .. } = std::mem::replace(&mut self.state, LassoState::Idle)
        else {
            return None;
        };
        let selection = LassoSelection::from_markers(&pending);
        debug!(
            folders = selection.folders.len(),
            materials = selection.materials.len(),
            "Lasso committed"
        );
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&selection);
        }
        Some(selection)
    }

    /// Drops an in-progress lasso without committing.
    pub fn cancel(&mut self) {
        self.state = LassoState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn container() -> ScrollContainer {
        ScrollContainer {
            bounds: Rect::new(100.0, 50.0, 800.0, 600.0),
            scroll: Point::default(),
        }
    }

    fn shift_down(x: f64, y: f64) -> PointerInput {
        PointerInput {
            position: Point::new(x, y),
            shift: true,
            target: HitTarget::Content,
        }
    }

    fn marker(id: MaterialId) -> String {
        ItemKey::Material(id).to_string()
    }

    fn grid() -> (Vec<SelectableItem>, CategoryId, MaterialId, MaterialId) {
        let folder = CategoryId::new();
        let (near, far) = (MaterialId::new(), MaterialId::new());
        let items = vec![
            SelectableItem::new(folder.into(), Rect::new(10.0, 10.0, 100.0, 80.0)),
            SelectableItem::new(near.into(), Rect::new(130.0, 10.0, 100.0, 80.0)),
            SelectableItem::new(far.into(), Rect::new(500.0, 400.0, 100.0, 80.0)),
        ];
        (items, folder, near, far)
    }

    #[test]
    fn test_partial_overlap_selects() {
        let (items, folder, near, _) = grid();
        let mut lasso = LassoEngine::new();
        assert!(lasso.pointer_down(shift_down(100.0, 50.0), &container()));
        // Content (0,0) to (150,50) clips the second card.
        lasso.pointer_move(Point::new(250.0, 100.0), &container(), &items);
        let selection = lasso.pointer_up().expect("committed");
        assert_eq!(selection.folders, vec![folder]);
        assert_eq!(selection.materials, vec![near]);
        assert!(!lasso.is_active());
    }

    #[test]
    fn test_full_containment_and_zero_overlap() {
        let (items, _, _, far) = grid();
        let mut lasso = LassoEngine::new();
        lasso.pointer_down(shift_down(580.0, 430.0), &container());
        lasso.pointer_move(Point::new(750.0, 580.0), &container(), &items);
        assert_eq!(lasso.pending(), &[marker(far)]);

        lasso.pointer_move(Point::new(590.0, 440.0), &container(), &items);
        assert!(lasso.pending().is_empty());
        assert!(lasso.pointer_up().expect("committed").is_empty());
    }

    #[test]
    fn test_requires_shift_and_non_interactive_target() {
        let mut lasso = LassoEngine::new();
        let mut input = shift_down(200.0, 200.0);
        input.shift = false;
        assert!(!lasso.pointer_down(input, &container()));

        for kind in [
            InteractiveKind::Button,
            InteractiveKind::Input,
            InteractiveKind::Checkbox,
            InteractiveKind::Draggable,
            InteractiveKind::Link,
        ] {
            let input = PointerInput {
                target: HitTarget::Interactive(kind),
                ..shift_down(200.0, 200.0)
            };
            assert!(!lasso.pointer_down(input, &container()));
        }
        assert!(!lasso.pointer_down(shift_down(20.0, 20.0), &container()));
        assert!(lasso.pointer_up().is_none());
    }

    #[test]
    fn test_scroll_adjusts_coordinates() {
        let (items, _, _, far) = grid();
        let mut scrolled = container();
        scrolled.scroll = Point::new(0.0, 350.0);
        let mut lasso = LassoEngine::new();
        lasso.pointer_down(shift_down(580.0, 90.0), &scrolled);
        lasso.pointer_move(Point::new(620.0, 110.0), &scrolled, &items);
        assert_eq!(lasso.rect(), Some(Rect::new(480.0, 390.0, 40.0, 20.0)));
        assert_eq!(lasso.pending(), &[marker(far)]);
    }

    #[test]
    fn test_pointer_up_outside_container_reports_to_callback() {
        let (items, folder, _, _) = grid();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut lasso = LassoEngine::new().on_complete(move |s| {
            sink.lock().expect("lock").push(s.clone());
        });
        lasso.pointer_down(shift_down(105.0, 55.0), &container());
        lasso.pointer_move(Point::new(-40.0, -40.0), &container(), &items);
        let selection = lasso.pointer_up().expect("committed");
        assert!(selection.folders.is_empty());

        lasso.pointer_down(shift_down(105.0, 55.0), &container());
        lasso.pointer_move(Point::new(160.0, 100.0), &container(), &items);
        lasso.pointer_up();
        let calls = seen.lock().expect("lock");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].folders, vec![folder]);
    }
}
