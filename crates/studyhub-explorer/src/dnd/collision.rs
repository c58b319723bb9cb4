//! Drop-target collision resolution.
//!
//! Folder tree rows, folder cards, the root zone and the content area can
//! all overlap under the pointer. Resolution runs three passes and stops
//! at the first that yields a candidate:
//!
//! 1. targets whose bounds contain the pointer,
//! 2. targets whose bounds intersect the dragged item's rectangle,
//! 3. the target whose center is nearest the pointer.
//!
//! Within a pass the lowest priority number wins, then the highest
//! `z_index`, then the target registered last.

use std::cmp::Ordering;

use studyhub_core::types::CategoryId;

use crate::geometry::{Point, Rect};

/// A drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropTargetKind {
    /// A folder row in the navigation tree.
    TreeFolder(CategoryId),
    /// A folder card in the content grid.
    GridFolder(CategoryId),
    /// The root zone.
    Root,
    /// The content area of the folder being viewed (`None` = root).
    CurrentDirectory(Option<CategoryId>),
}

impl DropTargetKind {
    /// Resolution priority; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            Self::TreeFolder(_) => 1,
            Self::GridFolder(_) => 2,
            Self::Root => 3,
            Self::CurrentDirectory(_) => 4,
        }
    }

    /// The category a drop here lands in (`None` = root).
    pub fn destination(&self) -> Option<CategoryId> {
        match self {
            Self::TreeFolder(id) | Self::GridFolder(id) => Some(*id),
            Self::Root => None,
            Self::CurrentDirectory(id) => *id,
        }
    }
}

/// A registered drop zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    /// What the zone is.
    pub kind: DropTargetKind,
    /// Bounds in viewport coordinates.
    pub rect: Rect,
    /// Stacking order; higher is on top.
    pub z_index: i32,
}

impl DropTarget {
    /// Creates a target with `z_index` 0.
    pub fn new(kind: DropTargetKind, rect: Rect) -> Self {
        Self {
            kind,
            rect,
            z_index: 0,
        }
    }

    /// Sets the stacking order.
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// Registered drop targets, in registration order.
#[derive(Debug, Clone, Default)]
pub struct CollisionDetector {
    targets: Vec<DropTarget>,
}

impl CollisionDetector {
    /// An empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target. Re-registering a kind replaces its bounds and
    /// moves it to the end of the registration order.
    pub fn register(&mut self, target: DropTarget) {
        self.targets.retain(|t| t.kind != target.kind);
        self.targets.push(target);
    }

    /// Removes a target.
    pub fn unregister(&mut self, kind: &DropTargetKind) {
        self.targets.retain(|t| t.kind != *kind);
    }

    /// Removes every target.
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Registered targets.
    pub fn targets(&self) -> &[DropTarget] {
        &self.targets
    }

    /// Resolves the target under `pointer`.
    pub fn resolve(&self, pointer: Point, drag_rect: Option<Rect>) -> Option<&DropTarget> {
        let indexed = || self.targets.iter().enumerate();

        let contained = indexed().filter(|(_, t)| t.rect.contains(pointer));
        if let Some((_, target)) = contained.min_by(|a, b| rank(a, b)) {
            return Some(target);
        }

        if let Some(drag) = drag_rect {
            let touching = indexed().filter(|(_, t)| t.rect.intersects(&drag));
            if let Some((_, target)) = touching.min_by(|a, b| rank(a, b)) {
                return Some(target);
            }
        }

        indexed()
            .min_by(|a, b| {
                let da = a.1.rect.center().distance(pointer);
                let db = b.1.rect.center().distance(pointer);
                da.total_cmp(&db).then_with(|| rank(a, b))
            })
            .map(|(_, target)| target)
    }
}

/// Orders candidates best-first.
fn rank(a: &(usize, &DropTarget), b: &(usize, &DropTarget)) -> Ordering {
    a.1.kind
        .priority()
        .cmp(&b.1.kind.priority())
        .then_with(|| b.1.z_index.cmp(&a.1.z_index))
        .then_with(|| b.0.cmp(&a.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> (CollisionDetector, CategoryId) {
        let folder = CategoryId::new();
        let mut detector = CollisionDetector::new();
        detector.register(DropTarget::new(
            DropTargetKind::CurrentDirectory(None),
            Rect::new(250.0, 0.0, 1000.0, 800.0),
        ));
        detector.register(DropTarget::new(
            DropTargetKind::GridFolder(folder),
            Rect::new(300.0, 100.0, 120.0, 90.0),
        ));
        detector.register(DropTarget::new(
            DropTargetKind::Root,
            Rect::new(0.0, 0.0, 240.0, 40.0),
        ));
        (detector, folder)
    }

    #[test]
    fn test_folder_card_beats_content_area() {
        let (detector, folder) = layout();
        let hit = detector
            .resolve(Point::new(360.0, 145.0), None)
            .expect("target");
        assert_eq!(hit.kind, DropTargetKind::GridFolder(folder));
        assert_eq!(hit.kind.destination(), Some(folder));
    }

    #[test]
    fn test_content_area_outside_cards() {
        let (detector, _) = layout();
        let hit = detector.resolve(Point::new(900.0, 600.0), None).expect("target");
        assert_eq!(hit.kind, DropTargetKind::CurrentDirectory(None));
    }

    #[test]
    fn test_tree_row_wins_over_everything() {
        let (mut detector, _) = layout();
        let row = CategoryId::new();
        detector.register(DropTarget::new(
            DropTargetKind::TreeFolder(row),
            Rect::new(300.0, 120.0, 200.0, 24.0),
        ));
        let hit = detector.resolve(Point::new(310.0, 130.0), None).expect("target");
        assert_eq!(hit.kind, DropTargetKind::TreeFolder(row));
    }

    #[test]
    fn test_intersection_then_nearest_center() {
        let (detector, folder) = layout();
        // Pointer in the gap left of the content area.
        let drag = Rect::new(235.0, 90.0, 80.0, 40.0);
        let hit = detector.resolve(Point::new(245.0, 300.0), Some(drag)).expect("target");
        assert_eq!(hit.kind, DropTargetKind::GridFolder(folder));

        let hit = detector.resolve(Point::new(100.0, 60.0), None).expect("target");
        assert_eq!(hit.kind, DropTargetKind::Root);
    }

    #[test]
    fn test_same_priority_tie_break() {
        let (a, b) = (CategoryId::new(), CategoryId::new());
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut detector = CollisionDetector::new();
        detector.register(DropTarget::new(DropTargetKind::GridFolder(a), rect).with_z_index(5));
        detector.register(DropTarget::new(DropTargetKind::GridFolder(b), rect));
        let p = Point::new(50.0, 50.0);
        assert_eq!(detector.resolve(p, None).map(|t| t.kind), Some(DropTargetKind::GridFolder(a)));

        detector.register(DropTarget::new(DropTargetKind::GridFolder(a), rect));
        assert_eq!(detector.resolve(p, None).map(|t| t.kind), Some(DropTargetKind::GridFolder(a)));
        detector.register(DropTarget::new(DropTargetKind::GridFolder(b), rect));
        assert_eq!(detector.resolve(p, None).map(|t| t.kind), Some(DropTargetKind::GridFolder(b)));
    }

    #[test]
    fn test_empty_detector() {
        assert!(CollisionDetector::new().resolve(Point::default(), None).is_none());
    }
}
