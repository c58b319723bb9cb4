//! End-to-end explorer flows: folders, drag-and-drop, lasso.

mod helpers;

use studyhub_core::error::ErrorKind;
use studyhub_core::traits::NotificationVariant;
use studyhub_core::types::CategoryId;
use studyhub_explorer::lasso::HitTarget;
use studyhub_explorer::{
    DropEffect, DropOutcome, DropTarget, DropTargetKind, Point, PointerInput, Rect, ScrollContainer,
    SelectableItem,
};

use helpers::TestHub;

#[tokio::test]
async fn test_math_algebra_scenario() {
    let hub = TestHub::new();
    let math = hub.folder("Math", None).await;
    let algebra = hub.folder("Algebra", Some(math)).await;
    let notes = hub.upload("notes", None, &[]).await;

    // Math under Algebra would be a cycle.
    let err = hub
        .services
        .categories
        .move_to(math, Some(algebra))
        .await
        .expect_err("cycle rejected");
    assert_eq!(err.kind, ErrorKind::Validation);
    let tree = hub.services.categories.tree().await.expect("tree");
    assert_eq!(tree.get(&math).and_then(|n| n.category.parent_id), None);
    assert_eq!(tree.get(&algebra).and_then(|n| n.category.parent_id), Some(math));
    assert!(tree.is_descendant(math, algebra));
    assert!(!tree.is_descendant(algebra, math));

    // Drag the root material onto the Algebra row of the navigation tree.
    let mut explorer = hub.explorer();
    explorer.dnd_mut().detector_mut().register(DropTarget::new(
        DropTargetKind::TreeFolder(algebra),
        Rect::new(0.0, 60.0, 240.0, 28.0),
    ));
    explorer.drag_start(notes.into());
    let outcome = explorer
        .drop(Point::new(40.0, 70.0), None, DropEffect::Move)
        .await;
    assert!(matches!(outcome, DropOutcome::Moved(_)));

    let moved = hub.services.materials.get(notes).await.expect("get");
    assert_eq!(moved.category_id, Some(algebra));
    let root = explorer.listing().await.expect("listing");
    assert!(root.materials.iter().all(|m| m.id != notes));
    assert_eq!(root.folders.len(), 1);

    explorer.navigate(Some(algebra));
    let inside = explorer.listing().await.expect("listing");
    assert_eq!(inside.materials.iter().map(|m| m.id).collect::<Vec<_>>(), vec![notes]);
}

#[tokio::test]
async fn test_dragging_folder_onto_own_child_is_blocked() {
    let hub = TestHub::new();
    let math = hub.folder("Math", None).await;
    let algebra = hub.folder("Algebra", Some(math)).await;

    let mut explorer = hub.explorer();
    explorer.dnd_mut().detector_mut().register(DropTarget::new(
        DropTargetKind::TreeFolder(algebra),
        Rect::new(0.0, 0.0, 200.0, 30.0),
    ));
    explorer.drag_start(math.into());
    let outcome = explorer
        .drop(Point::new(10.0, 10.0), None, DropEffect::Move)
        .await;

    assert!(matches!(outcome, DropOutcome::Blocked(_)));
    let sent = hub.notifier.all();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].variant, NotificationVariant::Destructive);
    let tree = hub.services.categories.tree().await.expect("tree");
    assert_eq!(tree.get(&math).and_then(|n| n.category.parent_id), None);
}

#[tokio::test]
async fn test_drop_on_folder_card_inside_content_area() {
    let hub = TestHub::new();
    let physics = hub.folder("Physics", None).await;
    let file = hub.upload("optics", None, &[]).await;

    let mut explorer = hub.explorer();
    let detector = explorer.dnd_mut().detector_mut();
    detector.register(DropTarget::new(
        DropTargetKind::CurrentDirectory(None),
        Rect::new(250.0, 0.0, 1000.0, 800.0),
    ));
    detector.register(DropTarget::new(
        DropTargetKind::GridFolder(physics),
        Rect::new(300.0, 100.0, 160.0, 120.0),
    ));

    explorer.drag_start(file.into());
    let over = explorer.drag_over(Point::new(380.0, 160.0), None);
    assert_eq!(over, Some(DropTargetKind::GridFolder(physics)));
    let outcome = explorer
        .drop(Point::new(380.0, 160.0), None, DropEffect::Move)
        .await;

    assert!(matches!(outcome, DropOutcome::Moved(_)));
    let moved = hub.services.materials.get(file).await.expect("get");
    assert_eq!(moved.category_id, Some(physics));
}

#[tokio::test]
async fn test_lasso_then_batch_drag() {
    let hub = TestHub::new();
    let archive = hub.folder("Archive", None).await;
    let a = hub.upload("a", None, &[]).await;
    let b = hub.upload("b", None, &[]).await;
    let c = hub.upload("c", None, &[]).await;

    let mut explorer = hub.explorer();
    let container = ScrollContainer {
        bounds: Rect::new(250.0, 0.0, 1000.0, 800.0),
        scroll: Point::default(),
    };
    let items = [
        SelectableItem::new(archive.into(), Rect::new(10.0, 10.0, 150.0, 120.0)),
        SelectableItem::new(a.into(), Rect::new(180.0, 10.0, 150.0, 120.0)),
        SelectableItem::new(b.into(), Rect::new(350.0, 10.0, 150.0, 120.0)),
        SelectableItem::new(c.into(), Rect::new(10.0, 150.0, 150.0, 120.0)),
    ];
    let down = PointerInput {
        position: Point::new(420.0, 5.0),
        shift: true,
        target: HitTarget::Content,
    };
    assert!(explorer.lasso_pointer_down(down, &container));
    explorer.lasso_pointer_move(Point::new(700.0, 100.0), &container, &items);
    let lasso = explorer.lasso_pointer_up().expect("lasso");
    assert_eq!(lasso.materials, vec![a, b]);
    assert_eq!(explorer.selection().len(), 2);

    explorer.dnd_mut().detector_mut().register(DropTarget::new(
        DropTargetKind::GridFolder(archive),
        Rect::new(260.0, 10.0, 150.0, 120.0),
    ));
    let payload = explorer.drag_start(a.into());
    assert_eq!(payload.batch_size(), 2);
    let outcome = explorer
        .drop(Point::new(300.0, 50.0), None, DropEffect::Move)
        .await;

    let DropOutcome::Moved(summary) = outcome else {
        panic!("expected a move, got {outcome:?}");
    };
    assert_eq!(summary.materials, 2);
    assert!(!explorer.selection().is_active());
    let title = hub.notifier.all().pop().expect("notification").title;
    assert_eq!(title, "Moved 2 files");

    let root = explorer.listing().await.expect("listing");
    assert_eq!(root.materials.iter().map(|m| m.id).collect::<Vec<_>>(), vec![c]);
}

#[tokio::test]
async fn test_move_selected_into_missing_folder_is_rejected() {
    let hub = TestHub::new();
    let notes = hub.upload("notes", None, &[]).await;
    let mut explorer = hub.explorer();
    explorer.toggle_item(notes.into());
    hub.notifier.take();

    let err = explorer
        .move_selected(Some(CategoryId::new()))
        .await
        .expect_err("missing folder");

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(hub.notifier.error_count(), 1);
    let root = explorer.listing().await.expect("listing");
    assert_eq!(root.materials.iter().map(|m| m.id).collect::<Vec<_>>(), vec![notes]);
}
