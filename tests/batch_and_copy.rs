//! Batch tag editing and copying.

mod helpers;

use std::collections::HashSet;

use studyhub_core::error::ErrorKind;
use studyhub_core::types::TagId;
use studyhub_service::{CategoryScope, MaterialFilter, MaterialSort, TagEditMode};

use helpers::TestHub;

async fn tags_of(hub: &TestHub, title: &str) -> HashSet<TagId> {
    hub.services
        .materials
        .refresh()
        .await
        .expect("refresh")
        .into_iter()
        .find(|m| m.title == title)
        .map(|m| m.tag_ids().into_iter().collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_batch_tag_modes() {
    let hub = TestHub::new();
    let a = hub.tag("A").await;
    let b = hub.tag("B").await;
    let c = hub.tag("C").await;
    let d = hub.tag("D").await;
    let first = hub.upload("first", None, &[a, b]).await;
    let second = hub.upload("second", None, &[a, b]).await;
    let ids = [first, second];
    let batch = &hub.services.batch;

    let report = batch.edit_tags(&ids, TagEditMode::Add, &[c]).await.expect("add");
    assert!(report.is_success());
    for title in ["first", "second"] {
        assert_eq!(tags_of(&hub, title).await, HashSet::from([a, b, c]));
    }

    batch.edit_tags(&ids, TagEditMode::Remove, &[a]).await.expect("remove");
    assert_eq!(tags_of(&hub, "first").await, HashSet::from([b, c]));

    batch.edit_tags(&ids, TagEditMode::Replace, &[d]).await.expect("replace");
    assert_eq!(tags_of(&hub, "second").await, HashSet::from([d]));
    assert!(hub.notifier.all().is_empty());
}

#[tokio::test]
async fn test_explorer_tag_selected_filters_by_tag() {
    let hub = TestHub::new();
    let exam = hub.tag("exam").await;
    let tagged = hub.upload("past paper", None, &[]).await;
    hub.upload("lecture", None, &[]).await;

    let mut explorer = hub.explorer();
    explorer.toggle_item(tagged.into());
    let report = explorer
        .tag_selected(TagEditMode::Add, &[exam])
        .await
        .expect("tag");
    assert_eq!(report.succeeded, vec![tagged]);
    assert!(!explorer.selection().is_active());

    hub.services.materials.refresh().await.expect("refresh");
    let filter = MaterialFilter {
        category: CategoryScope::Any,
        tag_ids: vec![exam],
        ..Default::default()
    };
    let found = hub
        .services
        .materials
        .search(&filter, MaterialSort::default())
        .await
        .expect("search");
    assert_eq!(found.iter().map(|m| m.id).collect::<Vec<_>>(), vec![tagged]);
}

#[tokio::test]
async fn test_copy_material_keeps_source() {
    let hub = TestHub::new();
    let math = hub.folder("Math", None).await;
    let source = hub.upload("limits", None, &[]).await;

    let copy = hub
        .services
        .transfer
        .copy_material(source, Some(math))
        .await
        .expect("copy");

    assert_ne!(copy.id, source);
    assert_eq!(copy.category_id, Some(math));
    let original = hub.services.materials.get(source).await.expect("get");
    assert_eq!(original.category_id, None);
    assert_ne!(copy.file_path, original.file_path);
    assert_eq!(hub.blobs.len(), 2);
    let bytes = hub.services.materials.download(copy.id).await.expect("download");
    assert_eq!(bytes.as_ref(), b"contents of limits");
}

#[tokio::test]
async fn test_copy_folder_subtree() {
    let hub = TestHub::new();
    let math = hub.folder("Math", None).await;
    let algebra = hub.folder("Algebra", Some(math)).await;
    let archive = hub.folder("Archive", None).await;
    hub.upload("groups", Some(algebra), &[]).await;
    hub.upload("overview", Some(math), &[]).await;

    let copy = hub
        .services
        .transfer
        .copy_category(math, Some(archive))
        .await
        .expect("copy");

    let tree = hub.services.categories.tree().await.expect("tree");
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.get(&copy.id).and_then(|n| n.category.parent_id), Some(archive));
    let copied_children = &tree.get(&copy.id).expect("copy node").children;
    assert_eq!(copied_children.len(), 1);
    assert_eq!(hub.services.materials.refresh().await.expect("refresh").len(), 4);
    assert_eq!(hub.blobs.len(), 4);

    // The source subtree is untouched.
    assert_eq!(tree.get(&math).and_then(|n| n.category.parent_id), None);
    assert_eq!(tree.get(&algebra).and_then(|n| n.category.parent_id), Some(math));
}

#[tokio::test]
async fn test_copy_folder_into_own_subtree_is_rejected() {
    let hub = TestHub::new();
    let math = hub.folder("Math", None).await;
    let algebra = hub.folder("Algebra", Some(math)).await;

    let err = hub
        .services
        .transfer
        .copy_category(math, Some(algebra))
        .await
        .expect_err("rejected");

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(hub.notifier.error_count(), 1);
    assert_eq!(hub.services.categories.refresh().await.expect("refresh").len(), 2);
}
