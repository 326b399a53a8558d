//! Integration tests for soft delete, restore, force delete, and move.

mod helpers;

use filetree_core::error::ErrorKind;
use filetree_database::NodeRepository;
use filetree_entity::node::NodeUpdate;

use helpers::TestApp;

#[tokio::test]
async fn test_delete_restore_and_cycle_scenario() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    let f = app.file(Some(&b), "F.png", 1024, "image/png").await;
    assert_eq!(f.size_bytes, 1024);

    let trashed = app.lifecycle.soft_delete(&app.ctx, a.id).await.unwrap();
    assert_eq!(trashed, 3);
    for id in [a.id, b.id, f.id] {
        let node = app.reload(id).await;
        assert!(node.is_deleted());
        assert_eq!(node.deleted_at(), Some(app.ctx.request_time));
    }

    let restored = app.lifecycle.restore(&app.ctx, a.id).await.unwrap();
    assert_eq!(restored, 3);
    for id in [a.id, b.id, f.id] {
        let node = app.reload(id).await;
        assert!(!node.is_deleted());
        assert_eq!(node.deleted_at(), None);
    }

    // F is a descendant of B, so B cannot go under F.
    let err = app
        .lifecycle
        .move_node(&app.ctx, b.id, Some(f.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CycleRejected);
    assert_eq!(app.reload(b.id).await.parent_id, Some(a.id));

    let err = app
        .lifecycle
        .move_node(&app.ctx, a.id, Some(b.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CycleRejected);

    let err = app
        .lifecycle
        .move_node(&app.ctx, a.id, Some(a.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CycleRejected);
}

#[tokio::test]
async fn test_soft_delete_keeps_blobs_and_parents() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let f = app.file(Some(&a), "doc.pdf", 10, "application/pdf").await;

    app.lifecycle.soft_delete(&app.ctx, a.id).await.unwrap();

    assert_eq!(app.blobs.len(), 1);
    assert_eq!(app.blobs.total_delete_calls(), 0);
    assert_eq!(app.reload(f.id).await.parent_id, Some(a.id));
    assert!(app.nodes.list_children(&app.ctx, None).await.unwrap().is_empty());
    assert_eq!(app.nodes.list_trash(&app.ctx).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_soft_delete_is_idempotent() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;

    app.lifecycle.soft_delete(&app.ctx, b.id).await.unwrap();
    let first = app.reload(b.id).await.deleted_at();

    let later = filetree_service::RequestContext::new(app.ctx.owner_id);
    assert_eq!(app.lifecycle.soft_delete(&later, a.id).await.unwrap(), 1);
    assert_eq!(app.reload(b.id).await.deleted_at(), first);
    assert_eq!(app.lifecycle.soft_delete(&later, a.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_force_delete_removes_subtree_and_each_blob_once() {
    let app = TestApp::new();
    let root = app.folder(None, "root").await;
    let sub = app.folder(Some(&root), "sub").await;
    let deep = app.folder(Some(&sub), "deep").await;
    let files = vec![
        app.file(Some(&root), "a.txt", 3, "text/plain").await,
        app.file(Some(&sub), "b.zip", 5, "application/zip").await,
        app.file(Some(&deep), "c.mp4", 7, "video/mp4").await,
        app.file(Some(&deep), "d.png", 9, "image/png").await,
    ];
    let keep = app.file(None, "keep.txt", 1, "text/plain").await;
    // Trashed nodes are purged too.
    app.lifecycle.soft_delete(&app.ctx, sub.id).await.unwrap();

    let report = app.lifecycle.force_delete(&app.ctx, root.id).await.unwrap();
    assert_eq!(report.nodes_removed, 7);
    assert_eq!(report.blobs_deleted, 4);
    assert_eq!(report.blobs_missing, 0);
    assert_eq!(report.blobs_failed, 0);

    for id in [root.id, sub.id, deep.id] {
        assert!(!app.exists(id).await);
    }
    for file in &files {
        assert!(!app.exists(file.id).await);
        assert_eq!(app.blobs.delete_calls(file.storage_key.as_deref().unwrap()), 1);
    }
    assert_eq!(app.blobs.total_delete_calls(), 4);
    assert!(app.exists(keep.id).await);
    assert_eq!(app.blobs.len(), 1);
}

#[tokio::test]
async fn test_force_delete_tolerates_missing_blob() {
    let app = TestApp::new();
    let f = app.file(None, "gone.txt", 4, "text/plain").await;
    app.blobs.evict(f.storage_key.as_deref().unwrap());

    let report = app.lifecycle.force_delete(&app.ctx, f.id).await.unwrap();
    assert_eq!(report.nodes_removed, 1);
    assert_eq!(report.blobs_missing, 1);
    assert!(!app.exists(f.id).await);
}

#[tokio::test]
async fn test_move_many_partial_success() {
    let app = TestApp::new();
    let dest = app.folder(None, "dest").await;
    let clash = app.folder(Some(&dest), "item2").await;

    let mut items = Vec::new();
    for i in 0..5 {
        items.push(app.folder(None, &format!("item{i}")).await);
    }
    let ids: Vec<_> = items.iter().map(|n| n.id).collect();

    let outcome = app.lifecycle.move_many(&app.ctx, &ids, Some(dest.id)).await;
    assert_eq!(outcome.succeeded.len(), 4);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].id, items[2].id);
    assert_eq!(outcome.failed[0].kind, ErrorKind::NameConflict);

    for (i, item) in items.iter().enumerate() {
        let expected = if i == 2 { None } else { Some(dest.id) };
        assert_eq!(app.reload(item.id).await.parent_id, expected);
    }
    assert_eq!(app.reload(clash.id).await.parent_id, Some(dest.id));
}

#[tokio::test]
async fn test_delete_many_reports_each_item() {
    let app = TestApp::new();
    let mine = app.folder(None, "mine").await;
    let theirs = app
        .nodes
        .create_folder(&app.stranger(), None, "theirs")
        .await
        .unwrap();
    let missing = filetree_core::types::NodeId::new();

    let outcome = app
        .lifecycle
        .delete_many(&app.ctx, &[mine.id, theirs.id, missing])
        .await;

    assert_eq!(outcome.succeeded, vec![mine.id]);
    let kinds: Vec<ErrorKind> = outcome.failed.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::PermissionDenied, ErrorKind::NotFound]);
    assert!(!app.reload(theirs.id).await.is_deleted());
}

#[tokio::test]
async fn test_restore_name_conflict_mutates_nothing() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let report = app.file(Some(&a), "report.txt", 3, "text/plain").await;
    app.lifecycle.soft_delete(&app.ctx, a.id).await.unwrap();

    // A new "A" takes the name while the old one is in the trash.
    app.folder(None, "A").await;

    let err = app.lifecycle.restore(&app.ctx, a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameConflict);
    assert!(app.reload(a.id).await.is_deleted());
    assert!(app.reload(report.id).await.is_deleted());
}

#[tokio::test]
async fn test_restore_under_trashed_parent_is_allowed() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let b = app.folder(Some(&a), "B").await;
    app.lifecycle.soft_delete(&app.ctx, a.id).await.unwrap();

    assert_eq!(app.lifecycle.restore(&app.ctx, b.id).await.unwrap(), 1);
    assert!(!app.reload(b.id).await.is_deleted());
    assert!(app.reload(a.id).await.is_deleted());
}

#[tokio::test]
async fn test_move_rules() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;
    let f = app.file(None, "f.txt", 1, "text/plain").await;
    let b = app.folder(Some(&a), "B").await;

    let err = app
        .lifecycle
        .move_node(&app.ctx, b.id, Some(f.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let foreign = app
        .nodes
        .create_folder(&app.stranger(), None, "foreign")
        .await
        .unwrap();
    let err = app
        .lifecycle
        .move_node(&app.ctx, b.id, Some(foreign.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let moved = app.lifecycle.move_node(&app.ctx, b.id, None).await.unwrap();
    assert_eq!(moved.parent_id, None);
    let moved = app.lifecycle.move_node(&app.ctx, f.id, Some(b.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(b.id));
}

#[tokio::test]
async fn test_move_respects_depth_limit() {
    let app = TestApp::with_max_depth(4);
    let a = app.folder(None, "a").await;
    let b = app.folder(Some(&a), "b").await;
    let c = app.folder(Some(&b), "c").await;
    let x = app.folder(None, "x").await;
    let y = app.folder(Some(&x), "y").await;

    // x/y under c would put y four levels down.
    let err = app
        .lifecycle
        .move_node(&app.ctx, x.id, Some(c.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert_eq!(app.reload(x.id).await.parent_id, None);

    app.lifecycle.move_node(&app.ctx, x.id, Some(b.id)).await.unwrap();
    assert_eq!(
        app.paths.full_path(&app.ctx, y.id).await.unwrap(),
        "/a/b/x/y"
    );

    app.nodes.create_folder(&app.ctx, Some(c.id), "d").await.unwrap();
    let err = app.nodes.create_folder(&app.ctx, Some(y.id), "z").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_stale_writer_gets_conflict() {
    let app = TestApp::new();
    let a = app.folder(None, "A").await;

    let first = app.repo.update(a.id, &NodeUpdate::rename("B"), a.version).await;
    let second = app.repo.update(a.id, &NodeUpdate::rename("C"), a.version).await;

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err().kind, ErrorKind::Conflict);
    assert_eq!(app.reload(a.id).await.name, "B");
}
