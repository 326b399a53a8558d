//! Integration tests for the dashboard aggregates.

mod helpers;

use filetree_entity::node::FileCategory;
use filetree_entity::stats::{NodeStatistics, StorageUsage};

use helpers::TestApp;

async fn populated() -> TestApp {
    let app = TestApp::new();
    let media = app.folder(None, "media").await;
    let docs = app.folder(None, "docs").await;
    app.file(Some(&media), "a.png", 100, "image/png").await;
    app.file(Some(&media), "b.jpg", 50, "image/jpeg").await;
    app.file(Some(&media), "c.mp4", 1000, "video/mp4").await;
    app.file(Some(&docs), "d.pdf", 30, "application/pdf").await;
    app.file(Some(&docs), "e.zip", 70, "application/zip").await;
    app.file(None, "f.bin", 5, "application/octet-stream").await;
    app
}

#[tokio::test]
async fn test_statistics_and_usage() {
    let app = populated().await;

    assert_eq!(
        app.dashboard.statistics().await.unwrap(),
        NodeStatistics {
            total_files: 6,
            total_folders: 2,
            total_images: 2,
            total_videos: 1,
            total_documents: 1,
            total_archives: 1,
            trashed_nodes: 0,
        }
    );
    assert_eq!(
        app.dashboard.storage_usage().await.unwrap(),
        StorageUsage {
            total_bytes: 1255,
            image_bytes: 150,
            video_bytes: 1000,
            document_bytes: 30,
            archive_bytes: 70,
        }
    );
}

#[tokio::test]
async fn test_trashed_nodes_leave_the_totals() {
    let app = populated().await;
    let media = app
        .nodes
        .list_children(&app.ctx, None)
        .await
        .unwrap()
        .into_iter()
        .find(|n| n.name == "media")
        .unwrap();
    app.lifecycle.soft_delete(&app.ctx, media.id).await.unwrap();

    let stats = app.dashboard.statistics().await.unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_folders, 1);
    assert_eq!(stats.total_images, 0);
    assert_eq!(stats.trashed_nodes, 4);

    let categories: Vec<FileCategory> = app
        .dashboard
        .breakdown()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(
        categories,
        vec![FileCategory::Document, FileCategory::Archive, FileCategory::Other]
    );
}

#[tokio::test]
async fn test_recent_files() {
    let app = TestApp::new();
    let mut uploaded = Vec::new();
    for i in 0..4 {
        uploaded.push(app.file(None, &format!("f{i}.txt"), 1, "text/plain").await);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    app.folder(None, "folder").await;

    let recent = app.dashboard.recent_files(3).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![uploaded[3].id, uploaded[2].id, uploaded[1].id]);

    assert!(app.dashboard.recent_files(0).await.unwrap().is_empty());
}
