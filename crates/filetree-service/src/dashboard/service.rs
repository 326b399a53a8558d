//! Dashboard statistics.

use std::sync::Arc;

use filetree_core::result::AppResult;
use filetree_database::NodeRepository;
use filetree_entity::node::{FileCategory, Node};
use filetree_entity::stats::{CategoryTotal, NodeStatistics, StorageUsage};

/// Aggregate views over every owner's nodes. Never writes.
#[derive(Debug, Clone)]
pub struct DashboardService {
    repo: Arc<dyn NodeRepository>,
}

impl DashboardService {
    /// Creates a new dashboard service.
    pub fn new(repo: Arc<dyn NodeRepository>) -> Self {
        Self { repo }
    }

    /// Per-category totals of active files; empty categories are omitted.
    pub async fn breakdown(&self) -> AppResult<Vec<CategoryTotal>> {
        let totals = self.repo.file_totals_by_mime().await?;
        Ok(CategoryTotal::fold(&totals))
    }

    /// Node counts.
    pub async fn statistics(&self) -> AppResult<NodeStatistics> {
        let breakdown = self.breakdown().await?;
        let count = |category: FileCategory| {
            breakdown
                .iter()
                .find(|t| t.category == category)
                .map(|t| t.file_count)
                .unwrap_or(0)
        };

        Ok(NodeStatistics {
            total_files: breakdown.iter().map(|t| t.file_count).sum(),
            total_folders: self.repo.count_active_folders().await?,
            total_images: count(FileCategory::Image),
            total_videos: count(FileCategory::Video),
            total_documents: count(FileCategory::Document),
            total_archives: count(FileCategory::Archive),
            trashed_nodes: self.repo.count_trashed().await?,
        })
    }

    /// Bytes held by active files.
    pub async fn storage_usage(&self) -> AppResult<StorageUsage> {
        let breakdown = self.breakdown().await?;
        let bytes = |category: FileCategory| {
            breakdown
                .iter()
                .find(|t| t.category == category)
                .map(|t| t.total_bytes)
                .unwrap_or(0)
        };

        Ok(StorageUsage {
            total_bytes: breakdown.iter().map(|t| t.total_bytes).sum(),
            image_bytes: bytes(FileCategory::Image),
            video_bytes: bytes(FileCategory::Video),
            document_bytes: bytes(FileCategory::Document),
            archive_bytes: bytes(FileCategory::Archive),
        })
    }

    /// The newest active files across all owners.
    pub async fn recent_files(&self, limit: u32) -> AppResult<Vec<Node>> {
        self.repo.recent_files(limit).await
    }
}
