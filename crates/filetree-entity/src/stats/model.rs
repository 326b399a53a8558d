//! Aggregate value objects.

use serde::{Deserialize, Serialize};

use crate::node::FileCategory;

/// Count and byte total of active files sharing one MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeTotal {
    /// The MIME type (None for files stored without one).
    pub mime_type: Option<String>,
    /// Number of active files.
    pub file_count: u64,
    /// Sum of their sizes in bytes.
    pub total_bytes: u64,
}

/// Count and byte total of active files in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category.
    pub category: FileCategory,
    /// Number of active files.
    pub file_count: u64,
    /// Sum of their sizes in bytes.
    pub total_bytes: u64,
}

impl CategoryTotal {
    /// Fold per-MIME totals into per-category totals.
    ///
    /// Categories without files are omitted; the rest follow
    /// [`FileCategory::ALL`] order.
    pub fn fold(mime_totals: &[MimeTotal]) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = FileCategory::ALL
            .iter()
            .map(|category| CategoryTotal {
                category: *category,
                file_count: 0,
                total_bytes: 0,
            })
            .collect();

        for row in mime_totals {
            let category = FileCategory::classify(row.mime_type.as_deref());
            if let Some(entry) = totals.iter_mut().find(|t| t.category == category) {
                entry.file_count += row.file_count;
                entry.total_bytes += row.total_bytes;
            }
        }

        totals.retain(|t| t.file_count > 0);
        totals
    }
}

/// Headline counts across all owners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatistics {
    /// Active files.
    pub total_files: u64,
    /// Active folders.
    pub total_folders: u64,
    /// Active image files.
    pub total_images: u64,
    /// Active video files.
    pub total_videos: u64,
    /// Active document files.
    pub total_documents: u64,
    /// Active archive files.
    pub total_archives: u64,
    /// Nodes of either kind currently in the trash.
    pub trashed_nodes: u64,
}

/// Bytes held by active files across all owners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    /// All active files.
    pub total_bytes: u64,
    /// Image files.
    pub image_bytes: u64,
    /// Video files.
    pub video_bytes: u64,
    /// Document files.
    pub document_bytes: u64,
    /// Archive files.
    pub archive_bytes: u64,
}
