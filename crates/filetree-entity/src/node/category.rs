//! MIME-based file classification used by filters and aggregates.

use serde::{Deserialize, Serialize};

/// Coarse file category derived from a MIME type. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// PDF, Word, Office Open XML, and `text/*`.
    Document,
    /// ZIP, RAR, and 7z archives.
    Archive,
    /// Everything else, including files without a MIME type.
    Other,
}

impl FileCategory {
    /// Every category, in reporting order.
    pub const ALL: [FileCategory; 5] = [
        Self::Image,
        Self::Video,
        Self::Document,
        Self::Archive,
        Self::Other,
    ];

    /// Classify a MIME type. Matching is case-insensitive.
    pub fn classify(mime_type: Option<&str>) -> Self {
        let Some(mime) = mime_type else {
            return Self::Other;
        };
        let mime = mime.trim().to_ascii_lowercase();

        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime == "application/pdf"
            || mime == "application/msword"
            || mime.starts_with("application/vnd.openxmlformats-officedocument")
            || mime.starts_with("text/")
        {
            Self::Document
        } else if mime == "application/zip"
            || mime.starts_with("application/x-rar")
            || mime.starts_with("application/x-7z")
        {
            Self::Archive
        } else {
            Self::Other
        }
    }

    /// Plural display label used by aggregate views.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "Images",
            Self::Video => "Videos",
            Self::Document => "Documents",
            Self::Archive => "Archives",
            Self::Other => "Others",
        }
    }
}
