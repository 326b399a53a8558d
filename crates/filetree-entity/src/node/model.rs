//! Node entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filetree_core::types::{NodeId, OwnerId};

use super::category::FileCategory;
use super::kind::NodeKind;
use super::trash::TrashState;

/// A file or folder in an owner's hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier.
    pub id: NodeId,
    /// Display name, unique among active siblings.
    pub name: String,
    /// Name the file was uploaded under (files only).
    pub original_name: Option<String>,
    /// File or folder.
    pub kind: NodeKind,
    /// Parent folder (None for root-level nodes).
    pub parent_id: Option<NodeId>,
    /// Content size in bytes (0 for folders).
    pub size_bytes: i64,
    /// MIME type of the content (files only).
    pub mime_type: Option<String>,
    /// Lowercase extension without the dot (files only).
    pub extension: Option<String>,
    /// Locator of the content in the blob store (files only).
    pub storage_key: Option<String>,
    /// The node owner.
    pub owner_id: OwnerId,
    /// Soft-delete state.
    pub trash: TrashState,
    /// Row version, bumped on every write.
    pub version: i64,
    /// When the node was created.
    pub created_at: DateTime<Utc>,
    /// When the node was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Build a fresh, active node from creation data.
    pub fn from_create(data: &CreateNode, now: DateTime<Utc>) -> Self {
        let file = data.file.clone().unwrap_or_default();
        Self {
            id: NodeId::new(),
            name: data.name.clone(),
            original_name: file.original_name,
            kind: data.kind,
            parent_id: data.parent_id,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            extension: file.extension,
            storage_key: file.storage_key,
            owner_id: data.owner_id,
            trash: TrashState::Active,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the node is in the trash.
    pub fn is_deleted(&self) -> bool {
        self.trash.is_deleted()
    }

    /// When the node was trashed, if it is.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.trash.deleted_at()
    }

    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Check if this is a root-level node (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Category of a file's content; `None` for folders.
    pub fn category(&self) -> Option<FileCategory> {
        self.is_file()
            .then(|| FileCategory::classify(self.mime_type.as_deref()))
    }
}

/// File-only attributes supplied at upload time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Name the client uploaded the file under.
    pub original_name: Option<String>,
    /// Size in bytes.
    pub size_bytes: i64,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Lowercase extension without the dot.
    pub extension: Option<String>,
    /// Blob store key.
    pub storage_key: Option<String>,
}

/// Data required to create a new node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNode {
    /// File or folder.
    pub kind: NodeKind,
    /// Parent folder (None for root).
    pub parent_id: Option<NodeId>,
    /// Display name.
    pub name: String,
    /// The node owner.
    pub owner_id: OwnerId,
    /// File attributes; must be `None` for folders.
    pub file: Option<FileAttributes>,
}

impl CreateNode {
    /// Creation data for a folder.
    pub fn folder(owner_id: OwnerId, parent_id: Option<NodeId>, name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Folder,
            parent_id,
            name: name.into(),
            owner_id,
            file: None,
        }
    }

    /// Creation data for a file.
    pub fn file(
        owner_id: OwnerId,
        parent_id: Option<NodeId>,
        name: impl Into<String>,
        attributes: FileAttributes,
    ) -> Self {
        Self {
            kind: NodeKind::File,
            parent_id,
            name: name.into(),
            owner_id,
            file: Some(attributes),
        }
    }
}

/// Mutable fields of a node. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New parent; `Some(None)` moves the node to the root level.
    pub parent_id: Option<Option<NodeId>>,
}

impl NodeUpdate {
    /// An update that only renames.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            parent_id: None,
        }
    }

    /// An update that only changes the parent.
    pub fn reparent(parent_id: Option<NodeId>) -> Self {
        Self {
            name: None,
            parent_id: Some(parent_id),
        }
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none()
    }

    /// Apply the update to an in-memory node, bumping its version.
    pub fn apply_to(&self, node: &mut Node, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(parent_id) = self.parent_id {
            node.parent_id = parent_id;
        }
        node.version += 1;
        node.updated_at = now;
    }
}
