//! Soft-delete state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;

/// Whether a node is live or sitting in the trash.
///
/// The deletion flag and timestamp travel together so they can never
/// disagree; storage layers split them into two columns and rebuild the
/// state with [`TrashState::from_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TrashState {
    /// Visible in normal listings.
    Active,
    /// Soft-deleted at the given instant.
    Trashed {
        /// When the node was moved to the trash.
        deleted_at: DateTime<Utc>,
    },
}

impl TrashState {
    /// Whether the node is in the trash.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Trashed { .. })
    }

    /// When the node was trashed, if it is.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Trashed { deleted_at } => Some(*deleted_at),
        }
    }

    /// Rebuild the state from its persisted `is_deleted` / `deleted_at` pair.
    pub fn from_columns(is_deleted: bool, deleted_at: Option<DateTime<Utc>>) -> AppResult<Self> {
        match (is_deleted, deleted_at) {
            (false, None) => Ok(Self::Active),
            (true, Some(deleted_at)) => Ok(Self::Trashed { deleted_at }),
            (flag, at) => Err(AppError::integrity(format!(
                "Inconsistent trash columns: is_deleted={flag}, deleted_at={at:?}"
            ))),
        }
    }

    /// Split the state into its persisted `is_deleted` / `deleted_at` pair.
    pub fn to_columns(&self) -> (bool, Option<DateTime<Utc>>) {
        (self.is_deleted(), self.deleted_at())
    }
}

impl Default for TrashState {
    fn default() -> Self {
        Self::Active
    }
}
