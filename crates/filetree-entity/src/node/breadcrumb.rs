//! Breadcrumb value object.

use serde::{Deserialize, Serialize};

use filetree_core::types::NodeId;

/// One step of the path from a root to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Node ID.
    pub id: NodeId,
    /// Node name.
    pub name: String,
}
