//! Request context carrying the acting owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::traits::IdentityProvider;
use filetree_core::types::OwnerId;
use filetree_entity::node::Node;

/// Who is acting, and when the request started.
///
/// Built once at the edge and passed into every service call in place of
/// ambient session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting owner.
    pub owner_id: OwnerId,
    /// When the request was received. Used as the trash timestamp.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for `owner_id` starting now.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            request_time: Utc::now(),
        }
    }

    /// Creates a context for whoever the identity provider reports.
    pub fn from_identity(identity: &dyn IdentityProvider) -> AppResult<Self> {
        Ok(Self::new(identity.current_owner_id()?))
    }

    /// Fails with `PermissionDenied` unless the node belongs to this owner.
    pub fn ensure_owns(&self, node: &Node) -> AppResult<()> {
        if node.owner_id != self.owner_id {
            return Err(AppError::permission_denied(format!(
                "Node {} belongs to another owner",
                node.id
            )));
        }
        Ok(())
    }
}
