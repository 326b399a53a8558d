//! Folder creation, rename, and listings.

use std::sync::Arc;

use tracing::info;

use filetree_core::config::StorageConfig;
use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::traits::BlobStore;
use filetree_core::types::NodeId;
use filetree_database::NodeRepository;
use filetree_entity::node::{CreateNode, Node, NodeUpdate};

use crate::context::RequestContext;
use crate::tree::{TreeIntegrity, validate_name};

/// Node operations scoped to the acting owner.
#[derive(Debug, Clone)]
pub struct NodeService {
    pub(super) repo: Arc<dyn NodeRepository>,
    pub(super) blobs: Arc<dyn BlobStore>,
    pub(super) integrity: TreeIntegrity,
    pub(super) config: StorageConfig,
}

impl NodeService {
    /// Creates a new node service.
    pub fn new(
        repo: Arc<dyn NodeRepository>,
        blobs: Arc<dyn BlobStore>,
        integrity: TreeIntegrity,
        config: StorageConfig,
    ) -> Self {
        Self {
            repo,
            blobs,
            integrity,
            config,
        }
    }

    /// Gets a node the caller owns.
    pub async fn get(&self, ctx: &RequestContext, id: NodeId) -> AppResult<Node> {
        let node = self.repo.get(id).await?;
        ctx.ensure_owns(&node)?;
        Ok(node)
    }

    /// Checks that `parent_id` is a place new nodes may go: the root level,
    /// or an active folder the caller owns.
    pub(super) async fn require_container(
        &self,
        ctx: &RequestContext,
        parent_id: Option<NodeId>,
    ) -> AppResult<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        let parent = self.get(ctx, parent_id).await?;
        if !parent.is_folder() {
            return Err(AppError::validation("Parent is not a folder"));
        }
        if parent.is_deleted() {
            return Err(AppError::validation("Parent folder is in the trash"));
        }
        Ok(())
    }

    /// Creates a folder under `parent_id`.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        parent_id: Option<NodeId>,
        name: &str,
    ) -> AppResult<Node> {
        let name = validate_name(name)?;
        self.require_container(ctx, parent_id).await?;
        self.integrity
            .ensure_unique_name(ctx.owner_id, parent_id, &name, None)
            .await?;
        self.integrity.ensure_depth_allows(parent_id, 0).await?;

        let folder = self
            .repo
            .create(&CreateNode::folder(ctx.owner_id, parent_id, name))
            .await?;

        info!(
            owner_id = %ctx.owner_id,
            node_id = %folder.id,
            name = %folder.name,
            "Folder created"
        );
        Ok(folder)
    }

    /// Renames an active node.
    pub async fn rename(&self, ctx: &RequestContext, id: NodeId, name: &str) -> AppResult<Node> {
        let name = validate_name(name)?;
        let node = self.get(ctx, id).await?;
        if node.is_deleted() {
            return Err(AppError::validation("Restore the item before renaming it"));
        }
        if node.name == name {
            return Ok(node);
        }
        self.integrity
            .ensure_unique_name(node.owner_id, node.parent_id, &name, Some(id))
            .await?;

        let renamed = self
            .repo
            .update(id, &NodeUpdate::rename(name), node.version)
            .await?;

        info!(
            owner_id = %ctx.owner_id,
            node_id = %id,
            old_name = %node.name,
            new_name = %renamed.name,
            "Node renamed"
        );
        Ok(renamed)
    }

    /// Active children of `parent_id`, folders first, then by name.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<NodeId>,
    ) -> AppResult<Vec<Node>> {
        if let Some(parent_id) = parent_id {
            let parent = self.get(ctx, parent_id).await?;
            if !parent.is_folder() {
                return Err(AppError::validation("Only folders have children"));
            }
        }
        self.repo.children_of(parent_id, ctx.owner_id, false).await
    }

    /// The caller's trashed nodes, most recently trashed first.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<Vec<Node>> {
        self.repo.trashed(ctx.owner_id).await
    }
}
