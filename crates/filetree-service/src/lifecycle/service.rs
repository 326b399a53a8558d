//! Subtree-wide state transitions.
//!
//! ```text
//! ACTIVE --soft_delete--> TRASHED --restore--> ACTIVE
//! ACTIVE | TRASHED --force_delete--> PURGED
//! ```
//!
//! Each transition loads the subtree once, indexes it, and hands the whole
//! id set to the repository in a single transaction, descendants before
//! their ancestors.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use filetree_core::config::TreeConfig;
use filetree_core::error::{AppError, ErrorKind};
use filetree_core::result::AppResult;
use filetree_core::traits::BlobStore;
use filetree_core::types::NodeId;
use filetree_database::NodeRepository;
use filetree_entity::node::{Node, NodeUpdate};

use crate::context::RequestContext;
use crate::tree::TreeIntegrity;

/// What a force delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    /// Node rows removed.
    pub nodes_removed: u64,
    /// Blobs deleted from the store.
    pub blobs_deleted: u64,
    /// Blobs that were already gone.
    pub blobs_missing: u64,
    /// Blobs left behind after the store kept failing.
    pub blobs_failed: u64,
}

/// Outcome of deleting one blob.
enum BlobRelease {
    Deleted,
    Missing,
    Failed,
}

/// Orchestrates node lifecycle transitions.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    repo: Arc<dyn NodeRepository>,
    blobs: Arc<dyn BlobStore>,
    integrity: TreeIntegrity,
    config: TreeConfig,
}

impl LifecycleService {
    /// Creates a new lifecycle service.
    pub fn new(
        repo: Arc<dyn NodeRepository>,
        blobs: Arc<dyn BlobStore>,
        integrity: TreeIntegrity,
        config: TreeConfig,
    ) -> Self {
        Self {
            repo,
            blobs,
            integrity,
            config,
        }
    }

    /// Loads a node the caller owns.
    async fn load_owned(&self, ctx: &RequestContext, id: NodeId) -> AppResult<Node> {
        let node = self.repo.get(id).await?;
        ctx.ensure_owns(&node)?;
        Ok(node)
    }

    /// Moves a node and its whole subtree to the trash.
    ///
    /// Returns how many nodes changed state. Already trashed nodes keep
    /// their original timestamp, so repeating the call is harmless.
    pub async fn soft_delete(&self, ctx: &RequestContext, id: NodeId) -> AppResult<u64> {
        self.load_owned(ctx, id).await?;
        let subtree = self.integrity.load_subtree(id).await?;

        let ids: Vec<NodeId> = subtree
            .post_order()
            .filter(|n| !n.is_deleted())
            .map(|n| n.id)
            .collect();
        let trashed = self.repo.mark_trashed(&ids, ctx.request_time).await?;

        info!(
            owner_id = %ctx.owner_id,
            node_id = %id,
            nodes = trashed,
            "Node moved to trash"
        );
        Ok(trashed)
    }

    /// Brings a node and every trashed descendant back.
    ///
    /// All names are checked first; if any restored node would collide with
    /// an active sibling, nothing changes. Trashed ancestors stay trashed.
    pub async fn restore(&self, ctx: &RequestContext, id: NodeId) -> AppResult<u64> {
        self.load_owned(ctx, id).await?;
        let subtree = self.integrity.load_subtree(id).await?;

        let targets: Vec<&Node> = subtree.post_order().filter(|n| n.is_deleted()).collect();
        let mut claimed = HashSet::new();
        for node in &targets {
            if !claimed.insert((node.parent_id, node.name.as_str())) {
                return Err(AppError::name_conflict(format!(
                    "Two restored items would both be named '{}'",
                    node.name
                )));
            }
            self.integrity
                .ensure_unique_name(node.owner_id, node.parent_id, &node.name, Some(node.id))
                .await?;
        }

        let ids: Vec<NodeId> = targets.iter().map(|n| n.id).collect();
        let restored = self.repo.mark_restored(&ids).await?;

        if let Some(parent_id) = subtree.root().parent_id {
            if self.repo.get(parent_id).await?.is_deleted() {
                warn!(
                    node_id = %id,
                    parent_id = %parent_id,
                    "Restored node sits under a trashed folder"
                );
            }
        }

        info!(
            owner_id = %ctx.owner_id,
            node_id = %id,
            nodes = restored,
            "Node restored from trash"
        );
        Ok(restored)
    }

    /// Permanently removes a node, its descendants, and their blobs.
    ///
    /// Rows go first, in one transaction; blobs are released only once that
    /// commits, so a failed purge never leaves a row pointing at missing
    /// content. Blob failures after that are counted, not raised: a missing
    /// blob is skipped, a transient failure is retried up to the configured
    /// number of attempts, anything else is logged and left as an orphan.
    pub async fn force_delete(&self, ctx: &RequestContext, id: NodeId) -> AppResult<PurgeReport> {
        self.load_owned(ctx, id).await?;
        let subtree = self.integrity.load_subtree(id).await?;

        let ids: Vec<NodeId> = subtree.post_order().map(|n| n.id).collect();
        let blobs: Vec<(NodeId, String)> = subtree
            .post_order()
            .filter(|n| n.is_file())
            .filter_map(|n| n.storage_key.clone().map(|key| (n.id, key)))
            .collect();

        let mut report = PurgeReport {
            nodes_removed: self.repo.delete_many(&ids).await?,
            ..PurgeReport::default()
        };

        for (node_id, key) in &blobs {
            match self.release_blob(*node_id, key).await {
                BlobRelease::Deleted => report.blobs_deleted += 1,
                BlobRelease::Missing => report.blobs_missing += 1,
                BlobRelease::Failed => report.blobs_failed += 1,
            }
        }

        info!(
            owner_id = %ctx.owner_id,
            node_id = %id,
            nodes = report.nodes_removed,
            blobs_deleted = report.blobs_deleted,
            blobs_missing = report.blobs_missing,
            blobs_failed = report.blobs_failed,
            "Node permanently deleted"
        );
        Ok(report)
    }

    async fn release_blob(&self, node_id: NodeId, key: &str) -> BlobRelease {
        let attempts = self.config.blob_delete_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.blobs.delete(key).await {
                Ok(()) => return BlobRelease::Deleted,
                Err(e) if e.kind == ErrorKind::NotFound => {
                    warn!(node_id = %node_id, key, "Blob already missing");
                    return BlobRelease::Missing;
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(
                        node_id = %node_id,
                        key,
                        attempt,
                        error = %e,
                        "Blob delete failed, retrying"
                    );
                    let backoff = self.config.blob_retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        node_id = %node_id,
                        key,
                        attempt,
                        error = %e,
                        "Blob delete failed, leaving orphan blob"
                    );
                    return BlobRelease::Failed;
                }
            }
        }
    }

    /// Moves a node under `new_parent` (root level when `None`).
    ///
    /// The destination must be an active folder of the same owner, the move
    /// must not create a cycle or a sibling name clash, and the moved
    /// subtree must stay within the nesting limit.
    pub async fn move_node(
        &self,
        ctx: &RequestContext,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> AppResult<Node> {
        if new_parent == Some(id) {
            return Err(AppError::cycle_rejected("Cannot move a node into itself"));
        }

        let node = self.load_owned(ctx, id).await?;
        if node.is_deleted() {
            return Err(AppError::validation("Restore the item before moving it"));
        }

        let parent = match new_parent {
            Some(parent_id) => Some(self.load_owned(ctx, parent_id).await?),
            None => None,
        };

        // A descendant is never a valid destination, whatever its kind.
        self.integrity.ensure_no_cycle(id, new_parent).await?;
        if let Some(parent) = &parent {
            if !parent.is_folder() {
                return Err(AppError::validation("Destination is not a folder"));
            }
            if parent.is_deleted() {
                return Err(AppError::validation("Destination folder is in the trash"));
            }
        }

        if node.parent_id == new_parent {
            return Ok(node);
        }
        self.integrity
            .ensure_unique_name(node.owner_id, new_parent, &node.name, Some(id))
            .await?;

        let height = if node.is_folder() {
            self.integrity.load_subtree(id).await?.height()
        } else {
            0
        };
        self.integrity.ensure_depth_allows(new_parent, height).await?;

        let moved = self
            .repo
            .update(id, &NodeUpdate::reparent(new_parent), node.version)
            .await?;

        info!(
            owner_id = %ctx.owner_id,
            node_id = %id,
            from = ?node.parent_id,
            to = ?new_parent,
            "Node moved"
        );
        Ok(moved)
    }
}
