//! Cycle, name, and depth checks.
//!
//! Nothing here writes. Each check reads what it needs through the
//! repository and either passes or fails with the error kind the caller
//! surfaces: `CycleRejected`, `NameConflict`, `Validation` for the nesting
//! limit, or `IntegrityBoundExceeded` when stored data is already broken.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::error;

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::{NodeId, OwnerId};
use filetree_database::NodeRepository;
use filetree_entity::node::Node;

use super::index::SubtreeIndex;

/// Read-only checks guarding every tree mutation.
#[derive(Debug, Clone)]
pub struct TreeIntegrity {
    repo: Arc<dyn NodeRepository>,
    max_depth: usize,
}

impl TreeIntegrity {
    /// Creates the checker. `max_depth` bounds every parent-chain walk.
    pub fn new(repo: Arc<dyn NodeRepository>, max_depth: usize) -> Self {
        Self {
            repo,
            max_depth: max_depth.max(1),
        }
    }

    /// The hop bound.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether placing `node_id` under `candidate_parent` would make it its
    /// own ancestor.
    ///
    /// Walks up from the candidate and stops at the first root or at
    /// `node_id`. Running past the hop bound is an integrity failure, which
    /// rejects the move.
    pub async fn would_create_cycle(
        &self,
        node_id: NodeId,
        candidate_parent: Option<NodeId>,
    ) -> AppResult<bool> {
        let mut cursor = candidate_parent;
        let mut hops = 0;

        while let Some(current) = cursor {
            if current == node_id {
                return Ok(true);
            }
            if hops >= self.max_depth {
                return Err(self.bound_exceeded(current));
            }
            let node = match self.repo.find_by_id(current).await? {
                Some(node) => node,
                None if hops == 0 => {
                    return Err(AppError::not_found(format!("Node {current} not found")));
                }
                None => return Err(self.dangling(current)),
            };
            cursor = node.parent_id;
            hops += 1;
        }

        Ok(false)
    }

    /// Fails with `CycleRejected` if the move would create a cycle.
    pub async fn ensure_no_cycle(
        &self,
        node_id: NodeId,
        candidate_parent: Option<NodeId>,
    ) -> AppResult<()> {
        if self.would_create_cycle(node_id, candidate_parent).await? {
            return Err(AppError::cycle_rejected(format!(
                "Cannot move node {node_id} into itself or one of its descendants"
            )));
        }
        Ok(())
    }

    /// Fails with `NameConflict` if an active sibling other than `exclude`
    /// already carries `name`.
    pub async fn ensure_unique_name(
        &self,
        owner_id: OwnerId,
        parent_id: Option<NodeId>,
        name: &str,
        exclude: Option<NodeId>,
    ) -> AppResult<()> {
        match self
            .repo
            .find_by_parent_and_name(parent_id, name, owner_id)
            .await?
        {
            Some(existing) if Some(existing.id) != exclude => Err(AppError::name_conflict(
                format!("An item named '{name}' already exists in this folder"),
            )),
            _ => Ok(()),
        }
    }

    /// `id` and its ancestors, nearest first, root last.
    pub async fn ancestry(&self, id: NodeId) -> AppResult<Vec<Node>> {
        let mut chain: Vec<Node> = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            if chain.len() >= self.max_depth || !seen.insert(current) {
                return Err(self.bound_exceeded(id));
            }
            let node = match self.repo.find_by_id(current).await? {
                Some(node) => node,
                None if chain.is_empty() => {
                    return Err(AppError::not_found(format!("Node {current} not found")));
                }
                None => return Err(self.dangling(current)),
            };
            cursor = node.parent_id;
            chain.push(node);
        }

        Ok(chain)
    }

    /// Hops between a root and a node placed directly under `parent_id`.
    pub async fn depth_under(&self, parent_id: Option<NodeId>) -> AppResult<usize> {
        match parent_id {
            Some(parent_id) => Ok(self.ancestry(parent_id).await?.len()),
            None => Ok(0),
        }
    }

    /// Fails with `Validation` if a subtree `height` levels tall, placed
    /// under `parent_id`, would reach the nesting limit.
    pub async fn ensure_depth_allows(
        &self,
        parent_id: Option<NodeId>,
        height: usize,
    ) -> AppResult<()> {
        let depth = self.depth_under(parent_id).await?;
        if depth + height >= self.max_depth {
            return Err(AppError::validation(format!(
                "Folders cannot be nested more than {} levels deep",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Load and index the subtree rooted at `root_id`.
    pub async fn load_subtree(&self, root_id: NodeId) -> AppResult<SubtreeIndex> {
        let rows = self.repo.subtree(root_id, self.max_depth).await?;
        SubtreeIndex::build(root_id, rows, self.max_depth).inspect_err(|e| {
            if e.is_integrity_failure() {
                error!(node_id = %root_id, error = %e, "Corrupted subtree detected");
            }
        })
    }

    fn bound_exceeded(&self, id: NodeId) -> AppError {
        error!(
            node_id = %id,
            max_depth = self.max_depth,
            "Parent chain exceeds hop bound"
        );
        AppError::integrity(format!(
            "Parent chain of {id} exceeds {} hops",
            self.max_depth
        ))
    }

    fn dangling(&self, id: NodeId) -> AppError {
        error!(node_id = %id, "Parent chain references a missing node");
        AppError::integrity(format!("Parent chain references missing node {id}"))
    }
}
