//! Node repository contract and its implementations.
//!
//! Every owner-scoped query takes the owner explicitly. The aggregate
//! queries at the bottom of [`NodeRepository`] read across all owners and
//! never write.

pub mod memory;
pub mod node;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::{NodeId, OwnerId};
use filetree_entity::node::{CreateNode, Node, NodeUpdate};
use filetree_entity::stats::MimeTotal;

pub use memory::MemoryNodeRepository;
pub use node::PgNodeRepository;

/// Persistent store of file and folder nodes.
///
/// Implementations enforce the storage-level rules: active siblings of one
/// owner have distinct names (`NameConflict`), a parent must exist and a
/// node with children cannot be removed (`Conflict`), a node is never moved
/// under itself or a descendant (`CycleRejected`), an active node never
/// gets a trashed parent (`Validation`), and `update` rejects a stale
/// version (`Conflict`). The cycle and trash checks run at write time,
/// serialized with other structural writes of the same owner, so racing
/// moves cannot both pass.
#[async_trait]
pub trait NodeRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new active node.
    async fn create(&self, data: &CreateNode) -> AppResult<Node>;

    /// Find a node by id.
    async fn find_by_id(&self, id: NodeId) -> AppResult<Option<Node>>;

    /// Get a node by id, or `NotFound`.
    async fn get(&self, id: NodeId) -> AppResult<Node> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))
    }

    /// Apply `changes` if the row is still at `expected_version`.
    async fn update(
        &self,
        id: NodeId,
        changes: &NodeUpdate,
        expected_version: i64,
    ) -> AppResult<Node>;

    /// Direct children of `parent_id` (root level when `None`), folders
    /// first and then by name.
    async fn children_of(
        &self,
        parent_id: Option<NodeId>,
        owner_id: OwnerId,
        include_deleted: bool,
    ) -> AppResult<Vec<Node>>;

    /// The active child of `parent_id` called `name`, if any.
    async fn find_by_parent_and_name(
        &self,
        parent_id: Option<NodeId>,
        name: &str,
        owner_id: OwnerId,
    ) -> AppResult<Option<Node>>;

    /// The root and its descendants in any trash state, at most
    /// `max_depth` levels below the root.
    ///
    /// Rows come back flat; a corrupted parent chain may yield the same
    /// node more than once.
    async fn subtree(&self, root_id: NodeId, max_depth: usize) -> AppResult<Vec<Node>>;

    /// Trash every still-active node in `ids`, and every active descendant
    /// present at write time, in one transaction.
    async fn mark_trashed(&self, ids: &[NodeId], at: DateTime<Utc>) -> AppResult<u64>;

    /// Reactivate every trashed node in `ids` in one transaction.
    async fn mark_restored(&self, ids: &[NodeId]) -> AppResult<u64>;

    /// Hard-delete a single childless node.
    async fn delete(&self, id: NodeId) -> AppResult<bool>;

    /// Hard-delete `ids` in the given order in one transaction.
    async fn delete_many(&self, ids: &[NodeId]) -> AppResult<u64>;

    /// All trashed nodes of an owner, most recently trashed first.
    async fn trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Node>>;

    /// Active file counts and byte sums grouped by MIME type.
    async fn file_totals_by_mime(&self) -> AppResult<Vec<MimeTotal>>;

    /// Number of active folders.
    async fn count_active_folders(&self) -> AppResult<u64>;

    /// Number of trashed nodes.
    async fn count_trashed(&self) -> AppResult<u64>;

    /// Newest active files.
    async fn recent_files(&self, limit: u32) -> AppResult<Vec<Node>>;
}
