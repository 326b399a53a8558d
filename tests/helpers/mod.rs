//! Shared harness for integration tests: every service wired over the
//! in-memory node repository and blob store.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use filetree_core::config::{StorageConfig, TreeConfig};
use filetree_core::result::AppResult;
use filetree_core::types::{NodeId, OwnerId};
use filetree_database::{MemoryNodeRepository, NodeRepository};
use filetree_entity::node::{CreateNode, Node, NodeUpdate};
use filetree_entity::stats::MimeTotal;
use filetree_service::{
    DashboardService, LifecycleService, NodeService, PathResolver, RequestContext, TreeIntegrity,
    UploadFile,
};
use filetree_storage::MemoryBlobStore;

/// A fully wired test application.
pub struct TestApp {
    pub repo: Arc<MemoryNodeRepository>,
    pub blobs: MemoryBlobStore,
    pub integrity: TreeIntegrity,
    pub nodes: NodeService,
    pub lifecycle: LifecycleService,
    pub paths: PathResolver,
    pub dashboard: DashboardService,
    pub ctx: RequestContext,
}

impl TestApp {
    /// Default limits, near-zero retry backoff.
    pub fn new() -> Self {
        Self::with_tree_config(TreeConfig {
            blob_retry_backoff_ms: 1,
            ..TreeConfig::default()
        })
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self::with_tree_config(TreeConfig {
            max_depth,
            blob_retry_backoff_ms: 1,
            ..TreeConfig::default()
        })
    }

    pub fn with_tree_config(tree: TreeConfig) -> Self {
        let repo = Arc::new(MemoryNodeRepository::new());
        Self::build(tree, repo.clone(), repo)
    }

    /// Services run over an [`InterleavingRepository`]; `repo` still reads
    /// the shared state directly.
    pub fn interleaved() -> (Self, Arc<InterleavingRepository>) {
        let memory = MemoryNodeRepository::new();
        let store = Arc::new(InterleavingRepository::new(memory.clone()));
        let tree = TreeConfig {
            blob_retry_backoff_ms: 1,
            ..TreeConfig::default()
        };
        (Self::build(tree, Arc::new(memory), store.clone()), store)
    }

    fn build(
        tree: TreeConfig,
        repo: Arc<MemoryNodeRepository>,
        store: Arc<dyn NodeRepository>,
    ) -> Self {
        let blobs = MemoryBlobStore::new();
        let integrity = TreeIntegrity::new(store.clone(), tree.max_depth);

        Self {
            nodes: NodeService::new(
                store.clone(),
                Arc::new(blobs.clone()),
                integrity.clone(),
                StorageConfig::default(),
            ),
            lifecycle: LifecycleService::new(
                store.clone(),
                Arc::new(blobs.clone()),
                integrity.clone(),
                tree,
            ),
            paths: PathResolver::new(integrity.clone()),
            dashboard: DashboardService::new(store),
            integrity,
            repo,
            blobs,
            ctx: RequestContext::new(OwnerId::new()),
        }
    }

    /// A context for a different owner.
    pub fn stranger(&self) -> RequestContext {
        RequestContext::new(OwnerId::new())
    }

    pub async fn folder(&self, parent: Option<&Node>, name: &str) -> Node {
        self.nodes
            .create_folder(&self.ctx, parent.map(|p| p.id), name)
            .await
            .expect("create folder")
    }

    pub async fn file(&self, parent: Option<&Node>, name: &str, size: usize, mime: &str) -> Node {
        self.nodes
            .upload(
                &self.ctx,
                parent.map(|p| p.id),
                UploadFile {
                    original_name: name.to_string(),
                    bytes: Bytes::from(vec![0u8; size]),
                    mime_type: Some(mime.to_string()),
                },
            )
            .await
            .expect("upload file")
    }

    /// Current stored state of a node.
    pub async fn reload(&self, id: NodeId) -> Node {
        self.repo.get(id).await.expect("node exists")
    }

    pub async fn exists(&self, id: NodeId) -> bool {
        self.repo.find_by_id(id).await.expect("lookup").is_some()
    }
}

/// Memory repository that yields to the scheduler before every call, the
/// way a network round trip would, so concurrent operations interleave.
/// It can also slip one extra node in right before the next `delete_many`.
#[derive(Debug)]
pub struct InterleavingRepository {
    inner: MemoryNodeRepository,
    insert_before_delete: Mutex<Option<CreateNode>>,
}

impl InterleavingRepository {
    pub fn new(inner: MemoryNodeRepository) -> Self {
        Self {
            inner,
            insert_before_delete: Mutex::new(None),
        }
    }

    /// Create `data` just before the next `delete_many` runs.
    pub fn insert_before_next_delete(&self, data: CreateNode) {
        *self.insert_before_delete.lock().unwrap() = Some(data);
    }
}

#[async_trait]
impl NodeRepository for InterleavingRepository {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        tokio::task::yield_now().await;
        self.inner.create(data).await
    }

    async fn find_by_id(&self, id: NodeId) -> AppResult<Option<Node>> {
        tokio::task::yield_now().await;
        self.inner.find_by_id(id).await
    }

    async fn update(
        &self,
        id: NodeId,
        changes: &NodeUpdate,
        expected_version: i64,
    ) -> AppResult<Node> {
        tokio::task::yield_now().await;
        self.inner.update(id, changes, expected_version).await
    }

    async fn children_of(
        &self,
        parent_id: Option<NodeId>,
        owner_id: OwnerId,
        include_deleted: bool,
    ) -> AppResult<Vec<Node>> {
        tokio::task::yield_now().await;
        self.inner
            .children_of(parent_id, owner_id, include_deleted)
            .await
    }

    async fn find_by_parent_and_name(
        &self,
        parent_id: Option<NodeId>,
        name: &str,
        owner_id: OwnerId,
    ) -> AppResult<Option<Node>> {
        tokio::task::yield_now().await;
        self.inner
            .find_by_parent_and_name(parent_id, name, owner_id)
            .await
    }

    async fn subtree(&self, root_id: NodeId, max_depth: usize) -> AppResult<Vec<Node>> {
        tokio::task::yield_now().await;
        self.inner.subtree(root_id, max_depth).await
    }

    async fn mark_trashed(&self, ids: &[NodeId], at: DateTime<Utc>) -> AppResult<u64> {
        tokio::task::yield_now().await;
        self.inner.mark_trashed(ids, at).await
    }

    async fn mark_restored(&self, ids: &[NodeId]) -> AppResult<u64> {
        tokio::task::yield_now().await;
        self.inner.mark_restored(ids).await
    }

    async fn delete(&self, id: NodeId) -> AppResult<bool> {
        tokio::task::yield_now().await;
        self.inner.delete(id).await
    }

    async fn delete_many(&self, ids: &[NodeId]) -> AppResult<u64> {
        tokio::task::yield_now().await;
        let pending = self.insert_before_delete.lock().unwrap().take();
        if let Some(data) = pending {
            self.inner.create(&data).await?;
        }
        self.inner.delete_many(ids).await
    }

    async fn trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Node>> {
        tokio::task::yield_now().await;
        self.inner.trashed(owner_id).await
    }

    async fn file_totals_by_mime(&self) -> AppResult<Vec<MimeTotal>> {
        tokio::task::yield_now().await;
        self.inner.file_totals_by_mime().await
    }

    async fn count_active_folders(&self) -> AppResult<u64> {
        tokio::task::yield_now().await;
        self.inner.count_active_folders().await
    }

    async fn count_trashed(&self) -> AppResult<u64> {
        tokio::task::yield_now().await;
        self.inner.count_trashed().await
    }

    async fn recent_files(&self, limit: u32) -> AppResult<Vec<Node>> {
        tokio::task::yield_now().await;
        self.inner.recent_files(limit).await
    }
}

/// Walk the parent chain of `id` over a snapshot. Returns the number of
/// hops to a root, or `None` if the walk revisits a node or exceeds `bound`.
pub fn hops_to_root(nodes: &[Node], id: NodeId, bound: usize) -> Option<usize> {
    let mut cursor = nodes.iter().find(|n| n.id == id)?.parent_id;
    let mut hops = 0;
    while let Some(current) = cursor {
        hops += 1;
        if hops > bound {
            return None;
        }
        cursor = nodes.iter().find(|n| n.id == current)?.parent_id;
    }
    Some(hops)
}

/// Whether any two active siblings of one owner share a name.
pub fn has_duplicate_active_names(nodes: &[Node]) -> bool {
    let mut seen = std::collections::HashSet::new();
    nodes
        .iter()
        .filter(|n| !n.is_deleted())
        .any(|n| !seen.insert((n.owner_id, n.parent_id, n.name.clone())))
}
