//! In-memory node repository.
//!
//! Mirrors the constraints of the SQL schema (active sibling names, parent
//! foreign key, no self-parent, optimistic versions) so services behave the
//! same against either backend. Multi-row writes stage their changes on a
//! copy and swap it in only when every row succeeded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::{NodeId, OwnerId};
use filetree_entity::node::{CreateNode, Node, NodeUpdate, TrashState};
use filetree_entity::stats::MimeTotal;

use super::NodeRepository;

type NodeMap = HashMap<NodeId, Node>;

/// Node repository kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNodeRepository {
    nodes: Arc<RwLock<NodeMap>>,
}

impl MemoryNodeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored node.
    pub async fn snapshot(&self) -> Vec<Node> {
        self.nodes.read().await.values().cloned().collect()
    }

    /// Number of stored nodes.
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    /// Whether the repository holds no nodes.
    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }

    /// Store `node` as-is, skipping every constraint. Used to simulate
    /// damaged data.
    pub async fn put_unchecked(&self, node: Node) {
        self.nodes.write().await.insert(node.id, node);
    }
}

/// Fail with `NameConflict` if an active sibling other than `exclude`
/// already uses `name`.
fn ensure_name_free(
    nodes: &NodeMap,
    owner_id: OwnerId,
    parent_id: Option<NodeId>,
    name: &str,
    exclude: Option<NodeId>,
) -> AppResult<()> {
    let taken = nodes.values().any(|n| {
        Some(n.id) != exclude
            && !n.is_deleted()
            && n.owner_id == owner_id
            && n.parent_id == parent_id
            && n.name == name
    });
    if taken {
        return Err(AppError::name_conflict(format!(
            "An active node named '{name}' already exists in this folder"
        )));
    }
    Ok(())
}

fn ensure_parent_exists(nodes: &NodeMap, parent_id: Option<NodeId>) -> AppResult<()> {
    match parent_id {
        Some(parent_id) if !nodes.contains_key(&parent_id) => Err(AppError::conflict(format!(
            "Parent {parent_id} does not exist"
        ))),
        _ => Ok(()),
    }
}

/// Fail with `Validation` if `parent_id` names a trashed node.
fn ensure_parent_active(nodes: &NodeMap, parent_id: Option<NodeId>) -> AppResult<()> {
    match parent_id.and_then(|id| nodes.get(&id)) {
        Some(parent) if parent.is_deleted() => Err(AppError::validation(format!(
            "Parent folder {} is in the trash",
            parent.id
        ))),
        _ => Ok(()),
    }
}

/// Fail with `CycleRejected` if `new_parent` is `id` or one of its
/// descendants. Runs under the write lock, so it sees every committed move.
fn ensure_not_descendant(nodes: &NodeMap, id: NodeId, new_parent: Option<NodeId>) -> AppResult<()> {
    let mut seen = HashSet::new();
    let mut cursor = new_parent;
    while let Some(current) = cursor {
        if current == id {
            return Err(AppError::cycle_rejected(format!(
                "Cannot move node {id} under one of its own descendants"
            )));
        }
        if !seen.insert(current) {
            return Err(AppError::integrity(format!(
                "Parent chain above node {current} loops"
            )));
        }
        cursor = nodes.get(&current).and_then(|n| n.parent_id);
    }
    Ok(())
}

fn remove_childless(nodes: &mut NodeMap, id: NodeId) -> AppResult<bool> {
    if nodes.values().any(|n| n.parent_id == Some(id)) {
        return Err(AppError::conflict(format!("Node {id} still has children")));
    }
    Ok(nodes.remove(&id).is_some())
}

fn sort_listing(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[async_trait]
impl NodeRepository for MemoryNodeRepository {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        let mut nodes = self.nodes.write().await;
        ensure_parent_exists(&nodes, data.parent_id)?;
        ensure_parent_active(&nodes, data.parent_id)?;
        ensure_name_free(&nodes, data.owner_id, data.parent_id, &data.name, None)?;

        let node = Node::from_create(data, Utc::now());
        nodes.insert(node.id, node.clone());
        Ok(node)
    }

    async fn find_by_id(&self, id: NodeId) -> AppResult<Option<Node>> {
        Ok(self.nodes.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: NodeId,
        changes: &NodeUpdate,
        expected_version: i64,
    ) -> AppResult<Node> {
        let mut nodes = self.nodes.write().await;
        let current = nodes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))?;

        if current.version != expected_version {
            return Err(AppError::conflict(format!(
                "Node {id} changed concurrently (expected version {expected_version}, found {})",
                current.version
            )));
        }

        let reparenting = changes
            .parent_id
            .is_some_and(|parent_id| parent_id != current.parent_id);
        let mut updated = current;
        changes.apply_to(&mut updated, Utc::now());

        if updated.parent_id == Some(id) {
            return Err(AppError::cycle_rejected("A node cannot be its own parent"));
        }
        ensure_parent_exists(&nodes, updated.parent_id)?;
        if reparenting {
            ensure_not_descendant(&nodes, id, updated.parent_id)?;
            if !updated.is_deleted() {
                ensure_parent_active(&nodes, updated.parent_id)?;
            }
        }
        if !updated.is_deleted() {
            ensure_name_free(
                &nodes,
                updated.owner_id,
                updated.parent_id,
                &updated.name,
                Some(id),
            )?;
        }

        nodes.insert(id, updated.clone());
        Ok(updated)
    }

    async fn children_of(
        &self,
        parent_id: Option<NodeId>,
        owner_id: OwnerId,
        include_deleted: bool,
    ) -> AppResult<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let mut children: Vec<Node> = nodes
            .values()
            .filter(|n| {
                n.owner_id == owner_id
                    && n.parent_id == parent_id
                    && (include_deleted || !n.is_deleted())
            })
            .cloned()
            .collect();
        sort_listing(&mut children);
        Ok(children)
    }

    async fn find_by_parent_and_name(
        &self,
        parent_id: Option<NodeId>,
        name: &str,
        owner_id: OwnerId,
    ) -> AppResult<Option<Node>> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .values()
            .find(|n| {
                n.owner_id == owner_id
                    && n.parent_id == parent_id
                    && n.name == name
                    && !n.is_deleted()
            })
            .cloned())
    }

    async fn subtree(&self, root_id: NodeId, max_depth: usize) -> AppResult<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let Some(root) = nodes.get(&root_id) else {
            return Ok(Vec::new());
        };

        let mut children: HashMap<NodeId, Vec<&Node>> = HashMap::new();
        for node in nodes.values() {
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node);
            }
        }

        let mut rows = Vec::new();
        let mut queue = VecDeque::from([(root, 0usize)]);
        while let Some((node, depth)) = queue.pop_front() {
            rows.push(node.clone());
            if depth >= max_depth {
                continue;
            }
            if let Some(kids) = children.get(&node.id) {
                queue.extend(kids.iter().map(|kid| (*kid, depth + 1)));
            }
        }
        Ok(rows)
    }

    async fn mark_trashed(&self, ids: &[NodeId], at: DateTime<Utc>) -> AppResult<u64> {
        let mut nodes = self.nodes.write().await;

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in nodes.values() {
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node.id);
            }
        }
        let mut reached = HashSet::new();
        let mut queue: VecDeque<NodeId> = ids.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if reached.insert(id) {
                if let Some(kids) = children.get(&id) {
                    queue.extend(kids.iter().copied());
                }
            }
        }

        let now = Utc::now();
        let mut changed = 0;
        for id in &reached {
            if let Some(node) = nodes.get_mut(id) {
                if !node.is_deleted() {
                    node.trash = TrashState::Trashed { deleted_at: at };
                    node.version += 1;
                    node.updated_at = now;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn mark_restored(&self, ids: &[NodeId]) -> AppResult<u64> {
        let mut nodes = self.nodes.write().await;
        let targets: HashSet<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| nodes.get(id).is_some_and(Node::is_deleted))
            .collect();

        let mut staged = nodes.clone();
        let now = Utc::now();
        for id in ids {
            if !targets.contains(id) {
                continue;
            }
            let Some(node) = staged.get(id).cloned() else {
                continue;
            };
            ensure_name_free(&staged, node.owner_id, node.parent_id, &node.name, Some(node.id))?;
            if let Some(entry) = staged.get_mut(id) {
                entry.trash = TrashState::Active;
                entry.version += 1;
                entry.updated_at = now;
            }
        }

        *nodes = staged;
        Ok(targets.len() as u64)
    }

    async fn delete(&self, id: NodeId) -> AppResult<bool> {
        let mut nodes = self.nodes.write().await;
        remove_childless(&mut nodes, id)
    }

    async fn delete_many(&self, ids: &[NodeId]) -> AppResult<u64> {
        let mut nodes = self.nodes.write().await;
        let mut staged = nodes.clone();
        let mut removed = 0;
        for id in ids {
            if remove_childless(&mut staged, *id)? {
                removed += 1;
            }
        }
        *nodes = staged;
        Ok(removed)
    }

    async fn trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let mut trashed: Vec<Node> = nodes
            .values()
            .filter(|n| n.owner_id == owner_id && n.is_deleted())
            .cloned()
            .collect();
        trashed.sort_by(|a, b| {
            b.deleted_at()
                .cmp(&a.deleted_at())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(trashed)
    }

    async fn file_totals_by_mime(&self) -> AppResult<Vec<MimeTotal>> {
        let nodes = self.nodes.read().await;
        let mut totals: HashMap<Option<String>, MimeTotal> = HashMap::new();
        for node in nodes.values().filter(|n| n.is_file() && !n.is_deleted()) {
            let entry = totals
                .entry(node.mime_type.clone())
                .or_insert_with(|| MimeTotal {
                    mime_type: node.mime_type.clone(),
                    file_count: 0,
                    total_bytes: 0,
                });
            entry.file_count += 1;
            entry.total_bytes += node.size_bytes.max(0) as u64;
        }
        Ok(totals.into_values().collect())
    }

    async fn count_active_folders(&self) -> AppResult<u64> {
        let nodes = self.nodes.read().await;
        Ok(nodes
            .values()
            .filter(|n| n.is_folder() && !n.is_deleted())
            .count() as u64)
    }

    async fn count_trashed(&self) -> AppResult<u64> {
        let nodes = self.nodes.read().await;
        Ok(nodes.values().filter(|n| n.is_deleted()).count() as u64)
    }

    async fn recent_files(&self, limit: u32) -> AppResult<Vec<Node>> {
        let nodes = self.nodes.read().await;
        let mut files: Vec<Node> = nodes
            .values()
            .filter(|n| n.is_file() && !n.is_deleted())
            .cloned()
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        files.truncate(limit as usize);
        Ok(files)
    }
}
