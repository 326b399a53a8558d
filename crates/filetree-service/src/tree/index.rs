//! Children-by-parent index over a flat subtree.

use std::collections::{HashMap, HashSet};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::NodeId;
use filetree_entity::node::Node;

/// A subtree loaded as flat rows and indexed by parent id.
///
/// Construction walks the subtree once, iteratively, and fails with
/// `IntegrityBoundExceeded` if a node shows up twice or sits `max_depth`
/// or more levels below the root. A successfully built index is therefore
/// a finite tree and every later traversal is plain iteration.
#[derive(Debug, Clone)]
pub struct SubtreeIndex {
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
    post_order: Vec<NodeId>,
    height: usize,
}

impl SubtreeIndex {
    /// Index `rows`, which must contain `root_id` and its descendants.
    pub fn build(root_id: NodeId, rows: Vec<Node>, max_depth: usize) -> AppResult<Self> {
        let mut nodes = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            if nodes.insert(id, row).is_some() {
                return Err(AppError::integrity(format!(
                    "Node {id} is reachable twice below {root_id}"
                )));
            }
        }
        if !nodes.contains_key(&root_id) {
            return Err(AppError::not_found(format!("Node {root_id} not found")));
        }

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in nodes.values() {
            if node.id == root_id {
                continue;
            }
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node.id);
            }
        }
        for kids in children.values_mut() {
            kids.sort_by(|a, b| nodes[a].name.cmp(&nodes[b].name).then(a.cmp(b)));
        }

        let (post_order, height) = walk(root_id, &children, max_depth)?;
        if post_order.len() != nodes.len() {
            return Err(AppError::integrity(format!(
                "Subtree of {root_id} holds {} rows but only {} are reachable",
                nodes.len(),
                post_order.len()
            )));
        }

        Ok(Self {
            root: root_id,
            nodes,
            children,
            post_order,
            height,
        })
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    /// Look up a node of the subtree.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether `id` is the root or one of its descendants.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: an index holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct children of `id`, by name.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .map(|child| &self.nodes[child])
    }

    /// Every node, descendants before their ancestors, root last.
    pub fn post_order(&self) -> impl Iterator<Item = &Node> {
        self.post_order.iter().map(|id| &self.nodes[id])
    }

    /// Number of levels below the root (0 for a leaf).
    pub fn height(&self) -> usize {
        self.height
    }
}

/// Iterative post-order walk. Returns the visit order and the height.
fn walk(
    root: NodeId,
    children: &HashMap<NodeId, Vec<NodeId>>,
    max_depth: usize,
) -> AppResult<(Vec<NodeId>, usize)> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut height = 0;
    // (node, depth, children already pushed)
    let mut stack = vec![(root, 0usize, false)];

    while let Some((id, depth, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if depth >= max_depth {
            return Err(AppError::integrity(format!(
                "Subtree of {root} is deeper than {max_depth} levels"
            )));
        }
        if !seen.insert(id) {
            return Err(AppError::integrity(format!(
                "Node {id} is reachable twice below {root}"
            )));
        }
        height = height.max(depth);

        stack.push((id, depth, true));
        if let Some(kids) = children.get(&id) {
            for kid in kids.iter().rev() {
                stack.push((*kid, depth + 1, false));
            }
        }
    }

    Ok((order, height))
}
