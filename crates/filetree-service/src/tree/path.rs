//! Breadcrumbs and full paths.

use filetree_core::result::AppResult;
use filetree_core::types::NodeId;
use filetree_entity::node::Breadcrumb;

use super::integrity::TreeIntegrity;
use crate::context::RequestContext;

/// Separator between names in a full path.
pub const PATH_SEPARATOR: char = '/';

/// Resolves the root-to-node path of a node.
///
/// Every walk is bounded by the integrity checker's hop limit; a chain that
/// runs past it fails with `IntegrityBoundExceeded` instead of looping.
#[derive(Debug, Clone)]
pub struct PathResolver {
    integrity: TreeIntegrity,
}

impl PathResolver {
    /// Creates a new path resolver.
    pub fn new(integrity: TreeIntegrity) -> Self {
        Self { integrity }
    }

    /// `{id, name}` pairs from the root down to the node itself.
    pub async fn breadcrumbs(
        &self,
        ctx: &RequestContext,
        node_id: NodeId,
    ) -> AppResult<Vec<Breadcrumb>> {
        let chain = self.integrity.ancestry(node_id).await?;
        if let Some(node) = chain.first() {
            ctx.ensure_owns(node)?;
        }

        Ok(chain
            .into_iter()
            .rev()
            .map(|node| Breadcrumb {
                id: node.id,
                name: node.name,
            })
            .collect())
    }

    /// Ancestor names joined by [`PATH_SEPARATOR`], with a leading separator.
    pub async fn full_path(&self, ctx: &RequestContext, node_id: NodeId) -> AppResult<String> {
        let crumbs = self.breadcrumbs(ctx, node_id).await?;
        Ok(join_path(&crumbs))
    }
}

/// Join breadcrumb names into `/a/b/c`.
pub fn join_path(crumbs: &[Breadcrumb]) -> String {
    let mut path = String::new();
    for crumb in crumbs {
        path.push(PATH_SEPARATOR);
        path.push_str(&crumb.name);
    }
    path
}
