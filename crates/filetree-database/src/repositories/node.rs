//! PostgreSQL node repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use filetree_core::error::{AppError, ErrorKind};
use filetree_core::result::AppResult;
use filetree_core::types::{NodeId, OwnerId};
use filetree_entity::node::{CreateNode, Node, NodeKind, NodeUpdate, TrashState};
use filetree_entity::stats::MimeTotal;

use super::NodeRepository;

/// Partial unique index over active sibling names.
const ACTIVE_NAME_INDEX: &str = "nodes_active_sibling_name_key";
/// Check constraint forbidding `parent_id = id`.
const SELF_PARENT_CHECK: &str = "nodes_no_self_parent";

/// Raw `nodes` row; the trash columns are folded into [`TrashState`].
#[derive(Debug, sqlx::FromRow)]
struct NodeRow {
    id: NodeId,
    name: String,
    original_name: Option<String>,
    kind: NodeKind,
    parent_id: Option<NodeId>,
    size_bytes: i64,
    mime_type: Option<String>,
    extension: Option<String>,
    storage_key: Option<String>,
    owner_id: OwnerId,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NodeRow> for Node {
    type Error = AppError;

    fn try_from(row: NodeRow) -> AppResult<Self> {
        let trash = TrashState::from_columns(row.is_deleted, row.deleted_at).map_err(|e| {
            AppError::integrity(format!("Node {} has {}", row.id, e.message))
        })?;
        Ok(Node {
            id: row.id,
            name: row.name,
            original_name: row.original_name,
            kind: row.kind,
            parent_id: row.parent_id,
            size_bytes: row.size_bytes,
            mime_type: row.mime_type,
            extension: row.extension,
            storage_key: row.storage_key,
            owner_id: row.owner_id,
            trash,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MimeTotalRow {
    mime_type: Option<String>,
    file_count: i64,
    total_bytes: i64,
}

fn into_nodes(rows: Vec<NodeRow>) -> AppResult<Vec<Node>> {
    rows.into_iter().map(Node::try_from).collect()
}

fn uuids(ids: &[NodeId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Map a failed write, translating constraint violations into domain kinds.
fn write_error(err: sqlx::Error, name: Option<&str>, context: &'static str) -> AppError {
    let (constraint, foreign_key) = match &err {
        sqlx::Error::Database(db_err) => (
            db_err.constraint().map(str::to_string),
            db_err.is_foreign_key_violation(),
        ),
        _ => (None, false),
    };

    match constraint.as_deref() {
        Some(ACTIVE_NAME_INDEX) => AppError::name_conflict(format!(
            "An active node named '{}' already exists in this folder",
            name.unwrap_or_default()
        )),
        Some(SELF_PARENT_CHECK) => AppError::cycle_rejected("A node cannot be its own parent"),
        _ if foreign_key => AppError::with_source(
            ErrorKind::Conflict,
            "Parent is missing or node still has children",
            err,
        ),
        _ => AppError::with_source(ErrorKind::Database, context, err),
    }
}

/// Node repository backed by the `nodes` table.
#[derive(Debug, Clone)]
pub struct PgNodeRepository {
    pool: PgPool,
}

impl PgNodeRepository {
    /// Create a new node repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<sqlx::Transaction<'static, sqlx::Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))
    }

    /// Serialize structural writes of `owner_id` until the transaction ends.
    ///
    /// Every write that can change the shape or trash state of a tree takes
    /// this lock before any row lock.
    async fn lock_owner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: OwnerId,
    ) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::uuid::text, 0))")
            .bind(owner_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to lock owner"))?;
        Ok(())
    }

    /// Take the owner lock of every owner in `ids`, in a fixed order.
    async fn lock_owners_of(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[Uuid],
    ) -> AppResult<()> {
        let owners: Vec<OwnerId> = sqlx::query_scalar(
            "SELECT DISTINCT owner_id FROM nodes WHERE id = ANY($1) ORDER BY owner_id",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_error("Failed to resolve node owners"))?;

        for owner_id in owners {
            Self::lock_owner(tx, owner_id).await?;
        }
        Ok(())
    }

    /// Fail with `Validation` if `parent_id` is trashed.
    async fn ensure_parent_active(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: NodeId,
    ) -> AppResult<()> {
        let trashed: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM nodes WHERE id = $1 FOR SHARE")
                .bind(parent_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(db_error("Failed to check parent"))?;
        if trashed == Some(true) {
            return Err(AppError::validation(format!(
                "Parent folder {parent_id} is in the trash"
            )));
        }
        Ok(())
    }

    /// Fail with `CycleRejected` if `new_parent` is `id` or lies below it.
    async fn ensure_not_descendant(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: NodeId,
        new_parent: NodeId,
    ) -> AppResult<()> {
        let looped: bool = sqlx::query_scalar(
            "WITH RECURSIVE ancestors (id, parent_id) AS ( \
                SELECT id, parent_id FROM nodes WHERE id = $1 \
                UNION \
                SELECT n.id, n.parent_id FROM nodes n \
                INNER JOIN ancestors a ON n.id = a.parent_id \
             ) SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)",
        )
        .bind(new_parent)
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error("Failed to check ancestry"))?;

        if looped {
            return Err(AppError::cycle_rejected(format!(
                "Cannot move node {id} under one of its own descendants"
            )));
        }
        Ok(())
    }

    /// Lock `ids` for the rest of the transaction.
    async fn lock_rows(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[Uuid],
    ) -> AppResult<()> {
        sqlx::query("SELECT id FROM nodes WHERE id = ANY($1) FOR UPDATE")
            .bind(ids)
            .fetch_all(&mut **tx)
            .await
            .map_err(db_error("Failed to lock nodes"))?;
        Ok(())
    }
}

#[async_trait]
impl NodeRepository for PgNodeRepository {
    async fn create(&self, data: &CreateNode) -> AppResult<Node> {
        let node = Node::from_create(data, Utc::now());
        let mut tx = self.begin().await?;
        Self::lock_owner(&mut tx, data.owner_id).await?;
        if let Some(parent_id) = data.parent_id {
            Self::ensure_parent_active(&mut tx, parent_id).await?;
        }

        let row = sqlx::query_as::<_, NodeRow>(
            "INSERT INTO nodes (id, name, original_name, kind, parent_id, size_bytes, \
             mime_type, extension, storage_key, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(node.id)
        .bind(&node.name)
        .bind(&node.original_name)
        .bind(node.kind)
        .bind(node.parent_id)
        .bind(node.size_bytes)
        .bind(&node.mime_type)
        .bind(&node.extension)
        .bind(&node.storage_key)
        .bind(node.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, Some(&data.name), "Failed to create node"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Node::try_from(row)
    }

    async fn find_by_id(&self, id: NodeId) -> AppResult<Option<Node>> {
        sqlx::query_as::<_, NodeRow>("SELECT * FROM nodes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find node"))?
            .map(Node::try_from)
            .transpose()
    }

    async fn update(
        &self,
        id: NodeId,
        changes: &NodeUpdate,
        expected_version: i64,
    ) -> AppResult<Node> {
        let Some(current) = self.find_by_id(id).await? else {
            return Err(AppError::not_found(format!("Node {id} not found")));
        };
        let mut tx = self.begin().await?;
        Self::lock_owner(&mut tx, current.owner_id).await?;

        // Re-read under the lock; moves committed meanwhile are visible now.
        let locked =
            sqlx::query_as::<_, NodeRow>("SELECT * FROM nodes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock node"))?
                .map(Node::try_from)
                .transpose()?
                .ok_or_else(|| AppError::not_found(format!("Node {id} not found")))?;

        if let Some(Some(parent_id)) = changes.parent_id {
            if Some(parent_id) != locked.parent_id {
                Self::ensure_not_descendant(&mut tx, id, parent_id).await?;
                if !locked.is_deleted() {
                    Self::ensure_parent_active(&mut tx, parent_id).await?;
                }
            }
        }

        let row = sqlx::query_as::<_, NodeRow>(
            "UPDATE nodes SET \
                name = COALESCE($3, name), \
                parent_id = CASE WHEN $4 THEN $5 ELSE parent_id END, \
                version = version + 1, \
                updated_at = NOW() \
             WHERE id = $1 AND version = $2 RETURNING *",
        )
        .bind(id)
        .bind(expected_version)
        .bind(changes.name.as_deref())
        .bind(changes.parent_id.is_some())
        .bind(changes.parent_id.flatten())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| write_error(e, changes.name.as_deref(), "Failed to update node"))?;

        let Some(row) = row else {
            return Err(AppError::conflict(format!(
                "Node {id} changed concurrently (expected version {expected_version}, found {})",
                locked.version
            )));
        };
        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Node::try_from(row)
    }

    async fn children_of(
        &self,
        parent_id: Option<NodeId>,
        owner_id: OwnerId,
        include_deleted: bool,
    ) -> AppResult<Vec<Node>> {
        let rows = match parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, NodeRow>(
                    "SELECT * FROM nodes \
                     WHERE owner_id = $1 AND parent_id = $2 AND ($3 OR NOT is_deleted) \
                     ORDER BY (kind = 'folder') DESC, name ASC",
                )
                .bind(owner_id)
                .bind(parent_id)
                .bind(include_deleted)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, NodeRow>(
                    "SELECT * FROM nodes \
                     WHERE owner_id = $1 AND parent_id IS NULL AND ($2 OR NOT is_deleted) \
                     ORDER BY (kind = 'folder') DESC, name ASC",
                )
                .bind(owner_id)
                .bind(include_deleted)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(db_error("Failed to list children"))?;

        into_nodes(rows)
    }

    async fn find_by_parent_and_name(
        &self,
        parent_id: Option<NodeId>,
        name: &str,
        owner_id: OwnerId,
    ) -> AppResult<Option<Node>> {
        let row = match parent_id {
            Some(parent_id) => {
                sqlx::query_as::<_, NodeRow>(
                    "SELECT * FROM nodes \
                     WHERE owner_id = $1 AND parent_id = $2 AND name = $3 AND NOT is_deleted",
                )
                .bind(owner_id)
                .bind(parent_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, NodeRow>(
                    "SELECT * FROM nodes \
                     WHERE owner_id = $1 AND parent_id IS NULL AND name = $2 AND NOT is_deleted",
                )
                .bind(owner_id)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(db_error("Failed to find node by name"))?;

        row.map(Node::try_from).transpose()
    }

    async fn subtree(&self, root_id: NodeId, max_depth: usize) -> AppResult<Vec<Node>> {
        let depth_limit = i32::try_from(max_depth).unwrap_or(i32::MAX);
        let rows = sqlx::query_as::<_, NodeRow>(
            "WITH RECURSIVE subtree AS ( \
                SELECT n.*, 0 AS depth FROM nodes n WHERE n.id = $1 \
                UNION ALL \
                SELECT c.*, s.depth + 1 FROM nodes c \
                INNER JOIN subtree s ON c.parent_id = s.id \
                WHERE s.depth < $2 \
             ) SELECT * FROM subtree ORDER BY depth ASC, name ASC",
        )
        .bind(root_id)
        .bind(depth_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load subtree"))?;

        into_nodes(rows)
    }

    async fn mark_trashed(&self, ids: &[NodeId], at: DateTime<Utc>) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = uuids(ids);
        let mut tx = self.begin().await?;
        Self::lock_owners_of(&mut tx, &ids).await?;
        Self::lock_rows(&mut tx, &ids).await?;

        // Children inserted after the caller read the subtree are caught here.
        let result = sqlx::query(
            "WITH RECURSIVE doomed (id) AS ( \
                SELECT id FROM nodes WHERE id = ANY($1) \
                UNION \
                SELECT c.id FROM nodes c INNER JOIN doomed d ON c.parent_id = d.id \
             ) \
             UPDATE nodes SET is_deleted = TRUE, deleted_at = $2, \
             version = version + 1, updated_at = NOW() \
             WHERE id IN (SELECT id FROM doomed) AND NOT is_deleted",
        )
        .bind(&ids)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to trash nodes"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(result.rows_affected())
    }

    async fn mark_restored(&self, ids: &[NodeId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = uuids(ids);
        let mut tx = self.begin().await?;
        Self::lock_owners_of(&mut tx, &ids).await?;
        Self::lock_rows(&mut tx, &ids).await?;

        let result = sqlx::query(
            "UPDATE nodes SET is_deleted = FALSE, deleted_at = NULL, \
             version = version + 1, updated_at = NOW() \
             WHERE id = ANY($1) AND is_deleted",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, None, "Failed to restore nodes"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: NodeId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, None, "Failed to delete node"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[NodeId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let locked = uuids(ids);
        let mut tx = self.begin().await?;
        Self::lock_owners_of(&mut tx, &locked).await?;
        Self::lock_rows(&mut tx, &locked).await?;

        let mut removed = 0;
        for id in ids {
            let result = sqlx::query("DELETE FROM nodes WHERE id = $1")
                .bind(*id)
                .execute(&mut *tx)
                .await
                .map_err(|e| write_error(e, None, "Failed to delete node"))?;
            removed += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(removed)
    }

    async fn trashed(&self, owner_id: OwnerId) -> AppResult<Vec<Node>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM nodes WHERE owner_id = $1 AND is_deleted \
             ORDER BY deleted_at DESC, name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list trash"))?;

        into_nodes(rows)
    }

    async fn file_totals_by_mime(&self) -> AppResult<Vec<MimeTotal>> {
        let rows = sqlx::query_as::<_, MimeTotalRow>(
            "SELECT mime_type, COUNT(*) AS file_count, \
                    COALESCE(SUM(size_bytes), 0)::BIGINT AS total_bytes \
             FROM nodes WHERE kind = 'file' AND NOT is_deleted \
             GROUP BY mime_type",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to aggregate files by MIME type"))?;

        Ok(rows
            .into_iter()
            .map(|row| MimeTotal {
                mime_type: row.mime_type,
                file_count: row.file_count.max(0) as u64,
                total_bytes: row.total_bytes.max(0) as u64,
            })
            .collect())
    }

    async fn count_active_folders(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM nodes WHERE kind = 'folder' AND NOT is_deleted",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count folders"))?;
        Ok(count.max(0) as u64)
    }

    async fn count_trashed(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes WHERE is_deleted")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count trashed nodes"))?;
        Ok(count.max(0) as u64)
    }

    async fn recent_files(&self, limit: u32) -> AppResult<Vec<Node>> {
        let rows = sqlx::query_as::<_, NodeRow>(
            "SELECT * FROM nodes WHERE kind = 'file' AND NOT is_deleted \
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list recent files"))?;

        into_nodes(rows)
    }
}
