//! Batch move and delete with per-item results.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use filetree_core::error::{AppError, ErrorKind};
use filetree_core::types::NodeId;

use super::service::LifecycleService;
use crate::context::RequestContext;

/// An item a batch could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The node that failed.
    pub id: NodeId,
    /// Why, as an error kind callers can branch on.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub message: String,
}

/// Per-item results of a batch. Partial success is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Items that went through, in request order.
    pub succeeded: Vec<NodeId>,
    /// Items that failed, in request order.
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    fn record(&mut self, id: NodeId, result: Result<(), AppError>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(e) => {
                if e.is_integrity_failure() {
                    error!(node_id = %id, error = %e, "Batch item hit corrupted tree data");
                }
                self.failed.push(BatchFailure {
                    id,
                    kind: e.kind,
                    message: e.message,
                });
            }
        }
    }

    /// Whether every item succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl LifecycleService {
    /// Moves each node under `new_parent` independently.
    pub async fn move_many(
        &self,
        ctx: &RequestContext,
        ids: &[NodeId],
        new_parent: Option<NodeId>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            let result = self.move_node(ctx, *id, new_parent).await.map(|_| ());
            outcome.record(*id, result);
        }

        info!(
            owner_id = %ctx.owner_id,
            moved = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Batch move finished"
        );
        outcome
    }

    /// Soft-deletes each node independently.
    pub async fn delete_many(&self, ctx: &RequestContext, ids: &[NodeId]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for id in ids {
            let result = self.soft_delete(ctx, *id).await.map(|_| ());
            outcome.record(*id, result);
        }

        info!(
            owner_id = %ctx.owner_id,
            deleted = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Batch delete finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_results() {
        let ok = NodeId::new();
        let bad = NodeId::new();
        let mut outcome = BatchOutcome::default();
        outcome.record(ok, Ok(()));
        outcome.record(bad, Err(AppError::cycle_rejected("loop")));

        assert_eq!(outcome.succeeded, vec![ok]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id, bad);
        assert_eq!(outcome.failed[0].kind, ErrorKind::CycleRejected);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_serializes_for_clients() {
        let outcome = BatchOutcome {
            succeeded: vec![],
            failed: vec![BatchFailure {
                id: NodeId::new(),
                kind: ErrorKind::NameConflict,
                message: "taken".into(),
            }],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["failed"][0]["kind"], "NameConflict");
    }
}
