//! Move, trash, restore, and purge commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use filetree_core::error::AppError;
use filetree_core::types::NodeId;
use filetree_service::{BatchOutcome, RequestContext};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MvArgs {
    /// Nodes to move
    #[arg(required = true)]
    pub ids: Vec<NodeId>,
    /// Destination folder (omit to move to the root level)
    #[arg(short, long)]
    pub to: Option<NodeId>,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RmArgs {
    /// Nodes to move to the trash
    #[arg(required = true)]
    pub ids: Vec<NodeId>,
}

/// A single node argument
#[derive(Debug, Args)]
pub struct NodeArg {
    /// Node ID
    pub id: NodeId,
}

/// One batch item as a table row.
#[derive(Debug, Serialize, Tabled)]
struct BatchRow {
    /// Node ID
    id: String,
    /// Result
    result: String,
    /// Reason for failure
    reason: String,
}

fn print_batch(outcome: &BatchOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(outcome, format),
        OutputFormat::Table => {
            let mut rows: Vec<BatchRow> = outcome
                .succeeded
                .iter()
                .map(|id| BatchRow {
                    id: id.to_string(),
                    result: "ok".to_string(),
                    reason: String::new(),
                })
                .collect();
            rows.extend(outcome.failed.iter().map(|f| BatchRow {
                id: f.id.to_string(),
                result: f.kind.to_string(),
                reason: f.message.clone(),
            }));
            output::print_list(&rows, format);
            if !outcome.is_complete() {
                output::print_warning(&format!(
                    "{} of {} items failed",
                    outcome.failed.len(),
                    outcome.failed.len() + outcome.succeeded.len()
                ));
            }
        }
    }
}

/// Move nodes.
pub async fn mv(
    app: &App,
    ctx: &RequestContext,
    args: &MvArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let outcome = app.lifecycle.move_many(ctx, &args.ids, args.to).await;
    print_batch(&outcome, format);
    Ok(())
}

/// Trash nodes.
pub async fn rm(
    app: &App,
    ctx: &RequestContext,
    args: &RmArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let outcome = app.lifecycle.delete_many(ctx, &args.ids).await;
    print_batch(&outcome, format);
    Ok(())
}

/// Restore a node and its trashed descendants.
pub async fn restore(
    app: &App,
    ctx: &RequestContext,
    args: &NodeArg,
    format: OutputFormat,
) -> Result<(), AppError> {
    let restored = app.lifecycle.restore(ctx, args.id).await?;
    match format {
        OutputFormat::Table => output::print_success(&format!("Restored {restored} item(s)")),
        OutputFormat::Json => output::print_item(&serde_json::json!({ "restored": restored }), format),
    }
    Ok(())
}

/// Permanently delete a node.
pub async fn purge(
    app: &App,
    ctx: &RequestContext,
    args: &NodeArg,
    format: OutputFormat,
) -> Result<(), AppError> {
    let report = app.lifecycle.force_delete(ctx, args.id).await?;
    match format {
        OutputFormat::Table => {
            output::print_success(&format!("Removed {} item(s)", report.nodes_removed));
            output::print_kv("Blobs deleted", &report.blobs_deleted.to_string());
            output::print_kv("Blobs already missing", &report.blobs_missing.to_string());
            if report.blobs_failed > 0 {
                output::print_warning(&format!(
                    "{} blob(s) could not be deleted and were left in storage",
                    report.blobs_failed
                ));
            }
        }
        OutputFormat::Json => output::print_item(&report, format),
    }
    Ok(())
}

/// List the owner's trash.
pub async fn trash(app: &App, ctx: &RequestContext, format: OutputFormat) -> Result<(), AppError> {
    let trashed = app.nodes.list_trash(ctx).await?;
    output::print_nodes(&trashed, format);
    Ok(())
}
