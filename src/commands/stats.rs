//! Dashboard statistics command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use filetree_core::error::AppError;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for `stats`
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Number of recent files to show (defaults to the configured limit)
    #[arg(short, long)]
    pub recent: Option<u32>,
}

/// One category of the breakdown.
#[derive(Debug, Serialize, Tabled)]
struct CategoryRow {
    /// Category
    category: String,
    /// File count
    files: u64,
    /// Total bytes
    bytes: u64,
}

/// Print statistics, usage, breakdown, and recent files.
pub async fn execute(app: &App, args: &StatsArgs, format: OutputFormat) -> Result<(), AppError> {
    let statistics = app.dashboard.statistics().await?;
    let usage = app.dashboard.storage_usage().await?;
    let breakdown = app.dashboard.breakdown().await?;
    let limit = args.recent.unwrap_or(app.config.tree.recent_files_limit);
    let recent = app.dashboard.recent_files(limit).await?;

    match format {
        OutputFormat::Json => output::print_item(
            &serde_json::json!({
                "statistics": statistics,
                "storage_usage": usage,
                "breakdown": breakdown,
                "recent_files": recent,
            }),
            format,
        ),
        OutputFormat::Table => {
            println!("Statistics");
            output::print_kv("Files", &statistics.total_files.to_string());
            output::print_kv("Folders", &statistics.total_folders.to_string());
            output::print_kv("Images", &statistics.total_images.to_string());
            output::print_kv("Videos", &statistics.total_videos.to_string());
            output::print_kv("Documents", &statistics.total_documents.to_string());
            output::print_kv("Archives", &statistics.total_archives.to_string());
            output::print_kv("In trash", &statistics.trashed_nodes.to_string());
            output::print_kv("Bytes stored", &usage.total_bytes.to_string());

            println!("\nBreakdown");
            let rows: Vec<CategoryRow> = breakdown
                .iter()
                .map(|t| CategoryRow {
                    category: t.category.label().to_string(),
                    files: t.file_count,
                    bytes: t.total_bytes,
                })
                .collect();
            output::print_list(&rows, format);

            println!("\nRecent files");
            output::print_nodes(&recent, format);
        }
    }
    Ok(())
}
