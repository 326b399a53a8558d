//! CLI command definitions and dispatch.

pub mod lifecycle;
pub mod migrate;
pub mod node;
pub mod stats;

use clap::{Parser, Subcommand};

use filetree_core::config::AppConfig;
use filetree_core::error::AppError;
use filetree_core::traits::StaticIdentity;
use filetree_core::types::OwnerId;
use filetree_service::RequestContext;

use crate::app::App;
use crate::output::OutputFormat;

/// FileTree: hierarchical file and folder manager with a trash
#[derive(Debug, Parser)]
#[command(name = "filetree", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Owner on whose behalf the command runs
    #[arg(long, global = true)]
    pub owner: Option<OwnerId>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// List the active children of a folder (root level by default)
    Ls(node::LsArgs),
    /// Create a folder
    Mkdir(node::MkdirArgs),
    /// Upload a local file
    Put(node::PutArgs),
    /// Rename a node
    Rename(node::RenameArgs),
    /// Show the breadcrumbs and full path of a node
    Path(node::PathArgs),
    /// Move nodes under another folder
    Mv(lifecycle::MvArgs),
    /// Move nodes to the trash
    Rm(lifecycle::RmArgs),
    /// Restore a node from the trash
    Restore(lifecycle::NodeArg),
    /// Permanently delete a node, its descendants, and their content
    Purge(lifecycle::NodeArg),
    /// List trashed nodes
    Trash,
    /// Show cross-owner statistics
    Stats(stats::StatsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        if let Commands::Migrate = self.command {
            return migrate::execute(&config).await;
        }

        let app = App::connect(config).await?;
        let format = self.format;
        match &self.command {
            Commands::Migrate => Ok(()),
            Commands::Ls(args) => node::ls(&app, &self.context()?, args, format).await,
            Commands::Mkdir(args) => node::mkdir(&app, &self.context()?, args, format).await,
            Commands::Put(args) => node::put(&app, &self.context()?, args, format).await,
            Commands::Rename(args) => node::rename(&app, &self.context()?, args, format).await,
            Commands::Path(args) => node::path(&app, &self.context()?, args, format).await,
            Commands::Mv(args) => lifecycle::mv(&app, &self.context()?, args, format).await,
            Commands::Rm(args) => lifecycle::rm(&app, &self.context()?, args, format).await,
            Commands::Restore(args) => {
                lifecycle::restore(&app, &self.context()?, args, format).await
            }
            Commands::Purge(args) => lifecycle::purge(&app, &self.context()?, args, format).await,
            Commands::Trash => lifecycle::trash(&app, &self.context()?, format).await,
            Commands::Stats(args) => stats::execute(&app, args, format).await,
        }
    }

    /// The request context for `--owner`.
    fn context(&self) -> Result<RequestContext, AppError> {
        let owner = self
            .owner
            .ok_or_else(|| AppError::validation("--owner is required for this command"))?;
        RequestContext::from_identity(&StaticIdentity(owner))
    }
}
