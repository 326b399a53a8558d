//! Folder, upload, rename, listing, and path commands.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;

use filetree_core::error::AppError;
use filetree_core::types::NodeId;
use filetree_service::{RequestContext, UploadFile};
use filetree_service::tree::path::join_path;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder to list (omit for the root level)
    pub parent: Option<NodeId>,
}

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,
    /// Parent folder (omit for the root level)
    #[arg(short, long)]
    pub parent: Option<NodeId>,
}

/// Arguments for `put`
#[derive(Debug, Args)]
pub struct PutArgs {
    /// Local file to upload
    pub file: PathBuf,
    /// Target folder (omit for the root level)
    #[arg(short, long)]
    pub parent: Option<NodeId>,
    /// Name to store the file under (defaults to the local file name)
    #[arg(short, long)]
    pub name: Option<String>,
    /// MIME type (guessed from the name when omitted)
    #[arg(short, long)]
    pub mime: Option<String>,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Node to rename
    pub id: NodeId,
    /// New name
    pub name: String,
}

/// Arguments for `path`
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Node to resolve
    pub id: NodeId,
}

/// List active children.
pub async fn ls(
    app: &App,
    ctx: &RequestContext,
    args: &LsArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let children = app.nodes.list_children(ctx, args.parent).await?;
    output::print_nodes(&children, format);
    Ok(())
}

/// Create a folder.
pub async fn mkdir(
    app: &App,
    ctx: &RequestContext,
    args: &MkdirArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let folder = app.nodes.create_folder(ctx, args.parent, &args.name).await?;
    match format {
        OutputFormat::Table => {
            output::print_success(&format!("Folder '{}' created (id: {})", folder.name, folder.id))
        }
        OutputFormat::Json => output::print_item(&folder, format),
    }
    Ok(())
}

/// Upload a local file.
pub async fn put(
    app: &App,
    ctx: &RequestContext,
    args: &PutArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let original_name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::validation("Cannot derive a name from the file path"))?,
    };
    let bytes = tokio::fs::read(&args.file).await.map_err(|e| {
        AppError::with_source(
            filetree_core::error::ErrorKind::Validation,
            format!("Cannot read {}: {e}", args.file.display()),
            e,
        )
    })?;

    let file = app
        .nodes
        .upload(
            ctx,
            args.parent,
            UploadFile {
                original_name,
                bytes: Bytes::from(bytes),
                mime_type: args.mime.clone(),
            },
        )
        .await?;

    match format {
        OutputFormat::Table => output::print_success(&format!(
            "Uploaded '{}' ({} bytes, id: {})",
            file.name, file.size_bytes, file.id
        )),
        OutputFormat::Json => output::print_item(&file, format),
    }
    Ok(())
}

/// Rename a node.
pub async fn rename(
    app: &App,
    ctx: &RequestContext,
    args: &RenameArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let node = app.nodes.rename(ctx, args.id, &args.name).await?;
    match format {
        OutputFormat::Table => output::print_success(&format!("Renamed to '{}'", node.name)),
        OutputFormat::Json => output::print_item(&node, format),
    }
    Ok(())
}

/// Show breadcrumbs and the full path.
pub async fn path(
    app: &App,
    ctx: &RequestContext,
    args: &PathArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let crumbs = app.paths.breadcrumbs(ctx, args.id).await?;
    match format {
        OutputFormat::Table => {
            output::print_kv("Path", &join_path(&crumbs));
            for crumb in &crumbs {
                output::print_kv(&crumb.id.to_string(), &crumb.name);
            }
        }
        OutputFormat::Json => output::print_item(&crumbs, format),
    }
    Ok(())
}
