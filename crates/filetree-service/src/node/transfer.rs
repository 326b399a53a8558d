//! Upload and download.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::types::NodeId;
use filetree_entity::node::{CreateNode, FileAttributes, Node};
use filetree_storage::{mime, upload_key};

use super::service::NodeService;
use crate::context::RequestContext;
use crate::tree::validate_name;

/// A file handed over by the upload transport.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Name the client uploaded the file under.
    pub original_name: String,
    /// Complete content.
    pub bytes: Bytes,
    /// Client-declared MIME type, if any.
    pub mime_type: Option<String>,
}

/// File content ready to hand back to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDownload {
    /// Name to present, normally the original upload name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// The content.
    #[serde(skip)]
    pub content: Bytes,
}

/// Lowercase extension of `name`, if it has a non-empty stem and suffix.
fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

impl NodeService {
    /// Stores an uploaded file under `parent_id`.
    ///
    /// The blob is written first; if the node row cannot be created the
    /// blob is deleted again.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        parent_id: Option<NodeId>,
        file: UploadFile,
    ) -> AppResult<Node> {
        let size = file.bytes.len() as u64;
        if size > self.config.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }

        let name = validate_name(&file.original_name)?;
        self.require_container(ctx, parent_id).await?;
        self.integrity
            .ensure_unique_name(ctx.owner_id, parent_id, &name, None)
            .await?;
        self.integrity.ensure_depth_allows(parent_id, 0).await?;

        let extension = extension_of(&name);
        let suggested = upload_key(&self.config.key_prefix, ctx.owner_id, extension.as_deref());
        let storage_key = self.blobs.put(file.bytes, &suggested).await?;

        let mime_type = match file.mime_type.filter(|m| !m.trim().is_empty()) {
            Some(declared) => declared,
            None => self
                .blobs
                .mime_type(&storage_key)
                .await
                .unwrap_or_else(|_| mime::OCTET_STREAM.to_string()),
        };

        let attributes = FileAttributes {
            original_name: Some(file.original_name.trim().to_string()),
            size_bytes: i64::try_from(size)
                .map_err(|_| AppError::validation("File is too large"))?,
            mime_type: Some(mime_type),
            extension,
            storage_key: Some(storage_key.clone()),
        };

        let created = self
            .repo
            .create(&CreateNode::file(ctx.owner_id, parent_id, name, attributes))
            .await;

        let node = match created {
            Ok(node) => node,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&storage_key).await {
                    warn!(
                        key = %storage_key,
                        error = %cleanup,
                        "Failed to remove blob of rejected upload"
                    );
                }
                return Err(e);
            }
        };

        info!(
            owner_id = %ctx.owner_id,
            node_id = %node.id,
            name = %node.name,
            size = node.size_bytes,
            "File uploaded"
        );
        Ok(node)
    }

    /// Reads back the content of a file the caller owns.
    pub async fn download(&self, ctx: &RequestContext, id: NodeId) -> AppResult<FileDownload> {
        let node = self.get(ctx, id).await?;
        if !node.is_file() {
            return Err(AppError::validation("Folders cannot be downloaded"));
        }
        let key = node
            .storage_key
            .as_deref()
            .ok_or_else(|| AppError::not_found(format!("File {id} has no stored content")))?;

        let content = self.blobs.get(key).await?;
        Ok(FileDownload {
            file_name: node.original_name.clone().unwrap_or_else(|| node.name.clone()),
            mime_type: node
                .mime_type
                .clone()
                .unwrap_or_else(|| mime::OCTET_STREAM.to_string()),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use filetree_core::config::StorageConfig;
    use filetree_core::error::ErrorKind;
    use filetree_core::types::OwnerId;
    use filetree_database::MemoryNodeRepository;
    use filetree_storage::MemoryBlobStore;

    use crate::tree::TreeIntegrity;

    fn service(max_upload: u64) -> (NodeService, MemoryBlobStore, RequestContext) {
        let repo = Arc::new(MemoryNodeRepository::new());
        let blobs = MemoryBlobStore::new();
        let config = StorageConfig {
            max_upload_size_bytes: max_upload,
            ..StorageConfig::default()
        };
        let service = NodeService::new(
            repo.clone(),
            Arc::new(blobs.clone()),
            TreeIntegrity::new(repo, 64),
            config,
        );
        (service, blobs, RequestContext::new(OwnerId::new()))
    }

    fn upload(name: &str, body: &'static str, mime: Option<&str>) -> UploadFile {
        UploadFile {
            original_name: name.to_string(),
            bytes: Bytes::from_static(body.as_bytes()),
            mime_type: mime.map(str::to_string),
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Photo.JPG"), Some("jpg".into()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".into()));
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let (service, blobs, ctx) = service(1024);
        let node = service
            .upload(&ctx, None, upload("Cat.PNG", "meow", None))
            .await
            .unwrap();

        assert!(node.is_file());
        assert_eq!(node.size_bytes, 4);
        assert_eq!(node.extension.as_deref(), Some("png"));
        assert_eq!(node.mime_type.as_deref(), Some("image/png"));
        let key = node.storage_key.clone().unwrap();
        assert!(key.starts_with(&format!("file-manager/{}/", ctx.owner_id)));
        assert_eq!(blobs.len(), 1);

        let download = service.download(&ctx, node.id).await.unwrap();
        assert_eq!(download.file_name, "Cat.PNG");
        assert_eq!(download.content, Bytes::from_static(b"meow"));
    }

    #[tokio::test]
    async fn test_declared_mime_wins() {
        let (service, _blobs, ctx) = service(1024);
        let node = service
            .upload(&ctx, None, upload("notes", "x", Some("text/markdown")))
            .await
            .unwrap();
        assert_eq!(node.mime_type.as_deref(), Some("text/markdown"));
        assert_eq!(node.extension, None);
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let (service, blobs, ctx) = service(3);
        let err = service
            .upload(&ctx, None, upload("big.txt", "four", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        service
            .upload(&ctx, None, upload("a.txt", "abc", None))
            .await
            .unwrap();
        let err = service
            .upload(&ctx, None, upload("a.txt", "abc", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameConflict);
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn test_download_missing_blob() {
        let (service, blobs, ctx) = service(1024);
        let node = service
            .upload(&ctx, None, upload("a.txt", "abc", None))
            .await
            .unwrap();
        blobs.evict(node.storage_key.as_deref().unwrap());

        let err = service.download(&ctx, node.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let folder = service.create_folder(&ctx, None, "dir").await.unwrap();
        let err = service.download(&ctx, folder.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
