//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use filetree_core::error::{AppError, ErrorKind};
use filetree_core::result::AppResult;
use filetree_core::traits::BlobStore;

use crate::mime;

/// Blob store writing each key as a file below a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BlobStore,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Map a key to a path inside the root. Keys that would escape it are
    /// rejected.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.trim().is_empty() || escapes {
            return Err(AppError::validation(format!("Invalid storage key: {key}")));
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobStore,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

/// Map an I/O failure on `key`, keeping missing files distinct.
fn io_error(key: &str, action: &str, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return AppError::not_found(format!("Blob not found: {key}"));
    }
    let mut mapped = AppError::from(err);
    mapped.message = format!("Failed to {action} blob {key}: {}", mapped.message);
    mapped
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn put(&self, data: Bytes, suggested_key: &str) -> AppResult<String> {
        let path = self.resolve(suggested_key)?;
        Self::ensure_parent(&path).await?;
        fs::write(&path, &data)
            .await
            .map_err(|e| io_error(suggested_key, "write", e))?;

        debug!(key = suggested_key, bytes = data.len(), "Stored blob");
        Ok(suggested_key.to_string())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let path = self.resolve(key)?;
        let data = fs::read(&path).await.map_err(|e| io_error(key, "read", e))?;
        Ok(Bytes::from(data))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, "inspect", e)),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.resolve(key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| io_error(key, "delete", e))?;

        debug!(key, "Deleted blob");
        Ok(())
    }

    async fn size(&self, key: &str) -> AppResult<u64> {
        let path = self.resolve(key)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|e| io_error(key, "inspect", e))?;
        Ok(meta.len())
    }

    async fn mime_type(&self, key: &str) -> AppResult<String> {
        if !self.exists(key).await? {
            return Err(AppError::not_found(format!("Blob not found: {key}")));
        }
        Ok(mime::guess_from_path(key)
            .unwrap_or(mime::OCTET_STREAM)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (_dir, store) = store().await;

        let key = store
            .put(Bytes::from("hello world"), "file-manager/u1/a.txt")
            .await
            .unwrap();
        assert_eq!(key, "file-manager/u1/a.txt");
        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), Bytes::from("hello world"));
        assert_eq!(store.size(&key).await.unwrap(), 11);
        assert_eq!(store.mime_type(&key).await.unwrap(), "text/plain");

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let (_dir, store) = store().await;

        let err = store.delete("nope.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = store.get("nope.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = store.mime_type("nope.bin").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_extension_falls_back() {
        let (_dir, store) = store().await;
        store.put(Bytes::from("x"), "blob.qqq").await.unwrap();
        assert_eq!(
            store.mime_type("blob.qqq").await.unwrap(),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_escaping_keys_rejected() {
        let (_dir, store) = store().await;
        let err = store
            .put(Bytes::from("x"), "../outside.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, store) = store().await;
        assert!(store.health_check().await.unwrap());
        assert_eq!(store.provider_type(), "local");
    }
}
