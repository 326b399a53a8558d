//! In-memory blob store with failure injection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::{DashMap, DashSet};
use tracing::debug;

use filetree_core::error::AppError;
use filetree_core::result::AppResult;
use filetree_core::traits::BlobStore;

use crate::mime;

/// Blob store kept in a concurrent map.
///
/// Clones share state, so a test can keep one handle for assertions while
/// services own another. Every `delete` call is counted per key, including
/// calls that fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, Bytes>>,
    delete_calls: Arc<DashMap<String, u32>>,
    transient_delete_failures: Arc<AtomicU32>,
    broken_keys: Arc<DashSet<String>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` deletes fail with a retryable error.
    pub fn fail_next_deletes(&self, count: u32) {
        self.transient_delete_failures
            .store(count, Ordering::SeqCst);
    }

    /// Make every delete of `key` fail permanently.
    pub fn break_key(&self, key: &str) {
        self.broken_keys.insert(key.to_string());
    }

    /// Remove a blob behind the metadata's back, as an external cleanup would.
    pub fn evict(&self, key: &str) -> bool {
        self.blobs.remove(key).is_some()
    }

    /// How many times `delete` was called for `key`.
    pub fn delete_calls(&self, key: &str) -> u32 {
        self.delete_calls.get(key).map(|c| *c).unwrap_or(0)
    }

    /// Total number of `delete` calls across all keys.
    pub fn total_delete_calls(&self) -> u32 {
        self.delete_calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn take_transient_failure(&self) -> bool {
        self.transient_delete_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, data: Bytes, suggested_key: &str) -> AppResult<String> {
        if suggested_key.trim().is_empty() {
            return Err(AppError::validation("Storage key must not be empty"));
        }
        debug!(key = suggested_key, bytes = data.len(), "Stored blob in memory");
        self.blobs.insert(suggested_key.to_string(), data);
        Ok(suggested_key.to_string())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        self.blobs
            .get(key)
            .map(|b| b.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {key}")))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(key))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        *self.delete_calls.entry(key.to_string()).or_insert(0) += 1;

        if self.take_transient_failure() {
            return Err(AppError::service_unavailable(format!(
                "Blob store busy while deleting {key}"
            )));
        }
        if self.broken_keys.contains(key) {
            return Err(AppError::blob_store(format!("Blob {key} cannot be deleted")));
        }

        self.blobs
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {key}")))
    }

    async fn size(&self, key: &str) -> AppResult<u64> {
        self.blobs
            .get(key)
            .map(|b| b.len() as u64)
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {key}")))
    }

    async fn mime_type(&self, key: &str) -> AppResult<String> {
        if !self.blobs.contains_key(key) {
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
    use filetree_core::error::ErrorKind;

    #[tokio::test]
    async fn test_roundtrip_and_counts() {
        let store = MemoryBlobStore::new();
        let key = store.put(Bytes::from("abc"), "k/one.png").await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Bytes::from("abc"));
        assert_eq!(store.size(&key).await.unwrap(), 3);
        assert_eq!(store.mime_type(&key).await.unwrap(), "image/png");

        store.delete(&key).await.unwrap();
        let err = store.delete(&key).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(store.delete_calls(&key), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_are_consumed() {
        let store = MemoryBlobStore::new();
        store.put(Bytes::from("x"), "a").await.unwrap();
        store.fail_next_deletes(2);

        assert!(store.delete("a").await.unwrap_err().is_transient());
        assert!(store.delete("a").await.unwrap_err().is_transient());
        store.delete("a").await.unwrap();
        assert_eq!(store.delete_calls("a"), 3);
    }

    #[tokio::test]
    async fn test_broken_key_fails_permanently() {
        let store = MemoryBlobStore::new();
        store.put(Bytes::from("x"), "bad").await.unwrap();
        store.break_key("bad");

        let err = store.delete("bad").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BlobStore);
        assert!(!err.is_transient());
        assert!(store.exists("bad").await.unwrap());
    }
}
