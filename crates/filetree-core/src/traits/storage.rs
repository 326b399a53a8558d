//! Blob store trait for pluggable file content backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Key-addressed storage for file bytes.
///
/// The metadata core only ever holds the opaque key returned by
/// [`BlobStore::put`]. Implementations report a missing key as
/// `ErrorKind::NotFound` and retryable failures as
/// `ErrorKind::ServiceUnavailable`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` and return the key it can be read back with.
    ///
    /// `suggested_key` is used verbatim when the backend accepts it.
    async fn put(&self, data: Bytes, suggested_key: &str) -> AppResult<String>;

    /// Read the complete contents stored under `key`.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Check whether anything is stored under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Remove the blob stored under `key`. Fails with `NotFound` if absent.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Size in bytes of the blob stored under `key`.
    async fn size(&self, key: &str) -> AppResult<u64>;

    /// Best-effort MIME type of the blob stored under `key`.
    async fn mime_type(&self, key: &str) -> AppResult<String>;
}
