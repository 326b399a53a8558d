//! # filetree-storage
//!
//! [`BlobStore`](filetree_core::traits::BlobStore) providers for FileTree:
//! a local filesystem store for deployments and an in-memory store with
//! failure injection for tests.

pub mod keys;
pub mod mime;
pub mod providers;

pub use keys::upload_key;
pub use providers::{LocalBlobStore, MemoryBlobStore};
