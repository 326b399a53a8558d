//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Blob store and upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local blob store.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Prefix prepended to every generated storage key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Maximum upload size in bytes (default 100 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            key_prefix: default_key_prefix(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_root_path() -> String {
    "./data/blobs".to_string()
}

fn default_key_prefix() -> String {
    "file-manager".to_string()
}

fn default_max_upload() -> u64 {
    104_857_600 // 100 MB
}
