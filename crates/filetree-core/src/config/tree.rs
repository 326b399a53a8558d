//! Tree traversal and lifecycle tuning.

use serde::{Deserialize, Serialize};

/// Bounds and retry policy for tree operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum number of parent hops any walk may take. Nodes live at depth
    /// `0..max_depth`; anything deeper is treated as corrupted data.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// How many times a blob deletion is attempted during force delete
    /// when the store reports a transient failure.
    #[serde(default = "default_blob_delete_attempts")]
    pub blob_delete_attempts: u32,
    /// Pause between blob deletion attempts, in milliseconds.
    #[serde(default = "default_blob_retry_backoff")]
    pub blob_retry_backoff_ms: u64,
    /// Number of entries in the dashboard "recent files" list.
    #[serde(default = "default_recent_files_limit")]
    pub recent_files_limit: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            blob_delete_attempts: default_blob_delete_attempts(),
            blob_retry_backoff_ms: default_blob_retry_backoff(),
            recent_files_limit: default_recent_files_limit(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_blob_delete_attempts() -> u32 {
    3
}

fn default_blob_retry_backoff() -> u64 {
    100
}

fn default_recent_files_limit() -> u32 {
    10
}
