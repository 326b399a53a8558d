//! Storage key generation.

use uuid::Uuid;

use filetree_core::types::OwnerId;

/// Build a fresh key of the form `{prefix}/{owner}/{uuid}.{ext}`.
///
/// The extension is omitted when empty. Keys never collide, so two uploads
/// with the same original name keep separate blobs.
pub fn upload_key(prefix: &str, owner_id: OwnerId, extension: Option<&str>) -> String {
    let prefix = prefix.trim_matches('/');
    let id = Uuid::new_v4();
    let base = if prefix.is_empty() {
        format!("{owner_id}/{id}")
    } else {
        format!("{prefix}/{owner_id}/{id}")
    };
    match extension.filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
