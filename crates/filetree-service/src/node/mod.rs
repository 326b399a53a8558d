//! Everyday node operations: folders, uploads, renames, listings.

pub mod service;
pub mod transfer;

pub use service::NodeService;
pub use transfer::{FileDownload, UploadFile};
