//! Cross-owner aggregate shapes for dashboard views.

pub mod model;

pub use model::{CategoryTotal, MimeTotal, NodeStatistics, StorageUsage};
