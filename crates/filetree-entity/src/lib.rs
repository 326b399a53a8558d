//! # filetree-entity
//!
//! Domain entity models for FileTree. [`node::Node`] is the single persisted
//! entity: files and folders share one table and one id space. The `stats`
//! module holds the read-only aggregate shapes used by dashboard views.

pub mod node;
pub mod stats;
