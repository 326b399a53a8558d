//! # filetree-service
//!
//! Tree operations for FileTree. [`TreeIntegrity`] answers the questions a
//! mutation must ask first (cycles, sibling names, nesting depth) without
//! writing anything; [`LifecycleService`] performs the subtree-wide
//! transitions; [`PathResolver`] turns a node into breadcrumbs; the node
//! and dashboard services cover everyday operations and aggregates.
//!
//! Services take their collaborators as `Arc`s at construction time and the
//! acting owner as an explicit [`RequestContext`] on every call.

pub mod context;
pub mod dashboard;
pub mod lifecycle;
pub mod node;
pub mod tree;

pub use context::RequestContext;
pub use dashboard::DashboardService;
pub use lifecycle::{BatchFailure, BatchOutcome, LifecycleService, PurgeReport};
pub use node::{FileDownload, NodeService, UploadFile};
pub use tree::{PathResolver, SubtreeIndex, TreeIntegrity};
