//! Lifecycle Manager: soft delete, restore, force delete, and move.

pub mod batch;
pub mod service;

pub use batch::{BatchFailure, BatchOutcome};
pub use service::{LifecycleService, PurgeReport};
