//! Cross-owner, read-only aggregates.

pub mod service;

pub use service::DashboardService;
