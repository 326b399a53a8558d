//! # filetree-database
//!
//! The [`NodeRepository`] contract plus its two implementations: PostgreSQL
//! via `sqlx` for deployments, and an in-memory store with the same
//! constraint semantics for tests and embedded use.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{MemoryNodeRepository, NodeRepository, PgNodeRepository};
