//! # filetree-core
//!
//! Core crate for FileTree. Contains the unified error system, configuration
//! schemas, typed identifiers, and the traits through which the metadata
//! core talks to its external collaborators (blob store, identity provider).
//!
//! This crate has **no** internal dependencies on other FileTree crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
