//! Convenience result type alias for FileTree.

use crate::error::AppError;

/// A specialized `Result` type for FileTree operations.
pub type AppResult<T> = Result<T, AppError>;
