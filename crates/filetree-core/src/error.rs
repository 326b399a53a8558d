//! Unified application error types for FileTree.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the `?` operator. The [`ErrorKind`] taxonomy is what
//! callers branch on; the message is for humans and logs.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested node or blob was not found.
    NotFound,
    /// Another active sibling already carries the requested name.
    NameConflict,
    /// The requested parent would make a node its own ancestor.
    CycleRejected,
    /// The node belongs to a different owner.
    PermissionDenied,
    /// A parent-chain or subtree walk exceeded the configured hop bound, or
    /// stored tree data is otherwise inconsistent.
    IntegrityBoundExceeded,
    /// The blob store failed permanently.
    BlobStore,
    /// The row changed between read and write (optimistic concurrency).
    Conflict,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A dependency is temporarily unavailable; the operation may be retried.
    ServiceUnavailable,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::NameConflict => write!(f, "NAME_CONFLICT"),
            Self::CycleRejected => write!(f, "CYCLE_REJECTED"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::IntegrityBoundExceeded => write!(f, "INTEGRITY_BOUND_EXCEEDED"),
            Self::BlobStore => write!(f, "BLOB_STORE"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout FileTree.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a sibling name conflict error.
    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameConflict, message)
    }

    /// Create a cycle rejection error.
    pub fn cycle_rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CycleRejected, message)
    }

    /// Create a permission-denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, message)
    }

    /// Create a tree integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IntegrityBoundExceeded, message)
    }

    /// Create a permanent blob store error.
    pub fn blob_store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BlobStore, message)
    }

    /// Create an optimistic-concurrency conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a service-unavailable (retryable) error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::ServiceUnavailable)
    }

    /// Whether this error signals corrupted tree data that operators must
    /// look at, as opposed to an ordinary missing node.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::IntegrityBoundExceeded)
    }

    /// Whether this is a recoverable validation failure that left all state
    /// untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NameConflict | ErrorKind::CycleRejected | ErrorKind::Validation
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as Io;

        let kind = match err.kind() {
            Io::NotFound => ErrorKind::NotFound,
            Io::Interrupted | Io::TimedOut | Io::WouldBlock => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::BlobStore,
        };
        Self::with_source(kind, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::name_conflict("'a' already exists");
        assert_eq!(err.to_string(), "NAME_CONFLICT: 'a' already exists");
    }

    #[test]
    fn test_io_error_mapping() {
        let missing = AppError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(missing.kind, ErrorKind::NotFound);

        let timeout = AppError::from(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(timeout.is_transient());

        let denied = AppError::from(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(denied.kind, ErrorKind::BlobStore);
        assert!(!denied.is_transient());
    }

    #[test]
    fn test_classification_helpers() {
        assert!(AppError::integrity("loop").is_integrity_failure());
        assert!(!AppError::not_found("gone").is_integrity_failure());
        assert!(AppError::cycle_rejected("x").is_rejection());
        assert!(!AppError::permission_denied("x").is_rejection());
    }

    #[test]
    fn test_clone_drops_source() {
        let err = AppError::with_source(
            ErrorKind::Database,
            "boom",
            std::io::Error::other("inner"),
        );
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Database);
        assert!(cloned.source.is_none());
    }
}
