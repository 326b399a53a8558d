//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, with `FILETREE__SECTION__KEY` environment variables
//! layered on top. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod logging;
pub mod storage;
pub mod tree;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::storage::StorageConfig;
pub use self::tree::TreeConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Tree traversal bounds and lifecycle retry policy.
    #[serde(default)]
    pub tree: TreeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional so that a deployment can be configured purely
    /// through environment variables prefixed with `FILETREE__`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("FILETREE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/filetree"
            "#,
        )
        .expect("parse");

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.tree.max_depth, 64);
        assert_eq!(config.tree.blob_delete_attempts, 3);
        assert_eq!(config.storage.key_prefix, "file-manager");
        assert_eq!(config.storage.max_upload_size_bytes, 100 * 1024 * 1024);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://db/filetree"

            [tree]
            max_depth = 16
            recent_files_limit = 5

            [logging]
            format = "pretty"
            "#,
        )
        .expect("parse");

        assert_eq!(config.tree.max_depth, 16);
        assert_eq!(config.tree.recent_files_limit, 5);
        assert_eq!(config.tree.blob_retry_backoff_ms, 100);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_database_is_error() {
        let err = AppConfig::from_toml("[tree]\nmax_depth = 8\n").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
