//! Error types for concept mapping.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;

/// Errors raised while loading a synonym table or configuring the mapper.
///
/// Concepts that cannot be mapped are not errors; they end up as
/// [`Confidence::Failed`](crate::Confidence::Failed) mappings.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Synonym table is not valid TOML or has the wrong shape
    #[error("Invalid synonym table TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Synonym table parsed but its content is inconsistent
    #[error("Invalid synonym table: {0}")]
    InvalidTable(String),

    /// Synonym table file could not be read
    #[error("Failed to read synonym table {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Mapper configuration is out of range
    #[error("Invalid mapper configuration: {0}")]
    InvalidConfig(String),
}
