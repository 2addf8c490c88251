//! Error types for Mixtape
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Mixtape operations
///
/// This enum encompasses all possible errors that can occur during
/// collection persistence, import/export, session handling, and
/// configuration loading.
///
/// A missing collection is never an error: lookups return `Option` and
/// deletes are idempotent.
#[derive(Error, Debug)]
pub enum MixtapeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The underlying key-value store failed (open, read, write, or flush)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored value exists but failed to parse or validate
    #[error("Corrupt data at key '{key}': {reason}")]
    CorruptData {
        /// The storage key holding the offending value
        key: String,
        /// What made the value unusable
        reason: String,
    },

    /// An import document was rejected before anything was written
    #[error("Invalid import document: {0}")]
    InvalidImport(String),

    /// A collection name is empty or contains the reserved separator
    #[error("Invalid collection name: {0}")]
    InvalidName(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Mixtape operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
