//! Error types for Keystash core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the sync controller funnels
//! them into the caller's `on_error` callback instead of returning them.

use thiserror::Error;

use crate::schema::ValidationError;

/// Result type alias for Keystash operations.
pub type Result<T> = std::result::Result<T, KeystashError>;

/// Core error type for Keystash operations.
#[derive(Debug, Error)]
pub enum KeystashError {
    /// A value violated its schema
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Stored or broadcast payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Byte store read/write failure
    #[error("Storage error: {0}")]
    Store(String),

    /// Malformed schema definition
    #[error("Schema error: {0}")]
    Schema(String),

    /// Message bus failure
    #[error("Channel error: {0}")]
    Channel(String),

    /// Settings that cannot be honoured, such as an empty phrase
    #[error("Config error: {0}")]
    Config(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl KeystashError {
    /// Whether this error came from the schema engine.
    pub fn is_validation(&self) -> bool {
        matches!(self, KeystashError::Validation(_))
    }
}
