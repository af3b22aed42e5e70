//! Error types for fedstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for fedstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the record store and its migrations
#[derive(Debug, Error)]
pub enum Error {
    /// Key cannot be parsed under the composite-key convention
    #[error("Malformed key {key:?}: {reason}")]
    MalformedKey {
        /// The offending key
        key: String,
        /// Why the key was rejected
        reason: String,
    },

    /// Point update or lookup on a key that does not exist
    #[error("Key not found: {0:?}")]
    NotFound(String),

    /// Storage backend failure (connectivity, lock poisoning, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persisted data could not be loaded
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Invalid configuration value or file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build a `MalformedKey` error
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a `NotFound` error
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound(key.into())
    }

    /// Build a `Storage` error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Build an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Build a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the failed operation may succeed if the whole run is retried
    ///
    /// Connectivity-style failures are retryable. Data errors such as a
    /// malformed key will fail again until the data is fixed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Storage(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
