//! Store Error Types

use thiserror::Error;

use super::Namespace;
use crate::stats::ReduceError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the statistics database
///
/// A store error is fatal for the command that hit it; the message names the
/// namespace and key involved.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database could not be opened
    #[error("Could not open database at {path}: {message}")]
    Open { path: String, message: String },

    /// The storage engine failed (I/O, corruption, disk full)
    #[error("Storage failure in '{namespace}' at key '{key}': {message}")]
    Engine {
        namespace: Namespace,
        key: String,
        message: String,
    },

    /// Record could not be serialized
    #[error("Failed to encode '{namespace}' record '{key}': {message}")]
    Encode {
        namespace: Namespace,
        key: String,
        message: String,
    },

    /// Stored bytes do not decode to the expected record shape
    #[error("Failed to decode '{namespace}' record '{key}': {message}")]
    Decode {
        namespace: Namespace,
        key: String,
        message: String,
    },

    /// Key cannot be used in this namespace
    #[error("Invalid key '{key}' for '{namespace}': {message}")]
    InvalidKey {
        namespace: Namespace,
        key: String,
        message: String,
    },

    /// A stored day could not absorb an incoming one
    #[error(transparent)]
    Merge(#[from] ReduceError),
}

impl StoreError {
    pub fn engine(namespace: Namespace, key: &str, error: impl ToString) -> Self {
        Self::Engine {
            namespace,
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    pub fn encode(namespace: Namespace, key: &str, error: impl ToString) -> Self {
        Self::Encode {
            namespace,
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    pub fn decode(namespace: Namespace, key: &str, error: impl ToString) -> Self {
        Self::Decode {
            namespace,
            key: key.to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_key(namespace: Namespace, key: &str, message: impl Into<String>) -> Self {
        Self::InvalidKey {
            namespace,
            key: key.to_string(),
            message: message.into(),
        }
    }
}
