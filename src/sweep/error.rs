//! Sweep Error Types
//!
//! Unifies the failures a sweep can run into. Fetch and parse errors are
//! local to one document and end up in the report; store and reduce errors
//! abort the sweep.

use thiserror::Error;

use crate::source::FetchError;
use crate::stats::{ParseError, ReduceError};
use crate::store::StoreError;

/// Result type for sweep operations
pub type SweepResult<T> = Result<T, SweepError>;

/// Errors that can occur during a sweep
#[derive(Debug, Error)]
pub enum SweepError {
    /// Listing files or a document's revisions failed
    #[error("Failed to fetch {subject}: {source}")]
    Fetch {
        subject: String,
        #[source]
        source: FetchError,
    },

    /// A source record could not be interpreted
    #[error("Document {file_id}: {source}")]
    Parse {
        file_id: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    /// Sweep settings are unusable
    #[error("Invalid sweep configuration: {0}")]
    Configuration(String),

    /// Cancellation was requested
    #[error("Sweep was cancelled")]
    Cancelled,

    /// A worker task panicked or was aborted
    #[error("Task error: {0}")]
    Task(String),
}

impl SweepError {
    pub fn fetch(subject: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            subject: subject.into(),
            source,
        }
    }

    /// Whether the error only affects the document it happened in
    pub fn is_document_local(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Parse { .. })
    }
}

impl From<tokio::task::JoinError> for SweepError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Task(error.to_string())
        }
    }
}
