//! Document sources
//!
//! The remote document store is an external collaborator. The sweep only
//! needs to list files, list a file's revisions and export a revision as
//! plain text; everything goes through [`DocumentSource`] and every call is
//! expected to pass through a shared [`Throttle`] first.

pub mod drive;
pub mod error;
pub mod memory;
pub mod throttle;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use drive::DriveSource;
pub use error::{FetchError, FetchResult};
pub use memory::MemorySource;
pub use throttle::Throttle;

/// Mime type of native text documents at the source
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Default listing query: every text document the user can see
pub fn default_query() -> String {
    format!("mimeType = '{DOCUMENT_MIME_TYPE}'")
}

/// A tracked document as listed by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub title: String,
    pub mime_type: String,
    pub modified_date: DateTime<Utc>,
}

/// One revision of a document as listed by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRef {
    pub id: String,
    pub modified_date: DateTime<Utc>,
    pub author_name: String,
    /// Where the plain-text export of this revision can be fetched
    pub export_uri: String,
}

/// Read access to a remote document store
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// List every file matching `query`, pages already flattened
    async fn list_files(&self, query: &str) -> FetchResult<Vec<FileRef>>;

    /// List the revisions of one file, in whatever order the source returns
    async fn list_revisions(&self, file_id: &str) -> FetchResult<Vec<RevisionRef>>;

    /// Fetch the plain-text export of a revision
    async fn export_revision_text(&self, revision: &RevisionRef) -> FetchResult<Vec<u8>>;
}
