//! In-memory document source
//!
//! Holds documents and their revision texts locally. Used for offline runs
//! against fixture data and as the source in tests, where failures can be
//! injected per revision or per file.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::error::{FetchError, FetchResult};
use crate::stats::ParseError;
use super::{DocumentSource, FileRef, RevisionRef, DOCUMENT_MIME_TYPE};

#[derive(Debug, Default)]
struct Contents {
    files: Vec<FileRef>,
    revisions: HashMap<String, Vec<RevisionRef>>,
    texts: HashMap<String, String>,
    failing_exports: HashSet<String>,
    failing_listings: HashSet<String>,
    malformed_listings: HashSet<String>,
}

/// Document source backed by maps in memory
#[derive(Debug, Default)]
pub struct MemorySource {
    contents: RwLock<Contents>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; later revisions move its modified date forward
    pub fn add_file(&self, id: &str, title: &str) {
        let mut contents = self.contents.write();
        contents.files.push(FileRef {
            id: id.to_string(),
            title: title.to_string(),
            mime_type: DOCUMENT_MIME_TYPE.to_string(),
            modified_date: DateTime::<Utc>::MIN_UTC,
        });
        contents.revisions.entry(id.to_string()).or_default();
    }

    /// Add a revision with its full text to an existing document
    pub fn add_revision(&self, file_id: &str, revision_id: &str, modified: DateTime<Utc>, author: &str, text: &str) {
        let mut contents = self.contents.write();
        let export_uri = export_uri(file_id, revision_id);

        contents.revisions.entry(file_id.to_string()).or_default().push(RevisionRef {
            id: revision_id.to_string(),
            modified_date: modified,
            author_name: author.to_string(),
            export_uri: export_uri.clone(),
        });
        contents.texts.insert(export_uri, text.to_string());

        if let Some(file) = contents.files.iter_mut().find(|f| f.id == file_id) {
            if modified > file.modified_date {
                file.modified_date = modified;
            }
        }
    }

    /// Make the export of one revision fail
    pub fn fail_export(&self, file_id: &str, revision_id: &str) {
        self.contents.write().failing_exports.insert(export_uri(file_id, revision_id));
    }

    /// Make the revision listing of one file fail
    pub fn fail_listing(&self, file_id: &str) {
        self.contents.write().failing_listings.insert(file_id.to_string());
    }

    /// Make the revision listing of one file carry an unreadable timestamp
    pub fn malformed_listing(&self, file_id: &str) {
        self.contents.write().malformed_listings.insert(file_id.to_string());
    }

    /// Number of calls made against this source
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

fn export_uri(file_id: &str, revision_id: &str) -> String {
    format!("memory://{file_id}/{revision_id}")
}

#[async_trait]
impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_files(&self, _query: &str) -> FetchResult<Vec<FileRef>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.contents.read().files.clone())
    }

    async fn list_revisions(&self, file_id: &str) -> FetchResult<Vec<RevisionRef>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let contents = self.contents.read();
        if contents.failing_listings.contains(file_id) {
            return Err(FetchError::Status {
                uri: format!("memory://{file_id}/revisions"),
                status: 500,
            });
        }
        if contents.malformed_listings.contains(file_id) {
            return Err(ParseError::timestamp("not a timestamp", "input contains invalid characters").into());
        }
        contents
            .revisions
            .get(file_id)
            .cloned()
            .ok_or_else(|| FetchError::Missing(file_id.to_string()))
    }

    async fn export_revision_text(&self, revision: &RevisionRef) -> FetchResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let contents = self.contents.read();
        if contents.failing_exports.contains(&revision.export_uri) {
            return Err(FetchError::request(&revision.export_uri, "connection reset by peer"));
        }
        contents
            .texts
            .get(&revision.export_uri)
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| FetchError::Missing(revision.export_uri.clone()))
    }
}
