//! Sweep Report
//!
//! What happened to each document during a sweep.

use std::fmt;

use serde::Serialize;

use super::document::{DocumentOutcome, SkippedRevision};

/// Final state of one document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Stat written; some revisions may have been skipped
    Built {
        revisions: usize,
        skipped: Vec<SkippedRevision>,
    },
    /// The document could not be built; its stored stat was kept
    Failed { reason: String },
    /// Not built because the sweep was cancelled
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub file_id: String,
    pub title: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

impl DocumentReport {
    pub fn built(outcome: &DocumentOutcome) -> Self {
        Self {
            file_id: outcome.stat.file_id.clone(),
            title: outcome.stat.title.clone(),
            status: DocumentStatus::Built {
                revisions: outcome.stat.revisions.len(),
                skipped: outcome.skipped.clone(),
            },
        }
    }

    pub fn failed(file_id: impl Into<String>, title: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            file_id: file_id.into(),
            title: title.into(),
            status: DocumentStatus::Failed {
                reason: reason.to_string(),
            },
        }
    }

    pub fn cancelled(file_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            title: title.into(),
            status: DocumentStatus::Cancelled,
        }
    }
}

/// Summary of a whole sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Name of the document source that was swept
    pub source: String,
    pub documents: Vec<DocumentReport>,
    /// Number of daily stats written; 0 when the sweep was cancelled
    pub days_written: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl SweepReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn built_count(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Built { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Failed { .. }))
    }

    pub fn cancelled_count(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Cancelled))
    }

    /// Revisions counted across every built document
    pub fn revision_count(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match &d.status {
                DocumentStatus::Built { revisions, .. } => *revisions,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped_revision_count(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match &d.status {
                DocumentStatus::Built { skipped, .. } => skipped.len(),
                _ => 0,
            })
            .sum()
    }

    /// Every document built with no skipped revision
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed_count() == 0 && self.skipped_revision_count() == 0
    }

    fn count(&self, predicate: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.documents.iter().filter(|d| predicate(&d.status)).count()
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents from {}: {} built ({} revisions, {} skipped), {} failed",
            self.documents.len(),
            self.source,
            self.built_count(),
            self.revision_count(),
            self.skipped_revision_count(),
            self.failed_count()
        )?;
        if self.cancelled {
            write!(f, ", cancelled before {} documents", self.cancelled_count())
        } else {
            write!(f, ", {} days written", self.days_written)
        }
    }
}
