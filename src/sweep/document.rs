//! Per-document statistics
//!
//! Lists a document's revisions and builds a stat for each one, oldest first.
//! A revision whose export fails keeps the stat stored by an earlier sweep;
//! without one it is skipped and recorded. The rest of the document is still
//! built.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::error::{SweepError, SweepResult};
use super::revision::RevisionStatBuilder;
use crate::source::{DocumentSource, FetchError, FileRef, RevisionRef, Throttle};
use crate::stats::{DocumentStat, ParseError};

/// A revision left out of its document's stat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRevision {
    pub revision_id: String,
    pub reason: String,
}

/// Everything produced for one document
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub stat: DocumentStat,
    /// Revision records as listed, chronological
    pub revisions: Vec<RevisionRef>,
    pub skipped: Vec<SkippedRevision>,
    /// Revisions whose export failed but whose stored stat was kept
    pub reused: Vec<String>,
}

/// Builds whole [`DocumentStat`]s from the document source
#[derive(Clone)]
pub struct DocumentStatAggregator {
    source: Arc<dyn DocumentSource>,
    throttle: Arc<Throttle>,
    revisions: RevisionStatBuilder,
}

impl DocumentStatAggregator {
    pub fn new(source: Arc<dyn DocumentSource>, throttle: Arc<Throttle>, revisions: RevisionStatBuilder) -> Self {
        Self {
            source,
            throttle,
            revisions,
        }
    }

    /// Build the stat of one document
    ///
    /// `previous` is the stat stored by the last sweep, if any. Returns
    /// [`SweepError::Cancelled`] if `cancel` fires before every revision was
    /// fetched; nothing partial is handed back in that case.
    pub async fn build(
        &self,
        file: &FileRef,
        previous: Option<&DocumentStat>,
        cancel: &CancellationToken,
    ) -> SweepResult<DocumentOutcome> {
        if cancel.is_cancelled() {
            return Err(SweepError::Cancelled);
        }

        self.throttle.acquire().await;
        let mut listed = self
            .source
            .list_revisions(&file.id)
            .await
            .map_err(|e| match e {
                FetchError::Parse(source) => SweepError::Parse {
                    file_id: file.id.clone(),
                    source,
                },
                e => SweepError::fetch(format!("revisions of {}", file.id), e),
            })?;

        if let Some(unnamed) = listed.iter().find(|r| r.id.is_empty()) {
            return Err(SweepError::Parse {
                file_id: file.id.clone(),
                source: ParseError::missing_field(format!("revision at {}", unnamed.modified_date), "id"),
            });
        }
        listed.sort_by(|a, b| a.modified_date.cmp(&b.modified_date));
        debug!("{} has {} revisions", file.id, listed.len());

        let mut stats = Vec::with_capacity(listed.len());
        let mut skipped = Vec::new();
        let mut reused = Vec::new();
        for revision in &listed {
            if cancel.is_cancelled() {
                return Err(SweepError::Cancelled);
            }
            match self.revisions.build(&file.id, revision).await {
                Ok(stat) => stats.push(stat),
                Err(e) => match previous.and_then(|p| p.revision(&revision.id)) {
                    Some(stored) => {
                        warn!("Export of revision {} of {} failed, keeping stored stat: {}", revision.id, file.id, e);
                        stats.push(stored.clone());
                        reused.push(revision.id.clone());
                    }
                    None => {
                        warn!("Skipping revision {} of {}: {}", revision.id, file.id, e);
                        skipped.push(SkippedRevision {
                            revision_id: revision.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(DocumentOutcome {
            stat: DocumentStat::new(file.id.clone(), file.title.clone(), file.modified_date, stats),
            revisions: listed,
            skipped,
            reused,
        })
    }
}
