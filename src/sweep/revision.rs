//! Per-revision statistics
//!
//! Fetches the plain-text export of one revision and samples its words.

use std::sync::Arc;

use log::trace;

use crate::source::{DocumentSource, FetchError, RevisionRef, Throttle};
use crate::stats::{RevisionStat, WordCounter};

/// Builds a [`RevisionStat`] from a revision reference
#[derive(Clone)]
pub struct RevisionStatBuilder {
    source: Arc<dyn DocumentSource>,
    throttle: Arc<Throttle>,
    counter: WordCounter,
}

impl RevisionStatBuilder {
    pub fn new(source: Arc<dyn DocumentSource>, throttle: Arc<Throttle>, counter: WordCounter) -> Self {
        Self {
            source,
            throttle,
            counter,
        }
    }

    pub fn counter(&self) -> &WordCounter {
        &self.counter
    }

    /// Export the revision text and count its words
    ///
    /// Invalid UTF-8 in the export is replaced rather than rejected.
    pub async fn build(&self, file_id: &str, revision: &RevisionRef) -> Result<RevisionStat, FetchError> {
        self.throttle.acquire().await;
        let bytes = self.source.export_revision_text(revision).await?;
        let text = String::from_utf8_lossy(&bytes);

        let (word_freq, word_count) = self.counter.sample(&text);
        trace!(
            "{}: revision {} of {} has {} words",
            self.source.name(),
            revision.id,
            file_id,
            word_count
        );

        Ok(RevisionStat {
            revision_id: revision.id.clone(),
            user_name: revision.author_name.clone(),
            modified_date: revision.modified_date,
            word_count,
            word_freq,
        })
    }
}
