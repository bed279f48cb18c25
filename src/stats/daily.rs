//! Daily aggregation
//!
//! Folds per-document revision statistics into calendar-day aggregates.
//!
//! Two reconciliation paths exist:
//! - [`reduce`] rebuilds every day from the complete set of documents. This is
//!   the default used by a sweep.
//! - [`merge`] folds a freshly computed day into a stored one. It does not
//!   detect revisions that were already merged: callers must only merge a
//!   given revision once, otherwise its delta is counted twice.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::trace;

use super::error::ReduceError;
use super::{DailyStat, DocumentStat};

/// Daily aggregates keyed (and therefore ordered) by date
pub type DailyMap = BTreeMap<NaiveDate, DailyStat>;

/// Rebuild daily aggregates from scratch
pub fn reduce(documents: &[DocumentStat]) -> DailyMap {
    let mut days = DailyMap::new();
    for document in documents {
        reduce_document(document, &mut days);
    }
    days
}

/// Fold a single document into `days`
///
/// The running word count is local to the document, so documents can be
/// folded in any order as long as calls on the same map are serialized.
pub fn reduce_document(document: &DocumentStat, days: &mut DailyMap) {
    let mut previous_word_count = 0i64;

    for revision in &document.revisions {
        let current = revision.word_count as i64;
        let delta = current - previous_word_count;
        let date = revision.day();

        days.entry(date)
            .or_insert_with(|| DailyStat::new(date))
            .record_delta(&document.file_id, &revision.revision_id, delta);

        trace!(
            "{} {} on {}: {:+} words",
            document.file_id,
            revision.revision_id,
            date,
            delta
        );
        previous_word_count = current;
    }
}

/// Merge a newly observed day into an existing record for the same date
pub fn merge(existing: Option<DailyStat>, incoming: DailyStat) -> Result<DailyStat, ReduceError> {
    let mut merged = match existing {
        None => return Ok(incoming),
        Some(existing) => existing,
    };

    if merged.date != incoming.date {
        return Err(ReduceError::DateMismatch {
            existing: merged.date,
            incoming: incoming.date,
        });
    }

    merged.words_added += incoming.words_added;
    merged.words_removed += incoming.words_removed;
    for (file_id, revisions) in incoming.file_revisions {
        merged.file_revisions.entry(file_id).or_default().extend(revisions);
    }

    Ok(merged)
}

/// Merge every day of `incoming` into `target`
pub fn merge_all(target: &mut DailyMap, incoming: DailyMap) -> Result<(), ReduceError> {
    for (date, day) in incoming {
        let existing = target.remove(&date);
        let merged = merge(existing, day)?;
        target.insert(date, merged);
    }
    Ok(())
}

/// Sum of words added and removed over a set of days
pub fn totals<'a>(days: impl IntoIterator<Item = &'a DailyStat>) -> (u64, u64) {
    days.into_iter().fold((0, 0), |(added, removed), day| {
        (added + day.words_added, removed + day.words_removed)
    })
}
