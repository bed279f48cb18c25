//! Statistics service
//!
//! Read and maintenance operations over a [`StatStore`], used by the CLI.
//! Detail views join the daily stats with the per-document revision stats
//! they reference.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::calendar::CalendarView;
use crate::source::DocumentSource;
use crate::stats::{daily, DailyMap, DailyStat, DocumentStat, RevisionStat, UserIdentity};
use crate::store::{keys, DailyStatCursor, StatStore, StoreResult};
use crate::sweep::{SweepConfig, SweepEngine, SweepReport, SweepResult};

/// One revision row of a document listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionRow {
    pub revision: RevisionStat,
    /// Signed word change against the previous revision
    pub delta: i64,
}

/// A document and the revisions selected from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDetail {
    pub file_id: String,
    pub title: String,
    pub rows: Vec<RevisionRow>,
}

impl DocumentDetail {
    fn from_stat(stat: &DocumentStat, keep: impl Fn(&RevisionStat) -> bool) -> Self {
        let rows = stat
            .deltas()
            .into_iter()
            .filter(|(rev, _)| keep(rev))
            .map(|(rev, delta)| RevisionRow {
                revision: rev.clone(),
                delta,
            })
            .collect();
        Self {
            file_id: stat.file_id.clone(),
            title: stat.title.clone(),
            rows,
        }
    }
}

/// A day and the revisions that made it up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    pub stat: DailyStat,
    pub documents: Vec<DocumentDetail>,
    /// File ids referenced by the day but missing from the store
    pub missing: Vec<String>,
}

/// Query and maintenance façade over the statistics database
#[derive(Clone)]
pub struct StatService {
    store: Arc<StatStore>,
    config: SweepConfig,
}

impl StatService {
    pub fn new(store: Arc<StatStore>, config: SweepConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<StatStore> {
        &self.store
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn get_daily_stat(&self, date: NaiveDate) -> StoreResult<Option<DailyStat>> {
        self.store.get_daily_stat(date)
    }

    /// Days strictly after `from_exclusive`, or every day when `None`
    pub fn iterate_daily_stats(&self, from_exclusive: Option<NaiveDate>) -> DailyStatCursor<'_> {
        let after = from_exclusive.map(keys::daily_key).unwrap_or_default();
        self.store.daily_stats_after(&after)
    }

    /// Every stored day in calendar order
    pub fn daily_stats(&self) -> StoreResult<Vec<DailyStat>> {
        self.iterate_daily_stats(None).collect()
    }

    pub fn get_document_stat(&self, file_id: &str) -> StoreResult<Option<DocumentStat>> {
        self.store.get_document_stat(file_id)
    }

    /// Rebuild the daily stats from `documents` and persist them
    pub fn rebuild_all(&self, documents: &[DocumentStat]) -> StoreResult<DailyMap> {
        let days = daily::reduce(documents);
        self.store.replace_daily_stats(&days)?;
        info!("Rebuilt {} days from {} documents", days.len(), documents.len());
        Ok(days)
    }

    /// Rebuild the daily stats from every stored document stat
    pub fn rebuild_from_store(&self) -> StoreResult<DailyMap> {
        let documents = self.store.document_stats()?;
        self.rebuild_all(&documents)
    }

    /// Fold `documents` into the stored days without rebuilding
    ///
    /// Only for revisions that were never merged before; merging the same
    /// document twice counts its words twice.
    pub fn merge_documents(&self, documents: &[DocumentStat]) -> StoreResult<Vec<DailyStat>> {
        let incoming = daily::reduce(documents);
        let mut merged = Vec::with_capacity(incoming.len());
        for day in incoming.values() {
            merged.push(self.store.merge_daily_stat(day)?);
        }
        debug!("Merged {} days", merged.len());
        Ok(merged)
    }

    /// Calendar view ending today (UTC)
    pub fn build_calendar_view(&self, window_days: usize) -> StoreResult<CalendarView> {
        self.calendar_view_at(window_days, Utc::now().date_naive())
    }

    pub fn calendar_view_at(&self, window_days: usize, today: NaiveDate) -> StoreResult<CalendarView> {
        Ok(CalendarView::build(self.daily_stats()?, window_days, today))
    }

    /// A day joined with the revision stats it references
    pub fn day_detail(&self, date: NaiveDate) -> StoreResult<Option<DayDetail>> {
        let Some(stat) = self.store.get_daily_stat(date)? else {
            return Ok(None);
        };

        let mut documents = Vec::new();
        let mut missing = Vec::new();
        for (file_id, revision_ids) in &stat.file_revisions {
            match self.store.get_document_stat(file_id)? {
                Some(document) => documents.push(DocumentDetail::from_stat(&document, |rev| {
                    revision_ids.contains(&rev.revision_id)
                })),
                None => missing.push(file_id.clone()),
            }
        }

        Ok(Some(DayDetail {
            stat,
            documents,
            missing,
        }))
    }

    /// Every revision of a document with its word delta
    pub fn document_stat(&self, file_id: &str) -> StoreResult<Option<DocumentDetail>> {
        Ok(self
            .store
            .get_document_stat(file_id)?
            .map(|stat| DocumentDetail::from_stat(&stat, |_| true)))
    }

    pub fn user(&self) -> StoreResult<Option<UserIdentity>> {
        self.store.get_user()
    }

    pub fn set_user(&self, user: &UserIdentity) -> StoreResult<()> {
        self.store.put_user(user)
    }

    /// Run a full sweep against `source`
    pub async fn sweep(
        &self,
        source: Arc<dyn DocumentSource>,
        query: Option<&str>,
        cancel: CancellationToken,
    ) -> SweepResult<SweepReport> {
        let engine = SweepEngine::new(Arc::clone(&self.store), source, self.config.clone())?.with_cancellation(cancel);
        match query {
            Some(query) => engine.run_query(query).await,
            None => engine.run().await,
        }
    }
}
