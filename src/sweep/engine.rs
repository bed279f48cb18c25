//! Sweep Engine
//!
//! Coordinates one full pass over the document source: list the files, build
//! every document concurrently, persist what was fetched and rewrite the
//! daily stats from the combined result.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::config::SweepConfig;
use super::document::DocumentStatAggregator;
use super::error::{SweepError, SweepResult};
use super::report::{DocumentReport, SweepReport};
use super::revision::RevisionStatBuilder;
use super::task_manager::TaskManager;
use crate::source::{DocumentSource, Throttle};
use crate::stats::{reduce_document, DailyMap, WordCounter};
use crate::store::StatStore;

/// Runs sweeps against one source and one store
pub struct SweepEngine {
    store: Arc<StatStore>,
    source: Arc<dyn DocumentSource>,
    throttle: Arc<Throttle>,
    config: SweepConfig,
    cancellation_token: CancellationToken,
}

impl SweepEngine {
    pub fn new(store: Arc<StatStore>, source: Arc<dyn DocumentSource>, config: SweepConfig) -> SweepResult<Self> {
        config.validate().map_err(SweepError::Configuration)?;
        let throttle = Arc::new(Throttle::new(config.requests_per_second));

        Ok(Self {
            store,
            source,
            throttle,
            config,
            cancellation_token: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token (e.g. tied to Ctrl-C)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Sweep every file matching the configured query
    pub async fn run(&self) -> SweepResult<SweepReport> {
        self.run_query(&self.config.query).await
    }

    /// Sweep every file matching `query`
    ///
    /// Documents that fail are reported and keep their previously stored
    /// stat. Store failures abort the sweep. When cancelled, the daily stats
    /// are left untouched and the report says so.
    pub async fn run_query(&self, query: &str) -> SweepResult<SweepReport> {
        let started = Instant::now();
        let mut report = SweepReport::new(self.source.name());

        self.throttle.acquire().await;
        let files = self
            .source
            .list_files(query)
            .await
            .map_err(|e| SweepError::fetch("file listing", e))?;
        info!("Sweeping {} documents from {}", files.len(), self.source.name());

        for file in &files {
            self.store.put_file(file)?;
        }

        let days: Arc<Mutex<DailyMap>> = Arc::new(Mutex::new(DailyMap::new()));
        let manager = TaskManager::new(self.config.workers(), self.cancellation_token.clone());
        let aggregator = self.aggregator();

        let mut spawned = 0;
        for file in &files {
            let task_file = file.clone();
            let aggregator = aggregator.clone();
            let store = Arc::clone(&self.store);
            let days = Arc::clone(&days);

            let spawn = manager
                .spawn_task(file.id.clone(), move |cancel| async move {
                    let previous = store.get_document_stat(&task_file.id)?;
                    let outcome = aggregator.build(&task_file, previous.as_ref(), &cancel).await?;
                    for revision in &outcome.revisions {
                        store.put_revision(&task_file.id, revision)?;
                    }
                    store.put_document_stat(&outcome.stat)?;

                    reduce_document(&outcome.stat, &mut days.lock());
                    Ok(DocumentReport::built(&outcome))
                })
                .await;
            match spawn {
                Ok(()) => spawned += 1,
                Err(SweepError::Cancelled) => break,
                Err(e) => return Err(e),
            }
        }

        let mut refreshed = HashSet::new();
        let outcomes = manager.wait_all().await;
        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome.result {
                Ok(document) => {
                    debug!("{} built in {:?}", outcome.name, outcome.elapsed);
                    refreshed.insert(file.id.clone());
                    report.documents.push(document);
                }
                Err(SweepError::Cancelled) => {
                    report.documents.push(DocumentReport::cancelled(&file.id, &file.title));
                }
                Err(e) if e.is_document_local() => {
                    warn!("Document {} ({}) failed: {}", file.id, file.title, e);
                    report.documents.push(DocumentReport::failed(&file.id, &file.title, e));
                }
                Err(e) => {
                    manager.cancel_all().await;
                    return Err(e);
                }
            }
        }
        for file in files.iter().skip(spawned) {
            report.documents.push(DocumentReport::cancelled(&file.id, &file.title));
        }

        report.cancelled = self.cancellation_token.is_cancelled();
        if report.cancelled {
            warn!("Sweep cancelled; daily stats were not rewritten");
        } else {
            let mut days = std::mem::take(&mut *days.lock());
            self.fold_stored_documents(&refreshed, &mut days)?;
            self.store.replace_daily_stats(&days)?;
            report.days_written = days.len();
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!("{}", report);
        Ok(report)
    }

    fn aggregator(&self) -> DocumentStatAggregator {
        let counter = WordCounter::new(self.config.words.clone());
        let revisions = RevisionStatBuilder::new(Arc::clone(&self.source), Arc::clone(&self.throttle), counter);
        DocumentStatAggregator::new(Arc::clone(&self.source), Arc::clone(&self.throttle), revisions)
    }

    /// Fold stored stats of documents this sweep did not rebuild
    ///
    /// Keeps the history of documents that failed or are no longer listed in
    /// the daily totals.
    fn fold_stored_documents(&self, refreshed: &HashSet<String>, days: &mut DailyMap) -> SweepResult<()> {
        let mut after = String::new();
        while let Some(stat) = self.store.next_document_stat(&after)? {
            if !refreshed.contains(&stat.file_id) {
                debug!("Keeping stored stat of {}", stat.file_id);
                reduce_document(&stat, days);
            }
            after = stat.file_id;
        }
        Ok(())
    }
}
