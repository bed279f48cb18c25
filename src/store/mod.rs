//! Statistics store
//!
//! Persistence façade over an embedded, ordered key-value engine (sled).
//! Each logical namespace is its own tree; records are bincode-encoded.
//! Every put is flushed to disk before it returns, and a put replaces the
//! whole record atomically, so readers never observe half a record.

pub mod error;
pub mod keys;

use std::fmt;
use std::ops::Bound;
use std::path::Path;

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};

pub use error::{StoreError, StoreResult};

use crate::source::{FileRef, RevisionRef};
use crate::stats::daily::{self, DailyMap};
use crate::stats::{DailyStat, DocumentStat, UserIdentity};

/// Logical tables of the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Document metadata as listed by the source
    Documents,
    /// Raw revision metadata, keyed chronologically per file
    Revisions,
    DocumentStats,
    DailyStats,
    /// Singleton user identity
    User,
}

impl Namespace {
    pub const ALL: [Namespace; 5] = [
        Namespace::Documents,
        Namespace::Revisions,
        Namespace::DocumentStats,
        Namespace::DailyStats,
        Namespace::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Documents => "documents",
            Namespace::Revisions => "revisions",
            Namespace::DocumentStats => "document_stats",
            Namespace::DailyStats => "daily_stats",
            Namespace::User => "user",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const USER_KEY: &str = "identity";

/// Handle to the statistics database
///
/// Open once per process and share it; sled serializes writers internally.
pub struct StatStore {
    db: sled::Db,
    documents: sled::Tree,
    revisions: sled::Tree,
    document_stats: sled::Tree,
    daily_stats: sled::Tree,
    user: sled::Tree,
}

impl StatStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!("Opening statistics database at {}", path.display());
        let db = sled::open(path).map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_db(db)
    }

    /// Database that lives only as long as the handle
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::Open {
                path: "<temporary>".to_string(),
                message: e.to_string(),
            })?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let open = |ns: Namespace| {
            db.open_tree(ns.as_str())
                .map_err(|e| StoreError::engine(ns, "", e))
        };
        Ok(Self {
            documents: open(Namespace::Documents)?,
            revisions: open(Namespace::Revisions)?,
            document_stats: open(Namespace::DocumentStats)?,
            daily_stats: open(Namespace::DailyStats)?,
            user: open(Namespace::User)?,
            db,
        })
    }

    fn tree(&self, namespace: Namespace) -> &sled::Tree {
        match namespace {
            Namespace::Documents => &self.documents,
            Namespace::Revisions => &self.revisions,
            Namespace::DocumentStats => &self.document_stats,
            Namespace::DailyStats => &self.daily_stats,
            Namespace::User => &self.user,
        }
    }

    fn encode<T: Serialize>(namespace: Namespace, key: &str, record: &T) -> StoreResult<Vec<u8>> {
        bincode::serialize(record).map_err(|e| StoreError::encode(namespace, key, e))
    }

    fn decode<T: DeserializeOwned>(namespace: Namespace, key: &str, bytes: &[u8]) -> StoreResult<T> {
        bincode::deserialize(bytes).map_err(|e| StoreError::decode(namespace, key, e))
    }

    fn flush(&self, namespace: Namespace, key: &str) -> StoreResult<()> {
        self.tree(namespace)
            .flush()
            .map(|_| ())
            .map_err(|e| StoreError::engine(namespace, key, e))
    }

    /// Insert or replace a record, durable on return
    pub fn put<T: Serialize>(&self, namespace: Namespace, key: &str, record: &T) -> StoreResult<()> {
        let bytes = Self::encode(namespace, key, record)?;
        self.tree(namespace)
            .insert(key.as_bytes(), bytes)
            .map_err(|e| StoreError::engine(namespace, key, e))?;
        trace!("Stored {}/{}", namespace, key);
        self.flush(namespace, key)
    }

    pub fn get<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> StoreResult<Option<T>> {
        let found = self
            .tree(namespace)
            .get(key.as_bytes())
            .map_err(|e| StoreError::engine(namespace, key, e))?;
        found
            .map(|bytes| Self::decode(namespace, key, &bytes))
            .transpose()
    }

    /// First record whose key is strictly greater than `key`
    ///
    /// An empty `key` starts from the beginning of the namespace.
    pub fn next<T: DeserializeOwned>(&self, namespace: Namespace, key: &str) -> StoreResult<Option<(String, T)>> {
        let tree = self.tree(namespace);
        let entry = if key.is_empty() {
            tree.first()
        } else {
            let lower: Bound<&[u8]> = Bound::Excluded(key.as_bytes());
            let upper: Bound<&[u8]> = Bound::Unbounded;
            tree.range::<&[u8], _>((lower, upper)).next().transpose()
        };
        let entry = entry.map_err(|e| StoreError::engine(namespace, key, e))?;

        match entry {
            None => Ok(None),
            Some((k, v)) => {
                let next_key = String::from_utf8_lossy(&k).into_owned();
                let record = Self::decode(namespace, &next_key, &v)?;
                Ok(Some((next_key, record)))
            }
        }
    }

    /// Number of records in a namespace
    pub fn len(&self, namespace: Namespace) -> usize {
        self.tree(namespace).len()
    }

    pub fn is_empty(&self, namespace: Namespace) -> bool {
        self.tree(namespace).is_empty()
    }

    // Documents

    pub fn put_file(&self, file: &FileRef) -> StoreResult<()> {
        let key = keys::id_key(Namespace::Documents, &file.id)?;
        self.put(Namespace::Documents, &key, file)
    }

    pub fn get_file(&self, file_id: &str) -> StoreResult<Option<FileRef>> {
        self.get(Namespace::Documents, file_id)
    }

    pub fn next_file(&self, after_file_id: &str) -> StoreResult<Option<FileRef>> {
        Ok(self
            .next::<FileRef>(Namespace::Documents, after_file_id)?
            .map(|(_, file)| file))
    }

    // Revisions

    pub fn put_revision(&self, file_id: &str, revision: &RevisionRef) -> StoreResult<()> {
        let key = keys::revision_key(file_id, &revision.modified_date, &revision.id)?;
        self.put(Namespace::Revisions, &key, revision)
    }

    /// Next revision of `file_id` after the revision stored under `after_key`
    ///
    /// Pass an empty key to start at the file's oldest revision. Returns the
    /// cursor key alongside the revision.
    pub fn next_revision(&self, file_id: &str, after_key: &str) -> StoreResult<Option<(String, RevisionRef)>> {
        let prefix = keys::revision_prefix(file_id)?;
        // The bare prefix is never a stored key and sorts before all of the file's keys
        let seek = if after_key.is_empty() { prefix.as_str() } else { after_key };

        match self.next::<RevisionRef>(Namespace::Revisions, seek)? {
            Some((key, revision)) if key.starts_with(&prefix) => Ok(Some((key, revision))),
            _ => Ok(None),
        }
    }

    /// Every stored revision of a file, oldest first
    pub fn revisions_for(&self, file_id: &str) -> StoreResult<Vec<RevisionRef>> {
        let prefix = keys::revision_prefix(file_id)?;
        self.revisions
            .scan_prefix(prefix.as_bytes())
            .map(|entry| {
                let (k, v) = entry.map_err(|e| StoreError::engine(Namespace::Revisions, &prefix, e))?;
                Self::decode(Namespace::Revisions, &String::from_utf8_lossy(&k), &v)
            })
            .collect()
    }

    // Document statistics

    pub fn put_document_stat(&self, stat: &DocumentStat) -> StoreResult<()> {
        let key = keys::id_key(Namespace::DocumentStats, &stat.file_id)?;
        self.put(Namespace::DocumentStats, &key, stat)
    }

    pub fn get_document_stat(&self, file_id: &str) -> StoreResult<Option<DocumentStat>> {
        self.get(Namespace::DocumentStats, file_id)
    }

    pub fn next_document_stat(&self, after_file_id: &str) -> StoreResult<Option<DocumentStat>> {
        Ok(self
            .next::<DocumentStat>(Namespace::DocumentStats, after_file_id)?
            .map(|(_, stat)| stat))
    }

    /// Every stored document stat, in file id order
    pub fn document_stats(&self) -> StoreResult<Vec<DocumentStat>> {
        let mut stats = Vec::new();
        let mut cursor = String::new();
        while let Some(stat) = self.next_document_stat(&cursor)? {
            cursor = stat.file_id.clone();
            stats.push(stat);
        }
        Ok(stats)
    }

    // Daily statistics

    pub fn put_daily_stat(&self, day: &DailyStat) -> StoreResult<()> {
        self.put(Namespace::DailyStats, &keys::daily_key(day.date), day)
    }

    pub fn get_daily_stat(&self, date: chrono::NaiveDate) -> StoreResult<Option<DailyStat>> {
        self.get(Namespace::DailyStats, &keys::daily_key(date))
    }

    /// Day following `after_key` (a `YYYY-MM-DD` key, or empty for the first day)
    pub fn next_daily_stat(&self, after_key: &str) -> StoreResult<Option<DailyStat>> {
        Ok(self
            .next::<DailyStat>(Namespace::DailyStats, after_key)?
            .map(|(_, day)| day))
    }

    /// Ordered cursor over stored days strictly after `after_key`
    pub fn daily_stats_after(&self, after_key: &str) -> DailyStatCursor<'_> {
        DailyStatCursor {
            store: self,
            cursor: after_key.to_string(),
            done: false,
        }
    }

    /// Write a freshly rebuilt set of days in one atomic batch
    ///
    /// `days` is the complete rebuild. Stored days it no longer covers are
    /// rewritten empty rather than removed, so the calendar keeps every day
    /// it ever showed while no delta is counted twice.
    pub fn replace_daily_stats(&self, days: &DailyMap) -> StoreResult<()> {
        let mut batch = sled::Batch::default();
        let mut emptied = 0;
        for stored in self.daily_stats_after("") {
            let stored = stored?;
            if !days.contains_key(&stored.date) && !stored.is_empty() {
                let key = stored.key();
                let empty = DailyStat::new(stored.date);
                batch.insert(key.as_bytes(), Self::encode(Namespace::DailyStats, &key, &empty)?);
                emptied += 1;
            }
        }
        for (date, day) in days {
            let key = keys::daily_key(*date);
            batch.insert(key.as_bytes(), Self::encode(Namespace::DailyStats, &key, day)?);
        }
        self.daily_stats
            .apply_batch(batch)
            .map_err(|e| StoreError::engine(Namespace::DailyStats, "<batch>", e))?;
        debug!("Wrote {} daily stats, emptied {} stale days", days.len(), emptied);
        self.flush(Namespace::DailyStats, "<batch>")
    }

    /// Fold `incoming` into the stored record for the same day
    ///
    /// Read-modify-write happens in one transaction. The caller must not
    /// merge the same revisions twice; see [`crate::stats::daily::merge`].
    pub fn merge_daily_stat(&self, incoming: &DailyStat) -> StoreResult<DailyStat> {
        let key = keys::daily_key(incoming.date);
        let ns = Namespace::DailyStats;

        let result = self.daily_stats.transaction(|tx| {
            let existing = match tx.get(key.as_bytes())? {
                Some(bytes) => Some(Self::decode::<DailyStat>(ns, &key, &bytes).map_err(ConflictableTransactionError::Abort)?),
                None => None,
            };
            let merged = daily::merge(existing, incoming.clone())
                .map_err(|e| ConflictableTransactionError::Abort(StoreError::from(e)))?;
            let bytes = Self::encode(ns, &key, &merged).map_err(ConflictableTransactionError::Abort)?;
            tx.insert(key.as_bytes(), bytes)?;
            Ok(merged)
        });

        let merged = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::engine(ns, &key, e),
        })?;
        self.flush(ns, &key)?;
        Ok(merged)
    }

    // User

    pub fn put_user(&self, user: &UserIdentity) -> StoreResult<()> {
        self.put(Namespace::User, USER_KEY, user)
    }

    pub fn get_user(&self) -> StoreResult<Option<UserIdentity>> {
        self.get(Namespace::User, USER_KEY)
    }

    /// Size of the database on disk, in bytes
    pub fn size_on_disk(&self) -> StoreResult<u64> {
        self.db
            .size_on_disk()
            .map_err(|e| StoreError::engine(Namespace::Documents, "", e))
    }
}

/// Forward cursor over daily stats, loading one record per step
pub struct DailyStatCursor<'a> {
    store: &'a StatStore,
    cursor: String,
    done: bool,
}

impl Iterator for DailyStatCursor<'_> {
    type Item = StoreResult<DailyStat>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.next_daily_stat(&self.cursor) {
            Ok(Some(day)) => {
                self.cursor = day.key();
                Some(Ok(day))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn file(id: &str) -> FileRef {
        FileRef {
            id: id.to_string(),
            title: format!("Title {id}"),
            mime_type: crate::source::DOCUMENT_MIME_TYPE.to_string(),
            modified_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn revision(id: &str, hour: u32) -> RevisionRef {
        RevisionRef {
            id: id.to_string(),
            modified_date: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            author_name: "Ada".to_string(),
            export_uri: format!("memory://{id}"),
        }
    }

    #[test]
    fn test_put_get_overwrite() {
        let store = StatStore::temporary().unwrap();
        let mut day = DailyStat::new(date(2024, 1, 1));
        day.record_delta("D1", "R1", 10);
        store.put_daily_stat(&day).unwrap();
        assert_eq!(store.get_daily_stat(date(2024, 1, 1)).unwrap(), Some(day.clone()));

        day.record_delta("D1", "R2", -3);
        store.put_daily_stat(&day).unwrap();
        let stored = store.get_daily_stat(date(2024, 1, 1)).unwrap().unwrap();
        assert_eq!(stored.words_removed, 3);
        assert_eq!(store.len(Namespace::DailyStats), 1);

        assert_eq!(store.get_daily_stat(date(2024, 1, 2)).unwrap(), None);
    }

    #[test]
    fn test_next_is_strictly_greater() {
        let store = StatStore::temporary().unwrap();
        for id in ["b", "a", "c"] {
            store.put_file(&file(id)).unwrap();
        }

        assert_eq!(store.next_file("").unwrap().unwrap().id, "a");
        assert_eq!(store.next_file("a").unwrap().unwrap().id, "b");
        assert_eq!(store.next_file("b").unwrap().unwrap().id, "c");
        assert!(store.next_file("c").unwrap().is_none());
        // Seeking from a key that is not stored lands on the following one
        assert_eq!(store.next_file("aa").unwrap().unwrap().id, "b");
    }

    #[test]
    fn test_revision_cursor_is_chronological() {
        let store = StatStore::temporary().unwrap();
        store.put_revision("D1", &revision("zz-first", 8)).unwrap();
        store.put_revision("D1", &revision("aa-second", 9)).unwrap();
        store.put_revision("D10", &revision("other", 7)).unwrap();
        store.put_revision("D0", &revision("before", 7)).unwrap();

        let mut seen = Vec::new();
        let mut cursor = String::new();
        while let Some((key, rev)) = store.next_revision("D1", &cursor).unwrap() {
            seen.push(rev.id);
            cursor = key;
        }
        assert_eq!(seen, vec!["zz-first", "aa-second"]);

        let all: Vec<String> = store.revisions_for("D1").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(all, seen);
    }

    #[test]
    fn test_revision_cursor_ignores_ids_sorting_inside_the_prefix() {
        let store = StatStore::temporary().unwrap();
        // "D1\u{1}" sorts between "D1" and "D1\u{1f}"
        store.put_revision("D1\u{1}", &revision("neighbour", 7)).unwrap();
        store.put_revision("D1", &revision("mine", 8)).unwrap();

        let (key, first) = store.next_revision("D1", "").unwrap().unwrap();
        assert_eq!(first.id, "mine");
        assert!(store.next_revision("D1", &key).unwrap().is_none());
    }

    #[test]
    fn test_daily_cursor_visits_every_day_once_in_order() {
        let store = StatStore::temporary().unwrap();
        let dates = [date(2024, 3, 1), date(2023, 12, 31), date(2024, 1, 15), date(2024, 1, 2)];
        for d in dates {
            store.put_daily_stat(&DailyStat::new(d)).unwrap();
        }

        let seen: Vec<NaiveDate> = store
            .daily_stats_after("")
            .map(|day| day.unwrap().date)
            .collect();
        let mut expected = dates.to_vec();
        expected.sort();
        assert_eq!(seen, expected);

        let tail: Vec<NaiveDate> = store
            .daily_stats_after("2024-01-02")
            .map(|day| day.unwrap().date)
            .collect();
        assert_eq!(tail, vec![date(2024, 1, 15), date(2024, 3, 1)]);
    }

    #[test]
    fn test_replace_daily_stats_batch() {
        let store = StatStore::temporary().unwrap();
        let mut old = DailyStat::new(date(2020, 1, 1));
        old.record_delta("OLD", "R", 5);
        store.put_daily_stat(&old).unwrap();

        let mut days = DailyMap::new();
        for d in [date(2024, 1, 1), date(2024, 1, 2)] {
            let mut day = DailyStat::new(d);
            day.record_delta("D1", "R1", 1);
            days.insert(d, day);
        }
        store.replace_daily_stats(&days).unwrap();

        // The day no longer covered by the rebuild stays, emptied
        assert_eq!(store.len(Namespace::DailyStats), 3);
        assert_eq!(store.get_daily_stat(date(2020, 1, 1)).unwrap(), Some(DailyStat::new(date(2020, 1, 1))));
        assert_eq!(store.get_daily_stat(date(2024, 1, 2)).unwrap(), days.get(&date(2024, 1, 2)).cloned());

        store.replace_daily_stats(&DailyMap::new()).unwrap();
        let totals = daily::totals(&store.daily_stats_after("").collect::<StoreResult<Vec<_>>>().unwrap());
        assert_eq!(totals, (0, 0));
        assert_eq!(store.len(Namespace::DailyStats), 3);
    }

    #[test]
    fn test_merge_daily_stat() {
        let store = StatStore::temporary().unwrap();
        let mut first = DailyStat::new(date(2024, 1, 1));
        first.record_delta("D1", "R1", 10);
        let merged = store.merge_daily_stat(&first).unwrap();
        assert_eq!(merged, first);

        let mut second = DailyStat::new(date(2024, 1, 1));
        second.record_delta("D2", "S1", -4);
        let merged = store.merge_daily_stat(&second).unwrap();
        assert_eq!(merged.words_added, 10);
        assert_eq!(merged.words_removed, 4);
        assert_eq!(store.get_daily_stat(date(2024, 1, 1)).unwrap(), Some(merged));
    }

    #[test]
    fn test_user_identity_round_trip() {
        let store = StatStore::temporary().unwrap();
        assert!(store.get_user().unwrap().is_none());

        let user = UserIdentity {
            user_id: "42".to_string(),
            email: "writer@example.com".to_string(),
            update_date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            token: vec![1, 2, 3, 255],
        };
        store.put_user(&user).unwrap();
        assert_eq!(store.get_user().unwrap(), Some(user));
    }

    #[test]
    fn test_document_stats_listing() {
        let store = StatStore::temporary().unwrap();
        for id in ["b", "a"] {
            let stat = DocumentStat::new(id, "t", Utc::now(), Vec::new());
            store.put_document_stat(&stat).unwrap();
        }
        let ids: Vec<String> = store.document_stats().unwrap().into_iter().map(|s| s.file_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.get_document_stat("missing").unwrap().is_none());
    }

    #[test]
    fn test_decode_error_names_record() {
        let store = StatStore::temporary().unwrap();
        store.put(Namespace::DailyStats, "2024-01-01", &"not a day").unwrap();
        let err = store.get_daily_stat(date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Decode { namespace: Namespace::DailyStats, .. }));
        assert!(err.to_string().contains("2024-01-01"));
    }

    #[test]
    fn test_invalid_file_id_rejected() {
        let store = StatStore::temporary().unwrap();
        assert!(matches!(store.put_file(&file("")), Err(StoreError::InvalidKey { .. })));
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        {
            let store = StatStore::open(&path).unwrap();
            store.put_file(&file("D1")).unwrap();
        }
        let store = StatStore::open(&path).unwrap();
        assert_eq!(store.get_file("D1").unwrap().unwrap().title, "Title D1");
    }
}
