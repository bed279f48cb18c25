//! Statistics data model
//!
//! Provides the records produced by a sweep (per revision, per document) and
//! the calendar-day aggregate they are folded into. These types know nothing
//! about the store; the store depends on them.

pub mod daily;
pub mod error;
pub mod words;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub use daily::{merge, reduce, reduce_document, DailyMap};
pub use error::{ParseError, ReduceError};
pub use words::{WordCount, WordCounter, WordOptions};

/// Calendar day format used for keys and display
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO-8601 timestamp as returned by the document API
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ParseError::timestamp(value, e))
}

/// Format a timestamp with millisecond precision, e.g. `2024-01-01T09:30:00.000Z`
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a `YYYY-MM-DD` calendar day
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ParseError::date(value))
}

/// The calendar bucket a timestamp falls in (UTC)
pub fn day_of(value: &DateTime<Utc>) -> NaiveDate {
    value.date_naive()
}

/// A word and how often it occurred in one revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPair {
    pub word: String,
    pub count: u64,
    /// `count / total words` of the revision the pair was taken from
    pub ratio: f64,
}

impl WordPair {
    pub fn new(word: impl Into<String>, count: u64, total: u64) -> Self {
        let ratio = if total == 0 { 0.0 } else { count as f64 / total as f64 };
        Self {
            word: word.into(),
            count,
            ratio,
        }
    }
}

impl fmt::Display for WordPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({:.2})", self.word, self.count, self.ratio)
    }
}

/// Word statistics for a single revision of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionStat {
    pub revision_id: String,
    /// Display name of the user who made the revision
    pub user_name: String,
    pub modified_date: DateTime<Utc>,
    /// Total words in the exported revision text
    pub word_count: u64,
    /// Most frequent words, highest count first
    pub word_freq: Vec<WordPair>,
}

impl RevisionStat {
    /// Day this revision is attributed to
    pub fn day(&self) -> NaiveDate {
        day_of(&self.modified_date)
    }

    /// Time of day of the revision as `HH:MM`
    pub fn time_of_day(&self) -> String {
        self.modified_date.format("%H:%M").to_string()
    }
}

impl fmt::Display for RevisionStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = self.word_freq.iter().map(|w| w.to_string()).collect();
        write!(
            f,
            "[{} {}] {} words by {}. Words [{}]",
            format_timestamp(&self.modified_date),
            self.revision_id,
            self.word_count,
            self.user_name,
            words.join(" ")
        )
    }
}

/// Statistics for one document across its revision history
///
/// Always written as a complete unit; a sweep replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStat {
    pub file_id: String,
    pub title: String,
    pub last_modified: DateTime<Utc>,
    /// Chronological, oldest first
    pub revisions: Vec<RevisionStat>,
}

impl DocumentStat {
    /// Create a document stat, ordering the revisions chronologically
    pub fn new(
        file_id: impl Into<String>,
        title: impl Into<String>,
        last_modified: DateTime<Utc>,
        mut revisions: Vec<RevisionStat>,
    ) -> Self {
        sort_revisions(&mut revisions);
        Self {
            file_id: file_id.into(),
            title: title.into(),
            last_modified,
            revisions,
        }
    }

    /// Signed word delta of each revision against its predecessor
    ///
    /// The first revision is measured against an empty document.
    pub fn deltas(&self) -> Vec<(&RevisionStat, i64)> {
        let mut previous = 0i64;
        self.revisions
            .iter()
            .map(|rev| {
                let current = rev.word_count as i64;
                let delta = current - previous;
                previous = current;
                (rev, delta)
            })
            .collect()
    }

    pub fn revision(&self, revision_id: &str) -> Option<&RevisionStat> {
        self.revisions.iter().find(|r| r.revision_id == revision_id)
    }

    /// Word count of the most recent revision
    pub fn current_word_count(&self) -> u64 {
        self.revisions.last().map_or(0, |r| r.word_count)
    }
}

impl fmt::Display for DocumentStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] '{}' last mod on {} with revs",
            self.file_id,
            self.title,
            format_timestamp(&self.last_modified)
        )?;
        for (i, rev) in self.revisions.iter().enumerate() {
            writeln!(f, "\t {}:{}", i, rev)?;
        }
        Ok(())
    }
}

/// Stable chronological sort; equal timestamps keep their source order
pub fn sort_revisions(revisions: &mut [RevisionStat]) {
    revisions.sort_by(|a, b| a.modified_date.cmp(&b.modified_date));
}

/// Words added and removed on one calendar day, across all documents
///
/// `words_removed` is a non-negative magnitude everywhere, including on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub words_added: u64,
    pub words_removed: u64,
    /// File id -> revision ids landing on this day, in fold order
    pub file_revisions: BTreeMap<String, Vec<String>>,
}

impl DailyStat {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            words_added: 0,
            words_removed: 0,
            file_revisions: BTreeMap::new(),
        }
    }

    /// Attribute one revision's signed delta to this day
    pub fn record_delta(&mut self, file_id: &str, revision_id: &str, delta: i64) {
        if delta >= 0 {
            self.words_added += delta as u64;
        } else {
            self.words_removed += delta.unsigned_abs();
        }
        self.file_revisions
            .entry(file_id.to_string())
            .or_default()
            .push(revision_id.to_string());
    }

    /// Net change for the day
    pub fn net(&self) -> i64 {
        self.words_added as i64 - self.words_removed as i64
    }

    /// Total words touched (added plus removed)
    pub fn words_changed(&self) -> u64 {
        self.words_added + self.words_removed
    }

    pub fn revision_count(&self) -> usize {
        self.file_revisions.values().map(Vec::len).sum()
    }

    /// No revision landed on this day
    pub fn is_empty(&self) -> bool {
        self.file_revisions.is_empty() && self.words_added == 0 && self.words_removed == 0
    }

    pub fn key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DailyStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Words +{} / -{} across {} files",
            self.key(),
            self.words_added,
            self.words_removed,
            self.file_revisions.len()
        )
    }
}

/// The single user a database belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub update_date: DateTime<Utc>,
    /// Opaque credential blob from the login collaborator; never interpreted
    pub token: Vec<u8>,
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} last updated on {} (TOKEN HIDDEN)",
            self.user_id,
            self.email,
            format_timestamp(&self.update_date)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rev(id: &str, ts: &str, words: u64) -> RevisionStat {
        RevisionStat {
            revision_id: id.to_string(),
            user_name: "writer".to_string(),
            modified_date: parse_timestamp(ts).unwrap(),
            word_count: words,
            word_freq: Vec::new(),
        }
    }

    #[test]
    fn test_timestamp_round_trip_keeps_millis() {
        let ts = parse_timestamp("2024-01-01T09:30:15.250Z").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01T09:30:15.250Z");
        assert!(parse_timestamp("2024-13-01").is_err());
    }

    #[test]
    fn test_day_of_truncates_in_utc() {
        let ts = parse_timestamp("2024-03-05T23:59:59.999+00:00").unwrap();
        assert_eq!(day_of(&ts), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        // An offset timestamp is bucketed by its UTC instant
        let ts = parse_timestamp("2024-03-05T23:30:00.000-02:00").unwrap();
        assert_eq!(day_of(&ts), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn test_document_stat_sorts_revisions() {
        let doc = DocumentStat::new(
            "D1",
            "Draft",
            Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            vec![
                rev("R3", "2024-01-02T10:00:00.000Z", 60),
                rev("R1", "2024-01-01T10:00:00.000Z", 50),
                rev("R2", "2024-01-01T11:00:00.000Z", 80),
            ],
        );
        let ids: Vec<&str> = doc.revisions.iter().map(|r| r.revision_id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        assert_eq!(doc.current_word_count(), 60);
    }

    #[test]
    fn test_document_deltas() {
        let doc = DocumentStat::new(
            "D1",
            "Draft",
            Utc::now(),
            vec![
                rev("R0", "2024-01-01T00:00:00.000Z", 0),
                rev("R1", "2024-01-02T00:00:00.000Z", 100),
                rev("R2", "2024-01-03T00:00:00.000Z", 80),
                rev("R3", "2024-01-04T00:00:00.000Z", 130),
            ],
        );
        let deltas: Vec<i64> = doc.deltas().into_iter().map(|(_, d)| d).collect();
        assert_eq!(deltas, vec![0, 100, -20, 50]);
    }

    #[test]
    fn test_record_delta_keeps_removed_positive() {
        let mut day = DailyStat::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        day.record_delta("D1", "R1", 40);
        day.record_delta("D1", "R2", -15);
        day.record_delta("D2", "R9", 0);

        assert_eq!(day.words_added, 40);
        assert_eq!(day.words_removed, 15);
        assert_eq!(day.net(), 25);
        assert_eq!(day.words_changed(), 55);
        assert_eq!(day.revision_count(), 3);
        assert_eq!(day.file_revisions["D1"], vec!["R1", "R2"]);
        assert_eq!(day.key(), "2024-01-01");
    }

    #[test]
    fn test_word_pair_ratio() {
        let pair = WordPair::new("novel", 5, 20);
        assert!((pair.ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(pair.to_string(), "novel:5 (0.25)");
        assert_eq!(WordPair::new("empty", 0, 0).ratio, 0.0);
    }

    #[test]
    fn test_user_identity_hides_token() {
        let user = UserIdentity {
            user_id: "1234".to_string(),
            email: "writer@example.com".to_string(),
            update_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            token: b"secret-refresh-token".to_vec(),
        };
        let shown = user.to_string();
        assert!(shown.contains("TOKEN HIDDEN"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_revision_time_of_day() {
        let r = rev("R1", "2024-01-01T07:05:00.000Z", 1);
        assert_eq!(r.time_of_day(), "07:05");
        assert_eq!(r.day(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
