//! Key layout
//!
//! Keys are UTF-8 strings compared bytewise by the storage engine.
//! - daily stats: `YYYY-MM-DD`, so key order is calendar order
//! - documents and document stats: the file id
//! - revisions: `file id ␟ zero-padded modified millis ␟ revision id`, so a
//!   prefix scan over one file walks its revisions chronologically

use chrono::{DateTime, NaiveDate, Utc};

use super::error::{StoreError, StoreResult};
use super::Namespace;
use crate::stats::DATE_FORMAT;

/// Unit separator between composite key parts
pub const SEPARATOR: char = '\u{1f}';

const MILLIS_WIDTH: usize = 16;

pub fn daily_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_daily_key(key: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT)
        .map_err(|e| StoreError::invalid_key(Namespace::DailyStats, key, e.to_string()))
}

/// Validate a plain id key (file ids)
pub fn id_key(namespace: Namespace, id: &str) -> StoreResult<String> {
    if id.is_empty() {
        return Err(StoreError::invalid_key(namespace, id, "id must not be empty"));
    }
    if id.contains(SEPARATOR) {
        return Err(StoreError::invalid_key(namespace, id, "id contains the key separator"));
    }
    Ok(id.to_string())
}

/// Prefix shared by every revision key of one file
pub fn revision_prefix(file_id: &str) -> StoreResult<String> {
    let file_id = id_key(Namespace::Revisions, file_id)?;
    Ok(format!("{file_id}{SEPARATOR}"))
}

pub fn revision_key(file_id: &str, modified: &DateTime<Utc>, revision_id: &str) -> StoreResult<String> {
    let prefix = revision_prefix(file_id)?;
    let revision_id = id_key(Namespace::Revisions, revision_id)?;
    // Pre-epoch timestamps sort first; the document API never returns them
    let millis = modified.timestamp_millis().max(0);
    Ok(format!("{prefix}{millis:0width$}{SEPARATOR}{revision_id}", width = MILLIS_WIDTH))
}
