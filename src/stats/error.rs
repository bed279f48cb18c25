//! Statistics Error Types
//!
//! Errors raised while parsing source records and folding revision
//! statistics into daily aggregates.

use chrono::NaiveDate;
use thiserror::Error;

/// A source record could not be interpreted
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Timestamp was not ISO-8601 / RFC 3339
    #[error("Invalid timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },

    /// Calendar date was not YYYY-MM-DD
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    Date { value: String },

    /// Record is missing a field the statistics depend on
    #[error("Record '{record}' is missing field '{field}'")]
    MissingField { record: String, field: String },
}

impl ParseError {
    pub fn timestamp(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Timestamp {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::Date { value: value.into() }
    }

    pub fn missing_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            record: record.into(),
            field: field.into(),
        }
    }
}

/// Errors from the daily reduction
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReduceError {
    /// Two day records for different dates were handed to a merge
    #[error("Cannot merge daily stats for different dates: existing {existing}, incoming {incoming}")]
    DateMismatch {
        existing: NaiveDate,
        incoming: NaiveDate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::timestamp("yesterday", "input contains invalid characters");
        assert_eq!(
            err.to_string(),
            "Invalid timestamp 'yesterday': input contains invalid characters"
        );

        let err = ParseError::missing_field("rev-1", "modifiedDate");
        assert_eq!(err.to_string(), "Record 'rev-1' is missing field 'modifiedDate'");
    }

    #[test]
    fn test_date_mismatch_display() {
        let err = ReduceError::DateMismatch {
            existing: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            incoming: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        assert!(err.to_string().contains("existing 2024-01-01, incoming 2024-01-02"));
    }
}
