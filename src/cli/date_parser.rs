//! Date parsing for CLI arguments
//!
//! Days are calendar days in UTC, the same buckets the daily stats use.
//! Accepted forms:
//! - Absolute: `2024-01-31`, or an RFC 3339 timestamp whose UTC date is taken
//! - Relative: `today`, `yesterday`, `3 days ago`, `2 weeks ago`

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Error types for date parsing
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date: {input}. Expected YYYY-MM-DD or a relative day (e.g. 'yesterday', '3 days ago')")]
    InvalidFormat { input: String },

    #[error("Unsupported time unit: {unit}. Supported units: days, weeks")]
    UnsupportedUnit { unit: String },

    #[error("Invalid number in relative date: {input}")]
    InvalidNumber { input: String },
}

/// Parse a day relative to the current UTC date
pub fn parse_day(input: &str) -> Result<NaiveDate, DateParseError> {
    parse_day_from(input, Utc::now().date_naive())
}

/// Parse a day, resolving relative forms against `today`
pub fn parse_day_from(input: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();

    if let Ok(date) = crate::stats::parse_date(trimmed) {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    parse_relative_day(trimmed, today)
}

fn parse_relative_day(input: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let input_lower = input.to_lowercase();

    match input_lower.as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    // "N unit ago"
    let parts: Vec<&str> = input_lower.split_whitespace().collect();
    if let [number, unit, "ago"] = parts.as_slice() {
        let number = number
            .parse::<i64>()
            .map_err(|_| DateParseError::InvalidNumber { input: input.to_string() })?;

        let days = match *unit {
            "day" | "days" => number,
            "week" | "weeks" => number * 7,
            _ => return Err(DateParseError::UnsupportedUnit { unit: unit.to_string() }),
        };
        return Ok(today - Duration::days(days));
    }

    Err(DateParseError::InvalidFormat { input: input.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_absolute_days() {
        assert_eq!(parse_day_from("2024-01-31", today()).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(
            parse_day_from("2024-01-31T23:30:00-02:00", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(parse_day_from("today", today()).unwrap(), today());
        assert_eq!(parse_day_from("Yesterday", today()).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(parse_day_from("  3 days ago ", today()).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(parse_day_from("2 WEEKS AGO", today()).unwrap(), NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
    }

    #[test]
    fn test_error_cases() {
        assert!(matches!(parse_day_from("not-a-date", today()), Err(DateParseError::InvalidFormat { .. })));
        assert!(parse_day_from("2024-13-01", today()).is_err());
        assert!(matches!(parse_day_from("abc days ago", today()), Err(DateParseError::InvalidNumber { .. })));
        assert!(matches!(parse_day_from("1 fortnight ago", today()), Err(DateParseError::UnsupportedUnit { .. })));
        assert!(parse_day_from("1 day", today()).is_err());
    }
}
