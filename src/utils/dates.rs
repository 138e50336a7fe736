use chrono::{Days, NaiveDate};

use crate::domain::order::OrderError;

// ============================================================================
// Calendar Date Helpers
// ============================================================================
//
// Delivery dates and reconciliation cutoffs travel as `YYYY-MM-DD` strings.
// A candidate is only accepted when parsing it and formatting the result
// reproduces the input exactly, which rules out unpadded fields, signs and
// trailing garbage that the parser alone would tolerate.
//
// ============================================================================

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Strict `YYYY-MM-DD` check with round-trip equality
pub fn is_valid_calendar_date(candidate: &str) -> bool {
    parse_calendar_date(candidate).is_ok()
}

/// Parse a `YYYY-MM-DD` string, rejecting anything that does not round-trip
pub fn parse_calendar_date(candidate: &str) -> Result<NaiveDate, OrderError> {
    NaiveDate::parse_from_str(candidate, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == candidate)
        .ok_or_else(|| OrderError::InvalidDateFormat(candidate.to_string()))
}

/// `today` moved `days` into the future. Zero days is rejected.
pub fn generate_date_in_future(today: NaiveDate, days: u32) -> Result<NaiveDate, OrderError> {
    if days == 0 {
        return Err(OrderError::NonPositiveDayCount);
    }

    today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or(OrderError::DateOutOfRange(days, today))
}

/// Serde adapter rendering timestamps as `YYYY-MM-DD HH:MM:SS`
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }
}
