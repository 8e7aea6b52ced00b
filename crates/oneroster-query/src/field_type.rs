//! Column classes of filterable fields.
//!
//! Filter values arrive as text. Before binding, a value compared against a
//! typed column is parsed and rewritten into one canonical literal that both
//! PostgreSQL and SQL Server cast the same way, so a filter selects the same
//! rows on either engine.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Canonical timestamp literal, UTC without offset.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive timestamp spellings accepted besides RFC 3339.
const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// How a field is compared in a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Compared as case-sensitive text.
    #[default]
    Text,
    Boolean,
    Integer,
    Date,
    /// Compared as a timestamp without time zone, in UTC.
    Timestamp,
}

impl FieldType {
    /// Human readable description used in error messages.
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Boolean => "true or false",
            Self::Integer => "an integer",
            Self::Date => "a date (YYYY-MM-DD)",
            Self::Timestamp => "an ISO 8601 date or timestamp",
        }
    }

    /// Rewrites a comparison value into the literal that gets bound.
    ///
    /// Timestamps with an offset are converted to UTC; a bare date means
    /// midnight. Returns `None` when `value` does not parse as this type.
    #[must_use]
    pub fn normalize(self, value: &str) -> Option<String> {
        match self {
            Self::Text => Some(value.to_string()),
            Self::Boolean => {
                if value.eq_ignore_ascii_case("true") {
                    Some("true".to_string())
                } else if value.eq_ignore_ascii_case("false") {
                    Some("false".to_string())
                } else {
                    None
                }
            }
            Self::Integer => value.parse::<i64>().ok().map(|n| n.to_string()),
            Self::Date => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(|date| date.format(DATE_FORMAT).to_string()),
            Self::Timestamp => {
                parse_timestamp(value).map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
