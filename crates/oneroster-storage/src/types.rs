//! Value types passed between the query core and the executors.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// A single row, keyed by column name in projection order.
pub type Record = Map<String, Value>;

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

impl SqlValue {
    /// Returns the text payload, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// SQL text plus its bound parameters, in placeholder order.
///
/// A rendered query belongs to a single request and is dropped once executed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl RenderedQuery {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Renders a timestamp the way every backend reports it: RFC 3339, UTC, millisecond precision.
#[must_use]
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamps without a zone are stored as UTC.
#[must_use]
pub fn format_naive_timestamp(value: NaiveDateTime) -> String {
    format_timestamp(value.and_utc())
}

#[must_use]
pub fn format_date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}
