//! Response envelopes and JSON-column normalisation.

use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use oneroster_storage::Record;

/// Columns that hold JSON documents. SQL Server returns them as text.
pub const JSON_COLUMNS: &[&str] = &[
    "metadata",
    "parent",
    "children",
    "grades",
    "subjects",
    "course",
    "school",
    "terms",
    "subjectCodes",
    "periods",
    "resources",
    "org",
    "class",
    "user",
    "userIds",
    "roles",
    "userProfiles",
    "agentSourceIds",
];

pub struct ResultShaper;

impl ResultShaper {
    /// `{ "<collectionKey>": [records...] }`
    #[must_use]
    pub fn wrap_many(endpoint: Endpoint, records: Vec<Record>) -> Value {
        let records = records.into_iter().map(Value::Object).collect();
        Self::wrap(endpoint.collection_key(), Value::Array(records))
    }

    /// `{ "<singularKey>": record }`
    #[must_use]
    pub fn wrap_one(endpoint: Endpoint, record: Record) -> Value {
        Self::wrap(endpoint.singular_key(), Value::Object(record))
    }

    fn wrap(key: &str, payload: Value) -> Value {
        let mut body = Map::with_capacity(1);
        body.insert(key.to_string(), payload);
        Value::Object(body)
    }

    /// Decodes text-encoded JSON columns in place, leaving everything else untouched.
    #[must_use]
    pub fn normalize_record(mut record: Record) -> Record {
        for (column, value) in record.iter_mut() {
            if JSON_COLUMNS.contains(&column.as_str()) {
                decode_json_text(value);
            }
        }
        record
    }
}

/// Replaces a string shaped like a JSON object or array with its decoded
/// value. Anything that fails to parse stays a string.
fn decode_json_text(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return;
    }
    if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
        *value = decoded;
    }
}
