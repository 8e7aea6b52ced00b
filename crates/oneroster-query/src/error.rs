//! Error taxonomy of the query core.
//!
//! Validation errors are raised before any SQL reaches the database; only
//! [`QueryError::Storage`] comes from execution.

use oneroster_storage::StorageError;

/// Minor code for filter errors in the IMS status envelope.
pub const INVALID_FILTER_FIELD: &str = "invalid_filter_field";

/// Minor code for projection errors in the IMS status envelope.
pub const INVALID_SELECTION_FIELD: &str = "invalid_selection_field";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A filter clause has no recognised predicate.
    #[error("Invalid filter clause: {clause}. Supported operators: =, !=, >, >=, <, <=, ~")]
    FilterSyntax { clause: String },

    /// The filter combines ` AND ` and ` OR `, which the grammar does not support.
    #[error("Invalid filter clause: {filter}. A filter may use AND or OR, not both")]
    MixedConnectives { filter: String },

    /// A filter clause names a field outside the resource's filter allow-list.
    #[error("Field '{field}' is not allowed for filtering")]
    InvalidFilterField { field: String },

    /// A comparison value does not parse as the field's column type.
    #[error("Invalid filter clause: value '{value}' for field '{field}' must be {expected}")]
    InvalidFilterValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// One or more requested fields are outside the selectable allow-list.
    #[error("Invalid fields: {}. Allowed fields: {}", fields.join(", "), allowed.join(", "))]
    InvalidSelectionField {
        fields: Vec<String>,
        allowed: Vec<&'static str>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// IMS minor code for client errors, `None` for execution failures.
    #[must_use]
    pub fn minor_code(&self) -> Option<&'static str> {
        match self {
            Self::FilterSyntax { .. }
            | Self::MixedConnectives { .. }
            | Self::InvalidFilterField { .. }
            | Self::InvalidFilterValue { .. } => Some(INVALID_FILTER_FIELD),
            Self::InvalidSelectionField { .. } => Some(INVALID_SELECTION_FIELD),
            Self::Storage(_) => None,
        }
    }
}
