//! Translation of query failures into HTTP errors.

use oneroster_api::ApiError;
use oneroster_query::QueryError;

/// Maps a [`QueryError`] to the response the client sees.
///
/// Storage failures were already logged inside the query span; the client
/// only gets the generic 500 body.
pub fn api_error(err: QueryError) -> ApiError {
    match err {
        QueryError::InvalidSelectionField { .. } => {
            ApiError::invalid_selection_field(err.to_string())
        }
        QueryError::FilterSyntax { .. }
        | QueryError::MixedConnectives { .. }
        | QueryError::InvalidFilterField { .. }
        | QueryError::InvalidFilterValue { .. } => ApiError::invalid_filter_field(err.to_string()),
        QueryError::Storage(storage) => ApiError::internal(storage.to_string()),
    }
}
