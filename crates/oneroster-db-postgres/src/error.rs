//! Error types for the PostgreSQL executor.

use oneroster_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// Errors specific to the PostgreSQL executor.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Error reported by sqlx (connection, protocol or engine).
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Returns `true` if the error means the database could not be reached.
#[must_use]
pub fn is_connectivity_error(err: &SqlxError) -> bool {
    matches!(
        err,
        SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::Protocol(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed
    )
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Sqlx(e) if is_connectivity_error(&e) => {
                StorageError::unavailable(e.to_string())
            }
            PostgresError::Sqlx(SqlxError::Configuration(e)) => {
                StorageError::unavailable(format!("Invalid connection settings: {e}"))
            }
            PostgresError::Sqlx(SqlxError::Database(e)) => StorageError::query(e.to_string()),
            PostgresError::Sqlx(e) => StorageError::internal(e.to_string()),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;
