//! Error types for the SQL Server executor.

use oneroster_storage::StorageError;
use tiberius::error::Error as TiberiusError;

/// Errors specific to the SQL Server executor.
#[derive(Debug, thiserror::Error)]
pub enum MssqlError {
    /// Error reported by the TDS client or the server.
    #[error("Database error: {0}")]
    Tiberius(#[from] TiberiusError),

    /// Failure while opening a pooled connection.
    #[error("Connection error: {0}")]
    Connection(#[from] bb8_tiberius::Error),

    /// Pool error.
    #[error("Pool error: {message}")]
    Pool { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl MssqlError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new pool error.
    #[must_use]
    pub fn pool(message: impl Into<String>) -> Self {
        Self::Pool {
            message: message.into(),
        }
    }
}

impl From<bb8::RunError<bb8_tiberius::Error>> for MssqlError {
    fn from(err: bb8::RunError<bb8_tiberius::Error>) -> Self {
        match err {
            bb8::RunError::User(e) => Self::Connection(e),
            bb8::RunError::TimedOut => Self::pool("timed out waiting for a connection"),
        }
    }
}

fn classify(err: TiberiusError) -> StorageError {
    match err {
        TiberiusError::Server(token) => StorageError::query(token.to_string()),
        TiberiusError::Io { .. }
        | TiberiusError::Tls(_)
        | TiberiusError::Routing { .. }
        | TiberiusError::Protocol(_) => StorageError::unavailable(err.to_string()),
        other => StorageError::internal(other.to_string()),
    }
}

impl From<MssqlError> for StorageError {
    fn from(err: MssqlError) -> Self {
        match err {
            MssqlError::Tiberius(e) => classify(e),
            MssqlError::Connection(bb8_tiberius::Error::Tiberius(e)) => match classify(e) {
                StorageError::Query { message } | StorageError::Internal { message } => {
                    StorageError::unavailable(message)
                }
                other => other,
            },
            MssqlError::Connection(e) => StorageError::unavailable(e.to_string()),
            MssqlError::Pool { message } => {
                StorageError::unavailable(format!("Pool error: {message}"))
            }
            MssqlError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Result type alias for SQL Server operations.
pub type Result<T> = std::result::Result<T, MssqlError>;
