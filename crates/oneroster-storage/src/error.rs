//! Storage error types shared by every executor backend.

use std::fmt;

/// Errors that can occur while executing a rendered query.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The database could not be reached (transport, pool or connection failure).
    #[error("Database unavailable: {message}")]
    Unavailable {
        /// Description of the connectivity failure.
        message: String,
    },

    /// The engine rejected the statement.
    #[error("Query error: {message}")]
    Query {
        /// Description reported by the engine.
        message: String,
    },

    /// A column value could not be converted to JSON.
    #[error("Failed to decode column '{column}': {message}")]
    Decode {
        /// Name of the offending column.
        column: String,
        /// Description of the decode failure.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Query` error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the database could not be reached.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unavailable { .. } => ErrorCategory::Infrastructure,
            Self::Query { .. } => ErrorCategory::Query,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection or pool failure.
    Infrastructure,
    /// Statement rejected by the engine.
    Query,
    /// Row decoding failure.
    Decode,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Query => write!(f, "query"),
            Self::Decode => write!(f, "decode"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
