//! The executor contract every database backend implements.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{Record, RenderedQuery};

/// Read-only executor over an already-initialised connection pool.
///
/// Implementations bind [`RenderedQuery::params`] positionally, run the
/// statement in a single round trip and return each row as a JSON map whose
/// keys follow the projection order. No retries happen at this layer.
#[async_trait]
pub trait RosterExecutor: Send + Sync {
    /// Executes a rendered query and returns every row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the pool or connection fails,
    /// [`StorageError::Query`] when the engine rejects the statement and
    /// [`StorageError::Decode`] when a column cannot be represented as JSON.
    async fn fetch_all(&self, query: &RenderedQuery) -> Result<Vec<Record>, StorageError>;

    /// Checks that the database answers a trivial statement.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the database cannot be reached.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Returns the name of this backend, for logs.
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticExecutor;

    #[async_trait]
    impl RosterExecutor for StaticExecutor {
        async fn fetch_all(&self, query: &RenderedQuery) -> Result<Vec<Record>, StorageError> {
            if query.sql.is_empty() {
                return Err(StorageError::query("empty statement"));
            }
            let mut row = Record::new();
            row.insert("sourcedId".into(), json!("org-1"));
            Ok(vec![row])
        }

        async fn ping(&self) -> Result<(), StorageError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_executor_is_object_safe() {
        let executor: crate::DynExecutor = std::sync::Arc::new(StaticExecutor);
        let rows = executor
            .fetch_all(&RenderedQuery::new("SELECT 1", vec![]))
            .await
            .expect("query failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(executor.backend_name(), "static");

        let err = executor
            .fetch_all(&RenderedQuery::default())
            .await
            .expect_err("empty statement should fail");
        assert!(matches!(err, StorageError::Query { .. }));
    }
}
