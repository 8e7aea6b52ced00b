//! # oneroster-storage
//!
//! Executor abstraction for the OneRoster server.
//!
//! The query core renders a [`RenderedQuery`] and hands it to a
//! [`RosterExecutor`]; backends (PostgreSQL, SQL Server) live in their own
//! crates and only need to bind parameters, run the statement and turn rows
//! into [`Record`]s.
//!
//! ```ignore
//! use oneroster_storage::{RenderedQuery, RosterExecutor, SqlValue, StorageError};
//!
//! async fn active_orgs(executor: &dyn RosterExecutor) -> Result<usize, StorageError> {
//!     let query = RenderedQuery::new(
//!         r#"SELECT "orgs"."sourcedId" FROM "oneroster12"."orgs" WHERE "orgs"."status"::text = $1"#,
//!         vec![SqlValue::from("active")],
//!     );
//!     Ok(executor.fetch_all(&query).await?.len())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::RosterExecutor;
pub use types::{
    Record, RenderedQuery, SqlValue, format_date, format_naive_timestamp, format_timestamp,
};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared executor trait object.
pub type DynExecutor = std::sync::Arc<dyn RosterExecutor>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        DynExecutor, Record, RenderedQuery, RosterExecutor, SqlValue, StorageError, StorageResult,
    };
}
