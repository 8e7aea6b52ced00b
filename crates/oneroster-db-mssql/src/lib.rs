//! SQL Server executor for the OneRoster server.
//!
//! Provides a [`RosterExecutor`](oneroster_storage::RosterExecutor) over a
//! bb8 pool of tiberius clients. Rendered queries use `@Pn` named
//! parameters, which is how tiberius names positional binds.
//!
//! ```ignore
//! use oneroster_db_mssql::{MssqlConfig, MssqlExecutor};
//!
//! let config = MssqlConfig::new("server=tcp:localhost,1433;user=sa;password=...;database=oneroster");
//! let executor = MssqlExecutor::connect(&config).await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod pool;

pub use config::MssqlConfig;
pub use error::{MssqlError, Result};
pub use executor::MssqlExecutor;
pub use pool::{MssqlPool, create_pool, test_connection};
