//! # oneroster-query
//!
//! Translates OneRoster 1.2 collection parameters (`filter`, `fields`,
//! `sort`, `orderBy`, `limit`, `offset`) into parameterized SQL for
//! PostgreSQL or SQL Server, executes it through a
//! [`RosterExecutor`](oneroster_storage::RosterExecutor) and shapes the rows
//! into OneRoster response envelopes.
//!
//! ```ignore
//! use oneroster_query::{DialectKind, Endpoint, PageLimits, QueryRequest, QueryService, ResultShaper};
//!
//! let service = QueryService::new(executor, DialectKind::Postgres);
//! let request = QueryRequest::from_query("filter=status%3D'active'&limit=2", PageLimits::default());
//! let rows = service.query_many(Endpoint::Schools, &request).await?;
//! let body = ResultShaper::wrap_many(Endpoint::Schools, rows); // {"orgs": [...]}
//! ```

pub mod dialect;
pub mod endpoint;
pub mod error;
pub mod field_type;
pub mod fields;
pub mod filter;
pub mod request;
pub mod scope;
pub mod service;
pub mod shaper;

pub use dialect::{Dialect, DialectKind, ParamSink, PostgresDialect, TsqlDialect};
pub use endpoint::{
    Endpoint, EndpointConfig, EndpointConfigRegistry, FixedPredicate, RegistryError, ResourceKind,
};
pub use error::{INVALID_FILTER_FIELD, INVALID_SELECTION_FIELD, QueryError};
pub use field_type::FieldType;
pub use fields::FieldSelection;
pub use filter::{Connective, FilterClause, FilterExpression, FilterOperator};
pub use request::{DEFAULT_LIMIT, PageLimits, QueryRequest, SortDirection};
pub use scope::GrantedScopes;
pub use service::{DEFAULT_SCHEMA, QueryService};
pub use shaper::{JSON_COLUMNS, ResultShaper};
