//! [`RosterExecutor`] implementation backed by a sqlx PostgreSQL pool.

use async_trait::async_trait;
use oneroster_storage::prelude::*;
use oneroster_storage::{format_date, format_naive_timestamp, format_timestamp};
use serde_json::Value;
use sqlx_core::column::Column;
use sqlx_core::row::Row;
use sqlx_core::type_info::TypeInfo;
use sqlx_postgres::{PgPool, PgRow};
use tracing::{instrument, warn};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};
use crate::pool::{create_pool, test_connection};

/// Executes rendered queries against PostgreSQL views.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the pool and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RosterExecutor for PostgresExecutor {
    #[instrument(skip_all, fields(params_count = query.param_count()))]
    async fn fetch_all(&self, query: &RenderedQuery) -> StorageResult<Vec<Record>> {
        let mut sqlx_query = sqlx_core::query::query::<sqlx_postgres::Postgres>(&query.sql);

        for param in &query.params {
            sqlx_query = match param {
                SqlValue::Text(s) => sqlx_query.bind(s.clone()),
                SqlValue::Integer(i) => sqlx_query.bind(*i),
            };
        }

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::from(PostgresError::from(e)))?;

        rows.iter().map(decode_row).collect()
    }

    async fn ping(&self) -> StorageResult<()> {
        test_connection(&self.pool).await.map_err(StorageError::from)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn decode_row(row: &PgRow) -> StorageResult<Record> {
    let mut record = Record::with_capacity(row.columns().len());
    for column in row.columns() {
        let name = column.name();
        let value = decode_column(row, column.ordinal(), column.type_info().name())
            .map_err(|e| StorageError::decode(name, e.to_string()))?;
        record.insert(name.to_string(), value);
    }
    Ok(record)
}

/// Converts one column to JSON by its PostgreSQL type name.
fn decode_column(
    row: &PgRow,
    idx: usize,
    type_name: &str,
) -> std::result::Result<Value, sqlx_core::error::Error> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Value::from(f64::from(v))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)?
            .map(|v| Value::String(format_date(v))),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)?
            .map(|v| Value::String(format_naive_timestamp(v))),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)?
            .map(|v| Value::String(format_timestamp(v))),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)?
            .map(|v| Value::String(v.to_string())),
        "TEXT[]" | "VARCHAR[]" => row
            .try_get::<Option<Vec<String>>, _>(idx)?
            .map(|v| Value::Array(v.into_iter().map(Value::String).collect())),
        _ => match row.try_get::<Option<String>, _>(idx) {
            Ok(v) => v.map(Value::String),
            Err(e) => {
                warn!(column_type = type_name, idx, error = %e, "Unsupported column type, returning null");
                None
            }
        },
    };
    Ok(value.unwrap_or(Value::Null))
}
