//! [`RosterExecutor`] implementation backed by a tiberius pool.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use oneroster_storage::prelude::*;
use oneroster_storage::{format_date, format_naive_timestamp, format_timestamp};
use serde_json::Value;
use tiberius::{ColumnData, Query, Row};
use tracing::{instrument, warn};

use crate::config::MssqlConfig;
use crate::error::{MssqlError, Result};
use crate::pool::{MssqlPool, create_pool, test_connection};

/// Executes rendered queries against SQL Server views.
///
/// JSON columns arrive as `NVARCHAR` text; the query core decodes them.
#[derive(Clone)]
pub struct MssqlExecutor {
    pool: MssqlPool,
}

impl MssqlExecutor {
    #[must_use]
    pub fn new(pool: MssqlPool) -> Self {
        Self { pool }
    }

    /// Creates the pool and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid or the pool
    /// cannot be created.
    pub async fn connect(config: &MssqlConfig) -> Result<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    #[must_use]
    pub fn pool(&self) -> &MssqlPool {
        &self.pool
    }

    async fn run(&self, query: &RenderedQuery) -> Result<Vec<Row>> {
        let mut conn = self.pool.get().await?;

        let mut tds_query = Query::new(query.sql.as_str());
        for param in &query.params {
            match param {
                SqlValue::Text(s) => tds_query.bind(s.clone()),
                SqlValue::Integer(i) => tds_query.bind(*i),
            }
        }

        let rows = tds_query
            .query(&mut *conn)
            .await?
            .into_first_result()
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl RosterExecutor for MssqlExecutor {
    #[instrument(skip_all, fields(params_count = query.param_count()))]
    async fn fetch_all(
        &self,
        query: &RenderedQuery,
    ) -> StorageResult<Vec<Record>> {
        let rows = self.run(query).await.map_err(StorageError::from)?;
        rows.iter().map(decode_row).collect()
    }

    async fn ping(&self) -> StorageResult<()> {
        test_connection(&self.pool).await.map_err(StorageError::from)
    }

    fn backend_name(&self) -> &'static str {
        "mssql"
    }
}

fn decode_row(row: &Row) -> StorageResult<Record> {
    let mut record = Record::with_capacity(row.len());
    for (idx, (column, data)) in row.cells().enumerate() {
        let value = decode_cell(row, idx, column.name(), data)
            .map_err(|e| StorageError::decode(column.name(), MssqlError::from(e).to_string()))?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Converts one cell to JSON, formatting temporal values like the PostgreSQL executor.
fn decode_cell(
    row: &Row,
    idx: usize,
    column: &str,
    data: &ColumnData<'static>,
) -> std::result::Result<Value, tiberius::error::Error> {
    let value = match data {
        ColumnData::U8(v) => v.map(Value::from),
        ColumnData::I16(v) => v.map(Value::from),
        ColumnData::I32(v) => v.map(Value::from),
        ColumnData::I64(v) => v.map(Value::from),
        ColumnData::F32(v) => v.map(|f| Value::from(f64::from(f))),
        ColumnData::F64(v) => v.map(Value::from),
        ColumnData::Bit(v) => v.map(Value::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| Value::String(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| Value::String(g.to_string())),
        ColumnData::Numeric(v) => v.map(|n| Value::from(f64::from(n))),
        ColumnData::Date(_) => row
            .try_get::<NaiveDate, _>(idx)?
            .map(|d| Value::String(format_date(d))),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => row
            .try_get::<NaiveDateTime, _>(idx)?
            .map(|t| Value::String(format_naive_timestamp(t))),
        ColumnData::DateTimeOffset(_) => row
            .try_get::<DateTime<Utc>, _>(idx)?
            .map(|t| Value::String(format_timestamp(t))),
        _ => {
            warn!(column, "Unsupported column type, returning null");
            None
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_surfaces_config_errors() {
        let config = MssqlConfig::default().with_pool_size(0);
        let err = MssqlExecutor::connect(&config).await.err().expect("should fail");
        let storage: StorageError = err.into();
        assert!(matches!(storage, StorageError::Internal { .. }));
    }
}
