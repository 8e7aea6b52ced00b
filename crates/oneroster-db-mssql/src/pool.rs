//! Connection pool management for the SQL Server executor.

use std::time::Duration;

use bb8_tiberius::ConnectionManager;
use tracing::{debug, info, instrument};

use crate::config::MssqlConfig;
use crate::error::{MssqlError, Result};

/// Pool of tiberius clients.
pub type MssqlPool = bb8::Pool<ConnectionManager>;

/// Creates a new SQL Server connection pool from the given configuration.
#[instrument(skip(config), fields(connection = %mask_password(&config.connection_string)))]
pub async fn create_pool(config: &MssqlConfig) -> Result<MssqlPool> {
    if config.pool_size == 0 {
        return Err(MssqlError::config("pool_size must be greater than 0"));
    }

    info!(
        pool_size = config.pool_size,
        connect_timeout_ms = config.connect_timeout_ms,
        idle_timeout_ms = ?config.idle_timeout_ms,
        "Creating SQL Server connection pool"
    );

    let tds_config = tiberius::Config::from_ado_string(&config.connection_string)?;
    let manager = ConnectionManager::new(tds_config);

    let pool = bb8::Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(Duration::from_millis(config.connect_timeout_ms))
        .idle_timeout(config.idle_timeout_ms.map(Duration::from_millis))
        .build(manager)
        .await?;

    debug!("SQL Server connection pool created successfully");

    Ok(pool)
}

/// Tests the connection to the database.
#[instrument(skip(pool))]
pub async fn test_connection(pool: &MssqlPool) -> Result<()> {
    let mut conn = pool.get().await?;
    conn.simple_query("SELECT 1").await?.into_results().await?;

    debug!("Database connection test successful");

    Ok(())
}

/// Masks `password`/`pwd` values in an ADO.NET connection string for logging.
pub(crate) fn mask_password(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _))
                if key.trim().eq_ignore_ascii_case("password")
                    || key.trim().eq_ignore_ascii_case("pwd") =>
            {
                format!("{key}=****")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("server=tcp:db,1433;user=sa;password=secret;database=x"),
            "server=tcp:db,1433;user=sa;password=****;database=x"
        );
        assert_eq!(
            mask_password("Server=db;PWD=secret"),
            "Server=db;PWD=****"
        );
        assert_eq!(mask_password("server=db"), "server=db");
    }

    #[tokio::test]
    async fn test_create_pool_rejects_zero_size() {
        let config = MssqlConfig::default().with_pool_size(0);
        let err = assert_err!(create_pool(&config).await);
        assert!(matches!(err, MssqlError::Config { .. }));
    }
}
