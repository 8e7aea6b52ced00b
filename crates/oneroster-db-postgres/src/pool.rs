//! Connection pool for the PostgreSQL executor.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, PgPool, Postgres};
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, Result};

/// Opens a pool of read-only UTC sessions.
///
/// # Errors
///
/// Fails on invalid pool bounds, an unparsable URL, or when the first
/// connection cannot be established within `connect_timeout_ms`.
#[instrument(skip(config), fields(url = %mask_password(&config.url)))]
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    config.validate()?;
    let connect_options = connect_options(config)?;

    info!(
        pool_size = config.pool_size,
        min_connections = config.min_connections,
        statement_timeout_ms = ?config.statement_timeout_ms,
        "Creating PostgreSQL connection pool"
    );

    let pool = PoolOptions::<Postgres>::new()
        .max_connections(config.pool_size)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
        .idle_timeout(config.idle_timeout_ms.map(Duration::from_millis))
        .max_lifetime(config.max_lifetime_secs.map(Duration::from_secs))
        .connect_with(connect_options)
        .await?;

    debug!("PostgreSQL connection pool ready");
    Ok(pool)
}

/// Parses the URL and attaches the application name and session settings.
pub(crate) fn connect_options(config: &PostgresConfig) -> Result<PgConnectOptions> {
    let options = config
        .url
        .parse::<PgConnectOptions>()
        .map_err(PostgresError::from)?
        .application_name(&config.application_name)
        .options(config.session_settings());
    Ok(options)
}

/// Round trip used by the health check.
#[instrument(skip(pool))]
pub async fn test_connection(pool: &PgPool) -> Result<()> {
    sqlx_core::query::query("SELECT 1").execute(pool).await?;
    debug!("PostgreSQL connection test succeeded");
    Ok(())
}

/// Replaces the password in a connection URL for logging.
pub(crate) fn mask_password(url: &str) -> String {
    let scheme_end = url.find("://").map_or(0, |p| p + 3);
    match url.rfind('@') {
        Some(at) => match url[scheme_end..at].find(':') {
            Some(colon) => {
                let colon = scheme_end + colon;
                format!("{}:****{}", &url[..colon], &url[at..])
            }
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
