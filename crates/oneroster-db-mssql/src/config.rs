//! Configuration types for the SQL Server executor.

use serde::{Deserialize, Serialize};

/// Configuration for the SQL Server connection pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MssqlConfig {
    /// ADO.NET connection string:
    /// `server=tcp:host,1433;user=sa;password=...;database=oneroster`
    pub connection_string: String,

    /// Connection pool size (maximum number of connections).
    pub pool_size: u32,

    /// Time to wait for a pooled connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Idle timeout in milliseconds.
    pub idle_timeout_ms: Option<u64>,
}

impl Default for MssqlConfig {
    fn default() -> Self {
        Self {
            connection_string: "server=tcp:localhost,1433;database=oneroster;TrustServerCertificate=true"
                .into(),
            pool_size: 10,
            connect_timeout_ms: 5000,
            idle_timeout_ms: Some(300_000),
        }
    }
}

impl MssqlConfig {
    /// Creates a new configuration with the given ADO.NET connection string.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Builds the connection string from discrete settings.
    #[must_use]
    pub fn from_parts(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
        trust_server_certificate: bool,
    ) -> Self {
        Self::new(format!(
            "server=tcp:{host},{port};user={user};password={password};database={database};TrustServerCertificate={trust_server_certificate}"
        ))
    }

    /// Sets the pool size.
    #[must_use]
    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    #[must_use]
    pub fn with_connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.connect_timeout_ms = timeout;
        self
    }

    #[must_use]
    pub fn with_idle_timeout_ms(mut self, timeout: Option<u64>) -> Self {
        self.idle_timeout_ms = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MssqlConfig::default();
        assert!(config.connection_string.contains("database=oneroster"));
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.idle_timeout_ms, Some(300_000));
    }

    #[test]
    fn test_from_parts() {
        let config = MssqlConfig::from_parts("db", 1433, "sa", "pw", "roster", false)
            .with_pool_size(4)
            .with_connect_timeout_ms(1000)
            .with_idle_timeout_ms(None);
        assert_eq!(
            config.connection_string,
            "server=tcp:db,1433;user=sa;password=pw;database=roster;TrustServerCertificate=false"
        );
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.connect_timeout_ms, 1000);
        assert_eq!(config.idle_timeout_ms, None);
    }
}
