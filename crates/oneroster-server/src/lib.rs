pub mod config;
pub mod handlers;
pub mod mapping;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{
    AppConfig, AuthSettings, LoggingConfig, MssqlStorageConfig, PostgresStorageConfig,
    QuerySettings, ServerConfig, StorageConfig,
};
pub use observability::init_tracing;
pub use server::{AppState, OneRosterServer, ROSTERING_BASE_PATH, ServerBuilder, build_app};
