use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use oneroster_db_mssql::MssqlExecutor;
use oneroster_db_postgres::PostgresExecutor;
use oneroster_query::{DialectKind, EndpointConfigRegistry, PageLimits, QueryService};
use oneroster_storage::DynExecutor;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::{AppConfig, AuthSettings};
use crate::{handlers, middleware as app_middleware};

/// Mount point of the OneRoster 1.2 rostering service.
pub const ROSTERING_BASE_PATH: &str = "/ims/oneroster/rostering/v1p2";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
    pub auth: AuthSettings,
    pub limits: PageLimits,
    pub base_url: Option<String>,
}

impl AppState {
    pub fn new(service: QueryService, cfg: &AppConfig) -> Self {
        Self {
            service: Arc::new(service),
            auth: cfg.auth.clone(),
            limits: cfg.query.page_limits(),
            base_url: cfg.server.base_url.clone(),
        }
    }
}

pub struct OneRosterServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let rostering = Router::new()
        .route("/{endpoint}", get(handlers::list_resources))
        .route("/{endpoint}/{sourced_id}", get(handlers::read_resource));

    Router::new()
        // Health and discovery endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/health-check", get(handlers::health_check))
        .nest(ROSTERING_BASE_PATH, rostering)
        .fallback(handlers::not_found)
        .with_state(state)
        // Outermost first: request id is assigned before the trace span is created
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout)),
        )
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    executor: Option<DynExecutor>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            executor: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses the given executor instead of connecting to the configured backend.
    pub fn with_executor(mut self, executor: DynExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub async fn build(self) -> anyhow::Result<OneRosterServer> {
        EndpointConfigRegistry::validate().context("endpoint registry is inconsistent")?;

        let executor = match self.executor {
            Some(executor) => executor,
            None => connect_executor(&self.config).await?,
        };

        let backend = self.config.storage.backend;
        let service =
            QueryService::new(executor, backend).with_schema(self.config.storage.schema.clone());
        tracing::info!(
            backend = %backend,
            schema = %self.config.storage.schema,
            enforce_scopes = self.config.auth.enforce_scopes,
            "Query service ready"
        );

        let state = AppState::new(service, &self.config);
        let app = build_app(state, self.config.request_timeout());

        Ok(OneRosterServer {
            addr: self.addr,
            app,
        })
    }
}

/// Connects to whichever backend `storage.backend` selects.
async fn connect_executor(cfg: &AppConfig) -> anyhow::Result<DynExecutor> {
    let executor: DynExecutor = match cfg.storage.backend {
        DialectKind::Postgres => {
            let pg = cfg
                .storage
                .postgres
                .as_ref()
                .context("storage.postgres config is required")?;
            Arc::new(PostgresExecutor::connect(&pg.pool_config()).await?)
        }
        DialectKind::Mssql => {
            let ms = cfg
                .storage
                .mssql
                .as_ref()
                .context("storage.mssql config is required")?;
            Arc::new(MssqlExecutor::connect(&ms.pool_config()).await?)
        }
    };
    Ok(executor)
}

impl OneRosterServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
