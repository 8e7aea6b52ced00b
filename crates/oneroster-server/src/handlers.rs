use axum::{
    Extension, Json,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use oneroster_api::{ApiError, ApiResponse};
use oneroster_query::scope::insufficient_scope_message;
use oneroster_query::{Endpoint, GrantedScopes, QueryRequest, ResultShaper};
use serde::Serialize;
use serde_json::{Value, json};

use crate::mapping::api_error;
use crate::server::{AppState, ROSTERING_BASE_PATH};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Discovery document pointing at the rostering API.
pub async fn root(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let base = state.base_url.clone().unwrap_or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(|host| format!("http://{host}"))
            .unwrap_or_default()
    });
    let body = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "urls": {
            "dataManagementApi": format!("{}{ROSTERING_BASE_PATH}/", base.trim_end_matches('/')),
        },
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Database round trip; 503 when the pool cannot serve `SELECT 1`.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "pass" }))),
        Err(e) => {
            tracing::warn!(error = %e, backend = state.service.backend_name(), "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "fail", "error": "database unreachable" })),
            )
        }
    }
}

pub async fn list_resources(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    RawQuery(query): RawQuery,
    scopes: Option<Extension<GrantedScopes>>,
) -> Result<ApiResponse<Value>, ApiError> {
    let endpoint = Endpoint::from_path(&endpoint).ok_or(ApiError::NotFound)?;
    authorize(&state, endpoint, scopes.as_deref())?;

    let request = QueryRequest::from_query(query.as_deref().unwrap_or_default(), state.limits);
    let records = state
        .service
        .query_many(endpoint, &request)
        .await
        .map_err(api_error)?;

    Ok(ApiResponse::ok(ResultShaper::wrap_many(endpoint, records)))
}

pub async fn read_resource(
    State(state): State<AppState>,
    Path((endpoint, sourced_id)): Path<(String, String)>,
    scopes: Option<Extension<GrantedScopes>>,
) -> Result<ApiResponse<Value>, ApiError> {
    let endpoint = Endpoint::from_path(&endpoint).ok_or(ApiError::NotFound)?;
    authorize(&state, endpoint, scopes.as_deref())?;

    let record = state
        .service
        .query_one(endpoint, &sourced_id)
        .await
        .map_err(api_error)?
        .ok_or(ApiError::NotFound)?;

    Ok(ApiResponse::ok(ResultShaper::wrap_one(endpoint, record)))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// A missing `GrantedScopes` extension counts as no scopes at all.
fn authorize(
    state: &AppState,
    endpoint: Endpoint,
    scopes: Option<&GrantedScopes>,
) -> Result<(), ApiError> {
    if !state.auth.enforce_scopes {
        return Ok(());
    }
    let resource = endpoint.resource();
    if scopes.is_some_and(|s| s.allows(resource)) {
        return Ok(());
    }
    tracing::debug!(endpoint = %endpoint, "Rejected request without required scope");
    Err(ApiError::forbidden(insufficient_scope_message(resource)))
}
