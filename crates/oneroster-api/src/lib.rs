use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Bearer challenge sent with 403 responses (RFC 6750, section 3.1).
const INSUFFICIENT_SCOPE_CHALLENGE: &str = r#"Bearer error="insufficient_scope""#;

/// IMS Global status payload returned for rejected queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImsxStatus {
    #[serde(rename = "imsx_codeMajor")]
    pub code_major: String,
    #[serde(rename = "imsx_severity")]
    pub severity: String,
    #[serde(rename = "imsx_description")]
    pub description: String,
    #[serde(rename = "imsx_CodeMinor")]
    pub code_minor: String,
}

impl ImsxStatus {
    pub fn failure(description: impl Into<String>, code_minor: impl Into<String>) -> Self {
        Self {
            code_major: "failure".to_string(),
            severity: "error".to_string(),
            description: description.into(),
            code_minor: code_minor.into(),
        }
    }
}

/// Errors surfaced by the roster endpoints, mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{description}")]
    InvalidSelectionField { description: String },
    #[error("{description}")]
    InvalidFilterField { description: String },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found")]
    NotFound,
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_selection_field(description: impl Into<String>) -> Self {
        Self::InvalidSelectionField {
            description: description.into(),
        }
    }
    pub fn invalid_filter_field(description: impl Into<String>) -> Self {
        Self::InvalidFilterField {
            description: description.into(),
        }
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidSelectionField { .. } | ApiError::InvalidFilterField { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Response body. Internal details never leave the process.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            ApiError::InvalidSelectionField { description } => {
                imsx_body(description, "invalid_selection_field")
            }
            ApiError::InvalidFilterField { description } => {
                imsx_body(description, "invalid_filter_field")
            }
            ApiError::Forbidden(message) => json!({ "message": message }),
            ApiError::NotFound => json!({ "error": "Not found" }),
            ApiError::Internal(_) => json!({ "error": "Internal Server Error" }),
        }
    }
}

fn imsx_body(description: &str, code_minor: &str) -> serde_json::Value {
    serde_json::to_value(ImsxStatus::failure(description, code_minor))
        .unwrap_or_else(|_| json!({ "error": "Internal Server Error" }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ApiResponse::new(self.to_body(), self.status_code());
        match self {
            ApiError::Forbidden(_) => response
                .with_header(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(INSUFFICIENT_SCOPE_CHALLENGE),
                )
                .into_response(),
            _ => response.into_response(),
        }
    }
}

/// JSON response with a status code and optional extra headers.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self {
            value,
            status,
            headers: Vec::new(),
        }
    }

    pub fn ok(value: T) -> Self {
        Self::new(value, StatusCode::OK)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let (status, body) = match serde_json::to_vec(&self.value) {
            Ok(b) => (self.status, b),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal Server Error"}"#.to_vec(),
            ),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        for (n, v) in self.headers {
            headers.insert(n, v);
        }

        (status, headers, body).into_response()
    }
}


#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn api_response_ok_sets_status_and_content_type() {
        let resp = ApiResponse::ok(json!({ "users": [] })).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            &HeaderValue::from_static("application/json")
        );
    }

    #[test]
    fn api_response_can_add_headers() {
        let resp = ApiResponse::ok(json!({}))
            .with_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            )
            .into_response();
        assert_eq!(
            resp.headers().get("x-request-id").unwrap(),
            &HeaderValue::from_static("abc")
        );
    }
}
