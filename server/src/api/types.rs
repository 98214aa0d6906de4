//! Shared API types
//!
//! Error envelope, pagination validators and the helpers list endpoints use
//! to turn query strings into filter values.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationError;

use crate::core::constants::{DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT};
use crate::data::query::{ClassifiedError, PaginationMeta};
use crate::utils::time::is_iso_datetime;

/// Validator function for page parameter
pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::new("page_min").with_message("Page must be >= 1".into()));
    }
    Ok(())
}

/// Validator function for limit parameter
pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ValidationError::new("limit_range")
            .with_message(format!("Limit must be between 1 and {}", MAX_LIMIT).into()));
    }
    Ok(())
}

/// Validator function for `from_timestamp` / `to_timestamp`
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || is_iso_datetime(value) {
        return Ok(());
    }
    Err(ValidationError::new("timestamp_format").with_message(
        format!(
            "Invalid timestamp '{}': use ISO 8601 (YYYY-MM-DD or YYYY-MM-DDThh:mm:ss)",
            value
        )
        .into(),
    ))
}

pub fn default_page() -> u32 {
    DEFAULT_PAGE
}

pub fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Split a comma-separated query value into trimmed, non-empty items
pub fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    value.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Short error title
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable detail
    pub message: String,
}

/// List response body, as documented
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub success: bool,
    /// Table rows, column name to value
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
    pub pagination: PaginationMeta,
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    /// A classified store failure from the list executor
    Store(ClassifiedError),
    Internal {
        error: String,
        code: String,
        message: String,
    },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(
        error: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Internal {
            error: error.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ClassifiedError> for ApiError {
    fn from(err: ClassifiedError) -> Self {
        Self::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, code, message) = match self {
            Self::BadRequest { code, message } => (
                StatusCode::BAD_REQUEST,
                "Bad request".to_string(),
                code,
                message,
            ),
            Self::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, "Not found".to_string(), code, message)
            }
            Self::Store(err) => (
                StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.error.to_string(),
                err.code.to_string(),
                err.message,
            ),
            Self::Internal {
                error,
                code,
                message,
            } => (StatusCode::INTERNAL_SERVER_ERROR, error, code, message),
        };
        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                code,
                message,
            }),
        )
            .into_response()
    }
}
