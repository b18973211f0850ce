// Error handling module for the analytics API
// Maps module errors to HTTP responses with one JSON error shape

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use crate::analytics::AnalyticsError;
use crate::insights::InsightError;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Request is well-formed but unusable
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Database operation errors
    /// Maps to HTTP 500; details are logged, never returned
    DatabaseError(sqlx::Error),

    /// Internal server errors
    /// Maps to HTTP 500; details are logged, never returned
    InternalError(String),
}

/// Consistent error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    pub error_code: String,

    pub message: String,

    /// Field-level validation errors, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert to status code and response body
    ///
    /// Client errors are logged at debug, server errors at error.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                let mut response = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed");
                response.details =
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})));
                (StatusCode::BAD_REQUEST, response)
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("BAD_REQUEST", message.clone()),
                )
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {:?}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("DATABASE_ERROR", "A database error occurred"),
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred"),
                )
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(error: AnalyticsError) -> Self {
        match error {
            AnalyticsError::DatabaseError(e) => ApiError::DatabaseError(e),
            AnalyticsError::InvalidIdentity(message) => ApiError::BadRequest(message),
        }
    }
}

impl From<InsightError> for ApiError {
    fn from(error: InsightError) -> Self {
        match error {
            InsightError::DatabaseError(e) => ApiError::DatabaseError(e),
            InsightError::Source(e) => e.into(),
            InsightError::CorruptRow(message) => ApiError::InternalError(message),
        }
    }
}
