//! Response types for the payroll engine API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the small JSON bodies returned
//! by payroll endpoints.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{PayrollItem, PayrollRun};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an authentication failure response.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a response from a status and body.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }

    /// 401 with an `UNAUTHORIZED` body.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiError::unauthorized(message))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::InvalidPeriod { .. } | EngineError::InvalidPeriodFormat { .. } => {
                ApiErrorResponse::new(
                    StatusCode::BAD_REQUEST,
                    ApiError::with_details(
                        "INVALID_PERIOD",
                        message,
                        "Periods are calendar months: year >= 1 and month 1-12",
                    ),
                )
            }
            EngineError::Validation { field, .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, format!("field: {field}")),
            ),
            EngineError::RunNotFound { .. } => {
                ApiErrorResponse::new(StatusCode::NOT_FOUND, ApiError::new("RUN_NOT_FOUND", message))
            }
            EngineError::EmployeeNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("EMPLOYEE_NOT_FOUND", message),
            ),
            EngineError::ItemNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("ITEM_NOT_FOUND", message),
            ),
            EngineError::Storage { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("STORAGE_ERROR", "Storage backend failure"),
            ),
            EngineError::Auth { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("AUTH_ERROR", "Authentication backend failure"),
            ),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
        }
    }
}

/// Body of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token.
    pub token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Body returned by the calculate endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalculateResponse {
    /// Number of items generated.
    pub calculated: usize,
}

/// A run together with its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunItemsResponse {
    /// The payroll run.
    pub run: PayrollRun,
    /// Items ordered by id.
    pub items: Vec<PayrollItem>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// Records in this page.
    pub data: Vec<T>,
    /// Matching records before paging.
    pub total: usize,
    /// Page size applied.
    pub limit: usize,
    /// Records skipped.
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_invalid_period_maps_to_bad_request() {
        let api_error: ApiErrorResponse = EngineError::InvalidPeriod {
            year: 2025,
            month: 13,
        }
        .into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.error.code, "INVALID_PERIOD");
        assert!(api_error.error.message.contains("2025-13"));
    }

    #[test]
    fn test_not_found_kinds_map_to_404() {
        for error in [
            EngineError::RunNotFound { run_id: 1 },
            EngineError::EmployeeNotFound { employee_id: 1 },
            EngineError::ItemNotFound { item_id: 1 },
        ] {
            let api_error: ApiErrorResponse = error.into();
            assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_storage_error_hides_backend_message() {
        let api_error: ApiErrorResponse =
            EngineError::storage("failed to list employees", "connection refused").into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.error.message.contains("connection refused"));
        assert!(api_error.error.details.is_none());
    }

    #[test]
    fn test_auth_error_maps_to_500() {
        let api_error: ApiErrorResponse =
            EngineError::auth("failed to sign token", "invalid key").into();
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.error.code, "AUTH_ERROR");
        assert!(!api_error.error.message.contains("invalid key"));
    }

    #[test]
    fn test_validation_names_field() {
        let api_error: ApiErrorResponse =
            EngineError::validation("base_salary", "must be >= 0").into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.error.details.as_deref(), Some("field: base_salary"));
    }
}
