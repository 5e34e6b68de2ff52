//! Error types and API response structures

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    // ==================== Menu / user ====================

    pub fn menu_item_not_found(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_message(ErrorCode::MenuItemNotFound, format!("Menu item {id} not found"))
            .with_detail("id", id)
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
    }

    pub fn email_exists(email: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::UserEmailExists, "User with this email already exists")
            .with_detail("email", email.into())
    }

    /// `lock_until`: Unix millis when the lock expires
    pub fn account_locked(lock_until: i64) -> Self {
        Self::with_message(
            ErrorCode::AccountLocked,
            "Account is temporarily locked due to too many failed login attempts",
        )
        .with_detail("lockUntil", lock_until)
    }

    pub fn account_disabled() -> Self {
        Self::with_message(ErrorCode::AccountDisabled, "Account is deactivated")
    }

    pub fn password_mismatch() -> Self {
        Self::with_message(ErrorCode::PasswordMismatch, "Current password is incorrect")
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();

        let summary = errors.to_string().replace('\n', "; ");
        AppError::validation(summary).with_detail("fields", fields)
    }
}

/// Unified API response structure
///
/// - `code`: error code (0 for success)
/// - `message`: human-readable message
/// - `data`: response payload (on success)
/// - `details`: additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(0),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.http_status();
        let body = ApiResponse::<()>::error(&self);

        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        (status, Json(body)).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = match self.code {
            None | Some(0) => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };

        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "email")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "email");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::not_found("Menu item");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Menu item not found");
        assert!(err.details.as_ref().unwrap().contains_key("resource"));

        assert_eq!(AppError::not_authenticated().code, ErrorCode::NotAuthenticated);
        assert_eq!(AppError::forbidden("nope").code, ErrorCode::PermissionDenied);
        assert_eq!(AppError::database("down").code, ErrorCode::DatabaseError);
        assert_eq!(
            AppError::invalid_credentials().http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_account_errors() {
        let locked = AppError::account_locked(1_718_409_600_000);
        assert_eq!(locked.http_status(), StatusCode::LOCKED);
        assert_eq!(locked.details.unwrap()["lockUntil"], 1_718_409_600_000i64);

        assert_eq!(AppError::account_disabled().http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::email_exists("ana@example.com").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::menu_item_not_found("m-1").message,
            "Menu item m-1 not found"
        );
        assert_eq!(AppError::password_mismatch().code.code(), 8003);
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(range(min = 1))]
        quantity: u32,
    }

    #[test]
    fn test_from_validation_errors_lists_fields() {
        let sample = Sample {
            email: "not-an-email".to_string(),
            quantity: 0,
        };
        let err: AppError = sample.validate().unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let details = err.details.unwrap();
        assert_eq!(
            details.get("fields").unwrap(),
            &serde_json::json!(["email", "quantity"])
        );
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, Some(0));
        assert_eq!(response.message, "OK");
        assert_eq!(response.data, Some(42));
        assert!(response.details.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let err = AppError::new(ErrorCode::OrderNotFound).with_detail("id", "abc");
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(4001));
        assert_eq!(response.message, "Order not found");
        assert!(response.data.is_none());
        assert!(response.details.is_some());
    }

    #[test]
    fn test_api_response_serialize() {
        let response = ApiResponse::success("hello");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":0"));
        assert!(json.contains("\"message\":\"OK\""));
        assert!(json.contains("\"data\":\"hello\""));
        assert!(!json.contains("details"));
    }
}
