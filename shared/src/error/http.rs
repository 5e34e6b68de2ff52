//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::MenuItemNotFound | Self::UserNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict
            Self::AlreadyExists | Self::UserEmailExists | Self::OrderNumberConflict => {
                StatusCode::CONFLICT
            }

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 423 Locked
            Self::AccountLocked => StatusCode::LOCKED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AccountDisabled => StatusCode::FORBIDDEN,

            // 503 Service Unavailable
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation and business rule errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::MenuItemNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_order_line_errors_are_bad_request() {
        assert_eq!(
            ErrorCode::OrderItemNotFound.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::OrderItemUnavailable.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::OrderInvalidTransition.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_status() {
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::AccountLocked.http_status(), StatusCode::LOCKED);
        assert_eq!(
            ErrorCode::AccountDisabled.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::UserEmailExists.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::OrderNumberConflict.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_system_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::TimeoutError.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_validation_default() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PasswordMismatch.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
