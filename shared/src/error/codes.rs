//! Unified error codes
//!
//! Codes are grouped by range, see [`super::ErrorCategory`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application error code
///
/// Serialized as its numeric value so clients can match on it
/// independently of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    Unknown = 1,
    ValidationFailed = 2,
    NotFound = 3,
    AlreadyExists = 4,
    InvalidRequest = 5,
    InvalidFormat = 6,
    RequiredField = 7,
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    AccountLocked = 1006,
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    PermissionDenied = 2001,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// A line references a menu item that does not exist
    OrderItemNotFound = 4002,
    /// A line references a menu item that is switched off
    OrderItemUnavailable = 4003,
    OrderInvalidTransition = 4004,
    OrderNumberConflict = 4005,

    // ==================== 6xxx: Menu ====================
    MenuItemNotFound = 6001,

    // ==================== 8xxx: User ====================
    UserNotFound = 8001,
    UserEmailExists = 8002,
    PasswordMismatch = 8003,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    ConfigError = 9003,
    TimeoutError = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountLocked => {
                "Account is temporarily locked due to too many failed login attempts"
            }
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemNotFound => "Menu item not found",
            ErrorCode::OrderItemUnavailable => "Menu item is not available",
            ErrorCode::OrderInvalidTransition => "Order status change is not allowed",
            ErrorCode::OrderNumberConflict => "Order number already assigned",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UserEmailExists => "User already exists with this email",
            ErrorCode::PasswordMismatch => "Current password is incorrect",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an unknown u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1006 => Ok(ErrorCode::AccountLocked),
            1007 => Ok(ErrorCode::AccountDisabled),

            2001 => Ok(ErrorCode::PermissionDenied),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderItemNotFound),
            4003 => Ok(ErrorCode::OrderItemUnavailable),
            4004 => Ok(ErrorCode::OrderInvalidTransition),
            4005 => Ok(ErrorCode::OrderNumberConflict),

            6001 => Ok(ErrorCode::MenuItemNotFound),

            8001 => Ok(ErrorCode::UserNotFound),
            8002 => Ok(ErrorCode::UserEmailExists),
            8003 => Ok(ErrorCode::PasswordMismatch),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::AccountLocked.code(), 1006);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4004);
        assert_eq!(ErrorCode::MenuItemNotFound.code(), 6001);
        assert_eq!(ErrorCode::UserEmailExists.code(), 8002);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_covers_every_code() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::Unknown,
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidFormat,
            ErrorCode::RequiredField,
            ErrorCode::ValueOutOfRange,
            ErrorCode::NotAuthenticated,
            ErrorCode::InvalidCredentials,
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::AccountLocked,
            ErrorCode::AccountDisabled,
            ErrorCode::PermissionDenied,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderItemNotFound,
            ErrorCode::OrderItemUnavailable,
            ErrorCode::OrderInvalidTransition,
            ErrorCode::OrderNumberConflict,
            ErrorCode::MenuItemNotFound,
            ErrorCode::UserNotFound,
            ErrorCode::UserEmailExists,
            ErrorCode::PasswordMismatch,
            ErrorCode::InternalError,
            ErrorCode::DatabaseError,
            ErrorCode::ConfigError,
            ErrorCode::TimeoutError,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(1005), Err(InvalidErrorCode(1005)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::NotFound).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&ErrorCode::OrderNotFound).unwrap(),
            "4001"
        );
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("4003").unwrap();
        assert_eq!(code, ErrorCode::OrderItemUnavailable);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_and_message() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }
}
