//! Input validation helpers

use validator::Validate;

use crate::utils::{AppError, AppResult};

/// Run derive-based validation and convert failures into a 400 `AppError`
pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(AppError::from)
}

/// Emails are stored trimmed and lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim a required text field, rejecting blank values
pub fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank to `None`
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
