//! Client-related types shared between server and client
//!
//! Request/response bodies of the users API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot exceed 100 characters"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, max = 30, message = "Phone number is required"))]
    pub phone: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Login / registration response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Change password request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters long"))]
    pub new_password: String,
}
