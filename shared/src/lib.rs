//! Shared types for the café backend
//!
//! Domain models, error codes, the API response envelope and pagination
//! types used by the server and its clients.

pub mod client;
pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use response::{Paginated, Pagination};
