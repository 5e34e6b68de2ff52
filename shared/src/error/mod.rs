//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes
//! - [`ErrorCategory`]: classification of codes by range
//! - [`AppError`]: error with code, message and details
//! - [`ApiResponse`]: response envelope shared by success and failure
//!
//! # Example
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::OrderNotFound, "Order abc not found")
//!     .with_detail("id", "abc");
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(4001));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
