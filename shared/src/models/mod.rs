//! Data models
//!
//! Shared between cafe-server and API clients. Field names are camelCase on
//! the wire, timestamps are Unix milliseconds, money is `f64` rounded to
//! two decimals.

pub mod menu_item;
pub mod order;
pub mod user;

// Re-exports
pub use menu_item::*;
pub use order::*;
pub use user::*;
