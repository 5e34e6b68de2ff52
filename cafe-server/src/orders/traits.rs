//! Order engine collaborators and error type
//!
//! The engine only talks to the outside world through these traits so it
//! can run against SurrealDB in production and in-memory fakes in tests.

use async_trait::async_trait;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{MenuItem, Order, OrderStatus, OrderType, PaymentStatus};
use thiserror::Error;

use crate::db::repository::{RepoError, RepoResult};

// =============================================================================
// Collaborators
// =============================================================================

/// Read-only view of the menu
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn find_item_by_id(&self, id: &str) -> RepoResult<Option<MenuItem>>;

    /// Exact, case-sensitive name match
    async fn find_item_by_name(&self, name: &str) -> RepoResult<Option<MenuItem>>;
}

/// Order persistence
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order; a taken order number surfaces as `RepoError::Duplicate`
    async fn create(&self, order: &Order) -> RepoResult<()>;

    /// Replace an existing order
    async fn save(&self, order: &Order) -> RepoResult<()>;

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>>;

    /// Orders with `start <= createdAt < end`
    async fn count_created_between(&self, start: i64, end: i64) -> RepoResult<u64>;

    /// Atomically bump and return the sequence for `day`
    ///
    /// A counter that does not exist yet starts from `floor`, so the first
    /// number handed out is `floor + 1`.
    async fn next_daily_sequence(&self, day: &str, floor: u64) -> RepoResult<u64>;

    /// Filtered, sorted page plus the total number of matches
    async fn find_many(&self, query: &OrderQuery) -> RepoResult<(Vec<Order>, u64)>;

    /// Order count and summed `total` per status, computed by the store
    ///
    /// Statuses with no matching orders are absent.
    async fn totals_by_status(&self, filter: &OrderFilter) -> RepoResult<Vec<StatusTotals>>;
}

/// One `GROUP BY status` row
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusTotals {
    pub status: OrderStatus,
    pub count: u64,
    pub revenue: f64,
}

/// Source of the current time (Unix millis)
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        crate::utils::time::now_millis()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

// =============================================================================
// Queries
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive lower bound on `createdAt`
    pub created_from: Option<i64>,
    /// Exclusive upper bound on `createdAt`
    pub created_to: Option<i64>,
    /// Exact (lowercase) customer email
    pub customer_email: Option<String>,
    /// Case-insensitive substring of the customer email
    pub customer_email_contains: Option<String>,
}

impl OrderFilter {
    /// Does `order` satisfy every set criterion
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| order.status == s)
            && self.order_type.is_none_or(|t| order.order_type == t)
            && self.payment_status.is_none_or(|p| order.payment_status == p)
            && self.created_from.is_none_or(|from| order.created_at >= from)
            && self.created_to.is_none_or(|to| order.created_at < to)
            && self
                .customer_email
                .as_deref()
                .is_none_or(|email| order.customer.email == email)
            && self
                .customer_email_contains
                .as_deref()
                .is_none_or(|needle| {
                    order
                        .customer
                        .email
                        .to_lowercase()
                        .contains(&needle.to_lowercase())
                })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    Total,
    OrderNumber,
    Status,
}

impl OrderSortField {
    /// Stored field name
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Total => "total",
            Self::OrderNumber => "orderNumber",
            Self::Status => "status",
        }
    }
}

impl std::str::FromStr for OrderSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "total" => Ok(Self::Total),
            "orderNumber" => Ok(Self::OrderNumber),
            "status" => Ok(Self::Status),
            _ => Err("sortBy must be one of: createdAt, total, orderNumber, status".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub filter: OrderFilter,
    pub sort: OrderSortField,
    pub descending: bool,
    pub offset: u32,
    /// `None` returns every match
    pub limit: Option<u32>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            filter: OrderFilter::default(),
            sort: OrderSortField::CreatedAt,
            descending: true,
            offset: 0,
            limit: None,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Order engine errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Menu item not found: {0}")]
    ItemNotFound(String),

    #[error("Menu item is not available: {0}")]
    ItemUnavailable(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(msg) => OrderError::Conflict(msg),
            RepoError::Validation(msg) => OrderError::Validation(msg),
            RepoError::NotFound(msg) => OrderError::OrderNotFound(msg),
            RepoError::Database(msg) | RepoError::Retryable(msg) => OrderError::Storage(msg),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::ItemNotFound(item) => {
                AppError::with_message(ErrorCode::OrderItemNotFound, message)
                    .with_detail("item", item)
            }
            OrderError::ItemUnavailable(item) => {
                AppError::with_message(ErrorCode::OrderItemUnavailable, message)
                    .with_detail("item", item)
            }
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("id", id)
            }
            OrderError::InvalidStateTransition { from, to } => {
                AppError::with_message(ErrorCode::OrderInvalidTransition, message)
                    .with_detail("currentStatus", from.as_str())
                    .with_detail("requestedStatus", to.as_str())
            }
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Conflict(_) => AppError::with_message(ErrorCode::OrderNumberConflict, message),
            OrderError::Storage(msg) => AppError::database(msg),
        }
    }
}
