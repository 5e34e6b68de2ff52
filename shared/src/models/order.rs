//! Order Model
//!
//! Orders are snapshots: the customer block and each line's name and unit
//! price are copied at creation time and never follow later catalog or
//! account changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::menu_item::validate_not_blank;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!(
                        "{} must be one of: {}",
                        $label,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

wire_enum! {
    /// Order lifecycle status
    OrderStatus, "Status" {
        Pending => "pending",
        Confirmed => "confirmed",
        Preparing => "preparing",
        Ready => "ready",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

wire_enum! {
    OrderType, "Order type" {
        DineIn => "dine-in",
        Takeaway => "takeaway",
        Delivery => "delivery",
    }
}

wire_enum! {
    PaymentMethod, "Payment method" {
        Cash => "cash",
        Card => "card",
        Upi => "upi",
        Online => "online",
    }
}

wire_enum! {
    PaymentStatus, "Payment status" {
        Pending => "pending",
        Paid => "paid",
        Failed => "failed",
        Refunded => "refunded",
    }
}

impl OrderStatus {
    /// Completed and cancelled orders never move again under the strict policy
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Next step on the forward path, `None` for terminal states
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }
}

/// Named add-on with an additive price delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Customization {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(range(
        min = 0.0,
        max = 10000.0,
        message = "Customization price must be between 0 and 10000"
    ))]
    pub price: f64,
}

/// Customer snapshot captured at order time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 30, message = "Phone cannot exceed 30 characters")
    )]
    pub phone: String,
}

/// Persisted order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Resolved menu item id
    pub menu_item: String,
    /// Item name at order time
    pub name: String,
    pub quantity: u32,
    /// Unit price at order time
    pub price: f64,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub customization: Vec<Customization>,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer: CustomerInfo,
    pub items: Vec<OrderLine>,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Minutes
    #[serde(default)]
    pub estimated_preparation_time: Option<u32>,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Total number of units across all lines
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// One requested line; `menu_item` wins over `name` when both are given
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub menu_item: Option<String>,
    pub name: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Quantity must be between 1 and 99"))]
    pub quantity: u32,
    #[validate(length(max = 200, message = "Special instructions cannot exceed 200 characters"))]
    pub special_instructions: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub customization: Vec<Customization>,
}

/// Create order payload
///
/// Enum fields arrive as strings so an unknown value surfaces as a
/// validation failure with a readable message instead of a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    #[validate(nested)]
    pub customer: CustomerInfo,
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderLineRequest>,
    pub order_type: String,
    pub payment_method: String,
    #[validate(length(max = 500, message = "Special requests cannot exceed 500 characters"))]
    pub special_requests: Option<String>,
    #[validate(length(max = 300, message = "Notes cannot exceed 300 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusUpdate {
    pub payment_status: String,
}

/// Aggregate order statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub pending_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    pub average_order_value: f64,
}
