//! Aggregate order statistics

use rust_decimal::Decimal;
use shared::models::{OrderStats, OrderStatus};

use super::money::{checked_add, to_decimal, to_f64};
use super::traits::{OrderResult, StatusTotals};

/// Fold per-status counts and revenue into the summary
///
/// Revenue sums `total` over every order in the set regardless of status.
pub fn summarize(groups: &[StatusTotals]) -> OrderResult<OrderStats> {
    let mut revenue = Decimal::ZERO;
    let mut stats = OrderStats::default();

    for group in groups {
        stats.total_orders += group.count;
        revenue = checked_add(revenue, to_decimal(group.revenue)?)?;
        match group.status {
            OrderStatus::Pending => stats.pending_orders += group.count,
            OrderStatus::Completed => stats.completed_orders += group.count,
            OrderStatus::Cancelled => stats.cancelled_orders += group.count,
            _ => {}
        }
    }

    stats.total_revenue = to_f64(revenue)?;
    stats.average_order_value = if stats.total_orders == 0 {
        0.0
    } else {
        to_f64(revenue / Decimal::from(stats.total_orders))?
    };
    Ok(stats)
}
