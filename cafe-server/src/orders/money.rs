//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` (rounded to 2 decimal places) for storage/serialization. Every step
//! is checked: an amount outside `Decimal` range is a validation failure,
//! never a silent zero or a panic.

use rust_decimal::prelude::*;
use shared::models::{Customization, OrderType};

use super::traits::{OrderError, OrderResult};

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Flat tax rate applied to the subtotal (5%)
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Delivery surcharge (2.00)
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(200, 0, 0, false, 2);

fn out_of_range(value: impl std::fmt::Display) -> OrderError {
    OrderError::Validation(format!("Amount {value} is out of range"))
}

fn overflow() -> OrderError {
    OrderError::Validation("Order amount is too large".to_string())
}

/// Convert f64 to Decimal for calculation
pub fn to_decimal(value: f64) -> OrderResult<Decimal> {
    if !value.is_finite() {
        return Err(out_of_range(value));
    }
    Decimal::from_f64(value).ok_or_else(|| out_of_range(value))
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
pub fn to_f64(value: Decimal) -> OrderResult<f64> {
    round_money(value).to_f64().ok_or_else(|| out_of_range(value))
}

#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an f64 amount to cents (used for catalog prices on write)
pub fn round_price(value: f64) -> OrderResult<f64> {
    to_f64(to_decimal(value)?)
}

pub fn checked_add(a: Decimal, b: Decimal) -> OrderResult<Decimal> {
    a.checked_add(b).ok_or_else(overflow)
}

/// `unit_price × quantity + Σ customization deltas`
///
/// Customization deltas are added once per line, not per unit.
pub fn line_total(
    unit_price: f64,
    quantity: u32,
    customization: &[Customization],
) -> OrderResult<Decimal> {
    let mut total = to_decimal(unit_price)?
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(overflow)?;
    for extra in customization {
        total = checked_add(total, to_decimal(extra.price)?)?;
    }
    Ok(total)
}

/// Header amounts of an order, already rounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals from the line subtotal and the order type
    pub fn compute(raw_subtotal: Decimal, order_type: OrderType) -> OrderResult<Self> {
        let subtotal = round_money(raw_subtotal);
        let tax = round_money(subtotal.checked_mul(TAX_RATE).ok_or_else(overflow)?);
        let delivery_fee = if order_type == OrderType::Delivery {
            DELIVERY_FEE
        } else {
            Decimal::ZERO
        };
        Ok(Self {
            subtotal,
            tax,
            delivery_fee,
            total: checked_add(checked_add(subtotal, tax)?, delivery_fee)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra(name: &str, price: f64) -> Customization {
        Customization {
            name: name.to_string(),
            price,
        }
    }

    fn cents(value: Decimal) -> f64 {
        to_f64(value).unwrap()
    }

    #[test]
    fn test_to_decimal_precision() {
        // 0.1 + 0.2 != 0.3 in f64
        let sum_dec = to_decimal(0.1).unwrap() + to_decimal(0.2).unwrap();
        assert_eq!(cents(sum_dec), 0.3);
    }

    #[test]
    fn test_unrepresentable_amounts_rejected() {
        assert!(matches!(to_decimal(f64::NAN), Err(OrderError::Validation(_))));
        assert!(matches!(to_decimal(f64::INFINITY), Err(OrderError::Validation(_))));
        assert!(matches!(to_decimal(1e29), Err(OrderError::Validation(_))));
        assert!(round_price(1e29).is_err());
    }

    #[test]
    fn test_round_price_to_cents() {
        assert_eq!(round_price(3.456).unwrap(), 3.46);
        assert_eq!(round_price(4.254).unwrap(), 4.25);
        assert_eq!(round_price(2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_line_total_adds_customization_once() {
        let total =
            line_total(4.25, 2, &[extra("Oat milk", 0.5), extra("Extra shot", 0.75)]).unwrap();
        assert_eq!(cents(total), 9.75);
    }

    #[test]
    fn test_line_total_overflow_is_validation() {
        let huge = [extra("Gold", 5e28), extra("Platinum", 5e28)];
        assert!(matches!(
            line_total(1.0, 1, &huge),
            Err(OrderError::Validation(_))
        ));
        assert!(line_total(7e28, u32::MAX, &[]).is_err());
    }

    #[test]
    fn test_totals_overflow_is_validation() {
        assert!(OrderTotals::compute(Decimal::MAX, OrderType::Delivery).is_err());
    }

    #[test]
    fn test_dine_in_totals() {
        let raw = line_total(3.50, 2, &[]).unwrap();
        let totals = OrderTotals::compute(raw, OrderType::DineIn).unwrap();
        assert_eq!(cents(totals.subtotal), 7.00);
        assert_eq!(cents(totals.tax), 0.35);
        assert_eq!(cents(totals.delivery_fee), 0.0);
        assert_eq!(cents(totals.total), 7.35);
    }

    #[test]
    fn test_delivery_totals() {
        let raw = line_total(3.50, 2, &[]).unwrap();
        let totals = OrderTotals::compute(raw, OrderType::Delivery).unwrap();
        assert_eq!(cents(totals.delivery_fee), 2.00);
        assert_eq!(cents(totals.total), 9.35);
    }

    #[test]
    fn test_tax_is_rounded_subtotal_share() {
        // 3.33 * 0.05 = 0.1665 -> 0.17
        let totals = OrderTotals::compute(to_decimal(3.33).unwrap(), OrderType::Takeaway).unwrap();
        assert_eq!(cents(totals.tax), 0.17);
        assert_eq!(cents(totals.total), 3.50);
        assert!(totals.total >= totals.subtotal);
    }

    #[test]
    fn test_many_small_lines_do_not_drift() {
        let mut raw = Decimal::ZERO;
        for _ in 0..1000 {
            raw = checked_add(raw, line_total(0.01, 1, &[]).unwrap()).unwrap();
        }
        let totals = OrderTotals::compute(raw, OrderType::DineIn).unwrap();
        assert_eq!(cents(totals.subtotal), 10.0);
        assert_eq!(cents(totals.tax), 0.5);
    }
}
