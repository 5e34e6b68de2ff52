//! Order number assignment
//!
//! Format: `ORD` + `YYMMDD` (business time zone) + daily sequence padded to
//! at least three digits, e.g. `ORD240615007`.

use chrono::NaiveDate;

pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Human-facing order number for the `seq`-th order on `date`
pub fn format_order_number(date: NaiveDate, seq: u64) -> String {
    format!("{}{}{:03}", ORDER_NUMBER_PREFIX, date.format("%y%m%d"), seq)
}

/// Key of the per-day sequence counter
pub fn counter_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
