//! Status transition policy
//!
//! `Permissive` lets staff set any status at any time. `Strict` only allows
//! the next forward step, or `cancelled` from a non-terminal status.

use shared::models::OrderStatus;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    #[default]
    Permissive,
    Strict,
}

impl StatusPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusPolicy::Permissive => true,
            StatusPolicy::Strict => {
                if to == OrderStatus::Cancelled {
                    !from.is_terminal()
                } else {
                    from.next() == Some(to)
                }
            }
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(StatusPolicy::Permissive),
            "strict" => Ok(StatusPolicy::Strict),
            other => Err(format!("unknown order status policy: {other}")),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::Permissive => f.write_str("permissive"),
            StatusPolicy::Strict => f.write_str("strict"),
        }
    }
}
