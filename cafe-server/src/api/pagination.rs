//! 分页与排序参数

use crate::utils::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
}

impl PageWindow {
    /// `page >= 1`, `1 <= limit <= 100`
    pub fn parse(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);

        if page == 0 {
            return Err(AppError::validation("Page must be a positive integer"));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "Limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// `sortOrder`: `asc` | `desc`, falls back to `default_desc`
pub fn parse_descending(sort_order: Option<&str>, default_desc: bool) -> AppResult<bool> {
    match sort_order {
        None => Ok(default_desc),
        Some("asc") => Ok(false),
        Some("desc") => Ok(true),
        Some(_) => Err(AppError::validation("sortOrder must be one of: asc, desc")),
    }
}

/// Parse an optional query value with the type's `FromStr` message
pub fn parse_optional<T>(value: Option<&str>) -> AppResult<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(AppError::validation))
        .transpose()
}
