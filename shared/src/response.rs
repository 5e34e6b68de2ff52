//! Pagination types
//!
//! List endpoints wrap their rows in [`Paginated`] and return it inside the
//! usual [`crate::error::ApiResponse`] envelope.

use serde::{Deserialize, Serialize};

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page number (1-based)
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(per_page as u64) as u32
        };
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: per_page,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page, per_page, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_pages() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(!p.has_prev_page);

        let p = Pagination::new(3, 20, 45);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn test_pagination_camel_case() {
        let json = serde_json::to_value(Pagination::new(2, 10, 11)).unwrap();
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["totalItems"], 11);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["hasNextPage"], false);
        assert_eq!(json["hasPrevPage"], true);
    }
}
