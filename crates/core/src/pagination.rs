//! Page/page-size arithmetic shared by every paginated listing.

use serde::Serialize;

/// Page used when the caller omits `page` or passes a non-positive value.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller omits `page_size` or passes a non-positive value.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on `page_size`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Normalize raw query values, falling back to defaults and clamping the size.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Build the pagination block for a response given the total row count.
    pub fn paginate(&self, total: i64) -> Pagination {
        let total_page = if total <= 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        };
        Pagination {
            total,
            page: self.page,
            page_size: self.page_size,
            total_page,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_and_non_positive_values() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, page_size: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(-3)), PageRequest { page: 1, page_size: 10 });
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(PageRequest::new(Some(2), Some(10_000)).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_follows_page() {
        let req = PageRequest::new(Some(3), Some(25));
        assert_eq!(req.limit(), 25);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn total_page_rounds_up() {
        let req = PageRequest::new(Some(1), Some(10));
        assert_eq!(req.paginate(0).total_page, 0);
        assert_eq!(req.paginate(10).total_page, 1);
        assert_eq!(req.paginate(11).total_page, 2);
    }
}
