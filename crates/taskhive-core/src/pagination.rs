//! Pagination clamping and page-count math shared by list endpoints.

use crate::defaults::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// Clamped pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number, always >= 1.
    pub page: i64,
    /// Page size, always in [1, MAX_PAGE_LIMIT].
    pub limit: i64,
}

impl Pagination {
    /// Clamp raw client-supplied values. Missing values take defaults; out of
    /// range values are clamped rather than rejected.
    pub fn clamp(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    /// Row offset for the current page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Total page count for `total` matching rows: ceil(total / limit).
    pub fn pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}
