//! Pagination models
//!
//! This module provides:
//! - `PageRequest` (1-indexed page plus page size)
//! - `PageResult` with page metadata for the generic paginator
//! - `CountedPage` for the count + offset/limit paginator

use serde::{Deserialize, Serialize};

use super::Row;

/// Default page number (1-indexed)
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size for the generic paginator
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Default limit for the count + offset/limit paginator
pub const DEFAULT_LAY_PAGE_LIMIT: u64 = 10;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: u64,
    /// Number of items per page
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create new pagination parameters. No validation happens here; the
    /// paginator rejects a zero page or page size.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Calculate the offset for offset/limit queries
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Number of pages needed for `total` rows, `page_size` rows each.
///
/// `page_size` must be non-zero.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    let mut pages = total / page_size;
    if total % page_size != 0 {
        pages += 1;
    }
    pages
}

/// Page of rows with metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T = Row> {
    /// Total number of rows across all pages
    pub total: u64,
    /// Number of pages
    pub total_page: u64,
    /// Requested page (1-indexed)
    pub current_page: u64,
    /// Rows of the current page
    #[serde(rename = "data")]
    pub rows: Vec<T>,
    /// Whether a page after `current_page` exists
    pub has_next_page: bool,
}

impl<T> PageResult<T> {
    /// Assemble a result, deriving page count and next-page flag
    pub fn new(total: u64, request: PageRequest, rows: Vec<T>) -> Self {
        let total_page = total_pages(total, request.page_size);
        Self {
            total,
            total_page,
            current_page: request.page,
            rows,
            has_next_page: request.page < total_page,
        }
    }

    /// Check if there is a previous page
    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    /// Check if the current page is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert the rows while keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            total: self.total,
            total_page: self.total_page,
            current_page: self.current_page,
            rows: self.rows.into_iter().map(f).collect(),
            has_next_page: self.has_next_page,
        }
    }
}

/// Rows of one page plus the filter's total count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountedPage {
    pub count: u64,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
}
