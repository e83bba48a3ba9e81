//! Data models
//!
//! This module contains the value types shared by the data sources, the
//! paginator and the hierarchy assembler:
//! - `Row` and its canonical string form
//! - `Filter` predicates forwarded to data sources
//! - Pagination requests and results

mod filter;
mod page;
mod row;

pub use filter::Filter;
pub use page::{
    total_pages, CountedPage, PageRequest, PageResult, DEFAULT_LAY_PAGE_LIMIT, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE,
};
pub use row::{canonical_form_of, row_from, CanonicalForm, Row};
