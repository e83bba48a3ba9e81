//! API layer - axum adapters
//!
//! This module turns the services into HTTP building blocks:
//! - response envelopes (`{code, msg, data}` and the table form)
//! - `ApiError`, which maps service errors onto envelope codes
//! - lenient paging query types
//! - validating `Query` / `Json` extractors
//!
//! It ships no routes; applications mount their own handlers.

pub mod common;
pub mod extract;
pub mod responses;

pub use common::{positive_u64, LayPageQuery, PaginationQuery};
pub use extract::{first_message, ValidatedJson, ValidatedQuery};
pub use responses::{
    ApiError, ApiResponse, LayuiResponse, LOGIC_ERROR, MSG_FAIL, MSG_SERVER_ERROR, MSG_SUCCESS,
    SERVER_ERROR, SUCCESS,
};
