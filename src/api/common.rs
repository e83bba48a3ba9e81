//! Common API utilities and shared types
//!
//! Paging parameters arrive from query strings and JSON bodies in all
//! shapes. The query types here never reject a request: anything that is
//! not a positive integer (or a string holding one) falls back to the
//! configured default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::models::{PageRequest, DEFAULT_PAGE};

// ============================================================================
// Lenient Number Parsing
// ============================================================================

/// Positive integer from a number or numeric string, `None` otherwise
pub fn positive_u64(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.filter(|n| *n > 0)
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(positive_u64(&value))
}

// ============================================================================
// Pagination Query Types
// ============================================================================

/// `page` / `pageSize` parameters for the generic paginator
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page_size: Option<u64>,
}

impl PaginationQuery {
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            config.cap(self.page_size.unwrap_or(config.default_page_size)),
        )
    }
}

/// `page` / `limit` parameters for table views
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LayPageQuery {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub limit: Option<u64>,
}

impl LayPageQuery {
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            config.cap(self.limit.unwrap_or(config.lay_page_limit)),
        )
    }
}
