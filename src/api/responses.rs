//! Response envelopes
//!
//! Every endpoint answers with HTTP 200 and a JSON envelope whose `code`
//! carries the outcome:
//! - `0` success
//! - `50001` server error (details are logged, never sent)
//! - `50002` logic error (the message is meant for the caller)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Display;

use crate::models::{CountedPage, Row};
use crate::services::{HierarchyError, PaginationError};

// ============================================================================
// Codes and Messages
// ============================================================================

pub const SUCCESS: i32 = 0;
pub const SERVER_ERROR: i32 = 50001;
pub const LOGIC_ERROR: i32 = 50002;

pub const MSG_SUCCESS: &str = "操作成功";
pub const MSG_FAIL: &str = "操作失败";
pub const MSG_SERVER_ERROR: &str = "服务器开小差了, 请联系管理员~";

// ============================================================================
// Envelope
// ============================================================================

/// Standard `{code, msg, data}` envelope; `data` is omitted when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = ()> {
    pub code: i32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    pub fn success() -> Self {
        Self::success_with_msg(MSG_SUCCESS)
    }

    pub fn success_with_msg(msg: impl Into<String>) -> Self {
        Self::bare(SUCCESS, msg)
    }

    /// Merge `code` and `msg` into a caller-built top-level object
    pub fn success_with_custom_data(mut data: Row) -> Json<Row> {
        data.insert("code".to_string(), Value::from(SUCCESS));
        data.insert("msg".to_string(), Value::from(MSG_SUCCESS));
        Json(data)
    }

    pub fn fail() -> Self {
        Self::fail_with_msg(MSG_FAIL)
    }

    pub fn fail_with_msg(msg: impl Into<String>) -> Self {
        Self::bare(LOGIC_ERROR, msg)
    }

    /// Server error with the generic message; `err` is only logged
    pub fn error(err: impl Display) -> Self {
        Self::error_with_msg(MSG_SERVER_ERROR, err)
    }

    /// Server error with a caller-chosen message; `err` is only logged
    pub fn error_with_msg(msg: impl Into<String>, err: impl Display) -> Self {
        let msg = msg.into();
        tracing::error!("{}: {}", msg, err);
        Self::bare(SERVER_ERROR, msg)
    }

    fn bare(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_data(data: T) -> Self {
        Self::success_with_data_msg(data, MSG_SUCCESS)
    }

    pub fn success_with_data_msg(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: SUCCESS,
            msg: msg.into(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Table envelope `{code: 0, msg: "ok", count, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayuiResponse {
    pub code: i32,
    pub msg: String,
    pub count: u64,
    pub data: Vec<Row>,
}

impl From<CountedPage> for LayuiResponse {
    fn from(page: CountedPage) -> Self {
        Self {
            code: SUCCESS,
            msg: "ok".to_string(),
            count: page.count,
            data: page.rows,
        }
    }
}

impl IntoResponse for LayuiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error rendered as a failure envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    /// Problem with the request itself; `msg` reaches the caller
    pub fn logic(msg: impl Into<String>) -> Self {
        Self {
            code: LOGIC_ERROR,
            msg: msg.into(),
        }
    }

    /// Internal failure; logged, the caller sees the generic message
    pub fn server(err: impl Display) -> Self {
        tracing::error!("{}: {}", MSG_SERVER_ERROR, err);
        Self {
            code: SERVER_ERROR,
            msg: MSG_SERVER_ERROR.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.msg, self.code)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiResponse::<()> {
            code: self.code,
            msg: self.msg,
            data: None,
        }
        .into_response()
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::InvalidPage(_) | PaginationError::InvalidPageSize(_) => {
                Self::logic(err.to_string())
            }
            PaginationError::DataSource(e) => Self::server(format!("{:#}", e)),
        }
    }
}

impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::InvalidQuery(_) => Self::logic(err.to_string()),
            HierarchyError::MissingParentId { .. } => Self::server(err),
            HierarchyError::DataSource(e) => Self::server(format!("{:#}", e)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::server(format!("{:#}", err))
    }
}
