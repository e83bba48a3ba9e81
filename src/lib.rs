//! apikit - query and response helpers for JSON backends
//!
//! This library provides pagination, parent/children assembly, membership
//! tests and parameter signing over pluggable data sources, plus the axum
//! envelopes and extractors that expose them over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
