//! In-memory data source
//!
//! Holds named collections of rows in process and evaluates `Filter::Eq`
//! and `Filter::NullOrEmpty` against them. Raw expressions need a real
//! backend and are rejected.
//!
//! Equality follows what the SQL backends do with a bound parameter:
//! numbers compare by value (`1 == 1.0`) and a numeric string equals the
//! number it spells (`"1" == 1`), so a text link column finds its
//! integer parent here too.

use crate::db::DataSource;
use crate::models::{Filter, Row};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::sync::RwLock;

/// Data source backed by in-process collections
#[derive(Default)]
pub struct MemoryDataSource {
    collections: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert_collection`
    pub fn with_collection(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.insert_collection(name, rows);
        self
    }

    /// Replace a collection
    pub fn insert_collection(&self, name: impl Into<String>, rows: Vec<Row>) {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(|e| e.into_inner());
        collections.insert(name.into(), rows);
    }

    /// Append a row, creating the collection if needed
    pub fn push(&self, name: &str, row: Row) {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(|e| e.into_inner());
        collections.entry(name.to_string()).or_default().push(row);
    }

    fn matching(&self, collection: &str, filter: &Filter) -> Result<Vec<Row>> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner());
        let rows = collections
            .get(collection)
            .ok_or_else(|| anyhow::anyhow!("Unknown collection: {}", collection))?;

        let mut out = Vec::new();
        for row in rows {
            if matches_filter(row, filter)? {
                out.push(row.clone());
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self.matching(collection, filter)?.len() as u64)
    }

    async fn fetch_page(
        &self,
        collection: &str,
        filter: &Filter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>> {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .matching(collection, filter)?
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn fetch_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Row>> {
        self.matching(collection, filter)
    }
}

/// Evaluate a filter against one row
pub fn matches_filter(row: &Row, filter: &Filter) -> Result<bool> {
    match filter {
        Filter::All => Ok(true),
        Filter::Eq(pairs) => Ok(pairs.iter().all(|(field, expected)| {
            match row.get(field) {
                None | Some(Value::Null) => expected.is_null(),
                Some(actual) => values_equal(actual, expected),
            }
        })),
        Filter::NullOrEmpty(field) => Ok(match row.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        }),
        Filter::Raw(expr) => {
            anyhow::bail!("Raw filter expressions are not supported in memory: {}", expr)
        }
    }
}

/// Equality with SQL-like numeric comparison (`1 == 1.0`, `"1" == 1`)
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            match s.trim().parse::<Number>() {
                Ok(parsed) => numbers_equal(&parsed, n),
                Err(_) => false,
            }
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (x.as_i64(), y.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (x.as_u64(), y.as_u64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
    }
}
