//! Data sources
//!
//! This module provides:
//! - `DataSource` trait: count, offset/limit fetch and full fetch over a
//!   named collection narrowed by a `Filter`
//! - `SqlxDataSource` implementing the trait for SQLite and MySQL
//!
//! Collections map to tables. Table and field names are checked against an
//! identifier pattern before they reach SQL; filter values are always bound
//! as parameters. `Filter::Raw` is the one escape hatch and is forwarded as
//! written.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Filter, Row};
use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column as _, Row as _, ValueRef as _};
use std::sync::Arc;

/// Row storage consumed by the paginator and the hierarchy assembler
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Count rows of `collection` matching `filter`
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Fetch at most `limit` matching rows, skipping the first `offset`
    async fn fetch_page(
        &self,
        collection: &str,
        filter: &Filter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>>;

    /// Fetch every matching row
    async fn fetch_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Row>>;
}

/// Shared data source handle
pub type DynDataSource = Arc<dyn DataSource>;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .unwrap_or_else(|e| panic!("invalid identifier pattern: {}", e))
});

/// Reject anything that is not a plain (optionally schema-qualified) name
pub fn check_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        anyhow::bail!("Invalid identifier: {:?}", name)
    }
}

// ============================================================================
// SQL generation
// ============================================================================

/// Parameter value bound into a generated statement
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl BindValue {
    /// Non-null JSON value to bind parameter
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Text(u.to_string())
                } else {
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

/// SQL text with its positional parameters
#[derive(Debug, Default, PartialEq)]
struct Statement {
    sql: String,
    binds: Vec<BindValue>,
}

/// ` WHERE ...` clause for a filter, empty for `Filter::All`
fn where_clause(filter: &Filter) -> Result<Statement> {
    let mut statement = Statement::default();
    match filter {
        Filter::All => {}
        Filter::Eq(pairs) => {
            let mut conditions = Vec::with_capacity(pairs.len());
            for (field, value) in pairs {
                let field = check_identifier(field)?;
                if value.is_null() {
                    conditions.push(format!("{} IS NULL", field));
                } else {
                    conditions.push(format!("{} = ?", field));
                    statement.binds.push(BindValue::from_json(value));
                }
            }
            if !conditions.is_empty() {
                statement.sql = format!(" WHERE {}", conditions.join(" AND "));
            }
        }
        Filter::NullOrEmpty(field) => {
            let field = check_identifier(field)?;
            statement.sql = format!(" WHERE ({0} IS NULL OR {0} = '')", field);
        }
        Filter::Raw(expr) => {
            if !expr.trim().is_empty() {
                statement.sql = format!(" WHERE ({})", expr);
            }
        }
    }
    Ok(statement)
}

fn count_statement(collection: &str, filter: &Filter) -> Result<Statement> {
    let table = check_identifier(collection)?;
    let mut statement = where_clause(filter)?;
    statement.sql = format!("SELECT COUNT(*) AS count FROM {}{}", table, statement.sql);
    Ok(statement)
}

fn select_statement(
    collection: &str,
    filter: &Filter,
    order_by: Option<&str>,
    window: Option<(u64, u64)>,
) -> Result<Statement> {
    let table = check_identifier(collection)?;
    let mut statement = where_clause(filter)?;
    let mut sql = format!("SELECT * FROM {}{}", table, statement.sql);
    if let Some(order) = order_by {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    if let Some((offset, limit)) = window {
        sql.push_str(" LIMIT ? OFFSET ?");
        statement.binds.push(BindValue::Int(clamp_i64(limit)));
        statement.binds.push(BindValue::Int(clamp_i64(offset)));
    }
    statement.sql = sql;
    Ok(statement)
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// SQLx implementation
// ============================================================================

/// SQLx-based data source
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxDataSource {
    pool: DynDatabasePool,
    order_by: Option<String>,
}

impl SqlxDataSource {
    /// Create a new SQLx data source
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            pool,
            order_by: None,
        }
    }

    /// Create a shared data source for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> DynDataSource {
        Arc::new(Self::new(pool))
    }

    /// Order fetched rows by `column`
    pub fn with_order_by(mut self, column: &str, descending: bool) -> Result<Self> {
        let column = check_identifier(column)?;
        let direction = if descending { "DESC" } else { "ASC" };
        self.order_by = Some(format!("{} {}", column, direction));
        Ok(self)
    }

    fn sqlite(&self) -> Result<&SqlitePool> {
        self.pool
            .as_sqlite()
            .context("Pool reports sqlite driver but holds no sqlite pool")
    }

    fn mysql(&self) -> Result<&MySqlPool> {
        self.pool
            .as_mysql()
            .context("Pool reports mysql driver but holds no mysql pool")
    }

    async fn select(&self, statement: Statement) -> Result<Vec<Row>> {
        tracing::debug!("SQL: {} ({} binds)", statement.sql, statement.binds.len());
        match self.pool.driver() {
            DatabaseDriver::Sqlite => select_sqlite(self.sqlite()?, &statement).await,
            DatabaseDriver::Mysql => select_mysql(self.mysql()?, &statement).await,
        }
    }
}

#[async_trait]
impl DataSource for SqlxDataSource {
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let statement = count_statement(collection, filter)?;
        tracing::debug!("SQL: {} ({} binds)", statement.sql, statement.binds.len());
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.sqlite()?, &statement).await?,
            DatabaseDriver::Mysql => count_mysql(self.mysql()?, &statement).await?,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_page(
        &self,
        collection: &str,
        filter: &Filter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Row>> {
        let statement = select_statement(
            collection,
            filter,
            self.order_by.as_deref(),
            Some((offset, limit)),
        )?;
        self.select(statement).await
    }

    async fn fetch_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Row>> {
        let statement = select_statement(collection, filter, self.order_by.as_deref(), None)?;
        self.select(statement).await
    }
}

// SQLite implementations
fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    binds: &[BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in binds {
        query = match value {
            BindValue::Bool(v) => query.bind(*v),
            BindValue::Int(v) => query.bind(*v),
            BindValue::Float(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

async fn count_sqlite(pool: &SqlitePool, statement: &Statement) -> Result<i64> {
    let row = bind_sqlite(sqlx::query(&statement.sql), &statement.binds)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count rows: {}", statement.sql))?;
    row.try_get::<i64, _>("count")
        .context("Failed to decode row count")
}

async fn select_sqlite(pool: &SqlitePool, statement: &Statement) -> Result<Vec<Row>> {
    let rows = bind_sqlite(sqlx::query(&statement.sql), &statement.binds)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to fetch rows: {}", statement.sql))?;
    rows.iter().map(sqlite_row_to_json).collect()
}

fn sqlite_row_to_json(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if row.try_get_raw(index)?.is_null() {
            Value::Null
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<f64, _>(index) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<String, _>(index) {
            Value::String(v)
        } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
            Value::String(String::from_utf8_lossy(&v).into_owned())
        } else {
            tracing::warn!("Unsupported sqlite column type for {}", column.name());
            Value::Null
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

// MySQL implementations
fn bind_mysql<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    binds: &[BindValue],
) -> Query<'q, MySql, MySqlArguments> {
    for value in binds {
        query = match value {
            BindValue::Bool(v) => query.bind(*v),
            BindValue::Int(v) => query.bind(*v),
            BindValue::Float(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

async fn count_mysql(pool: &MySqlPool, statement: &Statement) -> Result<i64> {
    let row = bind_mysql(sqlx::query(&statement.sql), &statement.binds)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count rows: {}", statement.sql))?;
    row.try_get::<i64, _>("count")
        .context("Failed to decode row count")
}

async fn select_mysql(pool: &MySqlPool, statement: &Statement) -> Result<Vec<Row>> {
    let rows = bind_mysql(sqlx::query(&statement.sql), &statement.binds)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to fetch rows: {}", statement.sql))?;
    rows.iter().map(mysql_row_to_json).collect()
}

fn mysql_row_to_json(row: &MySqlRow) -> Result<Row> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = if row.try_get_raw(index)?.is_null() {
            Value::Null
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<u64, _>(index) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<f64, _>(index) {
            Value::from(v)
        } else if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(index) {
            Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string())
        } else if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(index) {
            Value::String(v.format("%Y-%m-%d").to_string())
        } else if let Ok(v) = row.try_get::<String, _>(index) {
            Value::String(v)
        } else if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
            Value::String(String::from_utf8_lossy(&v).into_owned())
        } else {
            tracing::warn!("Unsupported mysql column type for {}", column.name());
            Value::Null
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
