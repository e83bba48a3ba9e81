//! Database layer
//!
//! This module provides the row storage consumed by the paginator and the
//! hierarchy assembler. It supports:
//! - SQLite (default)
//! - MySQL
//! - In-memory collections
//!
//! # Usage
//!
//! ```ignore
//! use apikit::config::DatabaseConfig;
//! use apikit::db::{create_pool, DataSource, SqlxDataSource};
//! use apikit::models::Filter;
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! let source = SqlxDataSource::new(pool);
//! let total = source.count("menu", &Filter::All).await?;
//! ```

pub mod memory;
pub mod pool;
pub mod source;

pub use memory::MemoryDataSource;
pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
pub use source::{check_identifier, DataSource, DynDataSource, SqlxDataSource};
