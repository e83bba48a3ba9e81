//! Paginator
//!
//! Two flavours:
//! - `paginate`: caller supplies the total and a `PageFetcher`; the result
//!   carries page count and next-page flag.
//! - `paginate_by_source` / `paginate_by_source_with`: offset/limit fetch
//!   plus a separate count against a `DataSource`, returning `{count, rows}`.
//!
//! The fetch and the count are two independent round trips. Nothing ties
//! them to one snapshot, so a concurrent writer can make `count` disagree
//! with the rows returned.

use crate::db::DataSource;
use crate::models::{CountedPage, Filter, PageRequest, PageResult, Row};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;

/// Error types for paginator operations
#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    /// Page numbers start at 1
    #[error("Invalid page: {0} (pages start at 1)")]
    InvalidPage(u64),

    /// Page size must be at least 1
    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(u64),

    /// The data source failed; the original error is kept as-is
    #[error(transparent)]
    DataSource(#[from] anyhow::Error),
}

/// Produces the rows of one page
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, page: u64, page_size: u64) -> Result<Vec<T>>;
}

#[async_trait]
impl<T, F, Fut> PageFetcher<T> for F
where
    T: Send + 'static,
    F: Fn(u64, u64) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
{
    async fn fetch_page(&self, page: u64, page_size: u64) -> Result<Vec<T>> {
        (self)(page, page_size).await
    }
}

/// `PageFetcher` reading one collection of a `DataSource` by offset/limit
pub struct SourceFetcher<'a, S: ?Sized> {
    source: &'a S,
    collection: &'a str,
    filter: &'a Filter,
}

impl<'a, S: DataSource + ?Sized> SourceFetcher<'a, S> {
    pub fn new(source: &'a S, collection: &'a str, filter: &'a Filter) -> Self {
        Self {
            source,
            collection,
            filter,
        }
    }
}

#[async_trait]
impl<S: DataSource + ?Sized> PageFetcher<Row> for SourceFetcher<'_, S> {
    async fn fetch_page(&self, page: u64, page_size: u64) -> Result<Vec<Row>> {
        let offset = PageRequest::new(page, page_size).offset();
        self.source
            .fetch_page(self.collection, self.filter, offset, page_size)
            .await
    }
}

fn check_request(request: PageRequest) -> Result<(), PaginationError> {
    if request.page == 0 {
        return Err(PaginationError::InvalidPage(request.page));
    }
    if request.page_size == 0 {
        return Err(PaginationError::InvalidPageSize(request.page_size));
    }
    Ok(())
}

/// Fetch one page and wrap it with page metadata.
///
/// `fetcher` is called exactly once. A fetch failure is returned as-is and
/// no result is built.
pub async fn paginate<T, F>(
    total: u64,
    request: PageRequest,
    fetcher: &F,
) -> Result<PageResult<T>, PaginationError>
where
    F: PageFetcher<T> + ?Sized,
{
    check_request(request)?;
    let rows = fetcher.fetch_page(request.page, request.page_size).await?;
    Ok(PageResult::new(total, request, rows))
}

/// Count matching rows, then paginate over them with a `SourceFetcher`
pub async fn paginate_source<S>(
    source: &S,
    collection: &str,
    filter: &Filter,
    request: PageRequest,
) -> Result<PageResult<Row>, PaginationError>
where
    S: DataSource + ?Sized,
{
    check_request(request)?;
    let total = source.count(collection, filter).await?;
    paginate(total, request, &SourceFetcher::new(source, collection, filter)).await
}

/// Offset/limit page plus total count of the filter
pub async fn paginate_by_source<S>(
    source: &S,
    collection: &str,
    filter: &Filter,
    request: PageRequest,
) -> Result<CountedPage, PaginationError>
where
    S: DataSource + ?Sized,
{
    paginate_by_source_with(source, collection, filter, request, |_: &mut Vec<Row>| {}).await
}

/// Like `paginate_by_source`, running `transform` over the fetched rows
/// before the count query is issued
pub async fn paginate_by_source_with<S, F>(
    source: &S,
    collection: &str,
    filter: &Filter,
    request: PageRequest,
    transform: F,
) -> Result<CountedPage, PaginationError>
where
    S: DataSource + ?Sized,
    F: FnOnce(&mut Vec<Row>),
{
    check_request(request)?;

    let mut rows = source
        .fetch_page(collection, filter, request.offset(), request.page_size)
        .await?;
    transform(&mut rows);

    let count = source.count(collection, filter).await?;
    Ok(CountedPage { count, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, DynDataSource, MemoryDataSource, SqlxDataSource};
    use crate::models::row_from;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fetcher returning `page_size` numbered rows and counting its calls
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher<u64> for CountingFetcher {
        async fn fetch_page(&self, page: u64, page_size: u64) -> Result<Vec<u64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = (page - 1) * page_size;
            Ok((start..start + page_size).collect())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher<u64> for FailingFetcher {
        async fn fetch_page(&self, _page: u64, _page_size: u64) -> Result<Vec<u64>> {
            anyhow::bail!("fetch failed")
        }
    }

    /// Data source whose calls are recorded and whose count can fail
    struct RecordingSource {
        inner: MemoryDataSource,
        fail_count: bool,
        fail_fetch: bool,
        log: Mutex<Vec<String>>,
    }

    impl RecordingSource {
        fn new(rows: usize) -> Self {
            let rows = (1..=rows)
                .map(|id| {
                    let kind = if id % 2 == 0 { "even" } else { "odd" };
                    row_from(json!({"id": id, "kind": kind}))
                })
                .collect();
            Self {
                inner: MemoryDataSource::new().with_collection("items", rows),
                fail_count: false,
                fail_fetch: false,
                log: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DataSource for RecordingSource {
        async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
            self.log.lock().unwrap().push("count".to_string());
            if self.fail_count {
                anyhow::bail!("count failed");
            }
            self.inner.count(collection, filter).await
        }

        async fn fetch_page(
            &self,
            collection: &str,
            filter: &Filter,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<Row>> {
            self.log
                .lock()
                .unwrap()
                .push(format!("fetch_page {} {}", offset, limit));
            if self.fail_fetch {
                anyhow::bail!("fetch failed");
            }
            self.inner.fetch_page(collection, filter, offset, limit).await
        }

        async fn fetch_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Row>> {
            self.log.lock().unwrap().push("fetch_all".to_string());
            self.inner.fetch_all(collection, filter).await
        }
    }

    // ========================================================================
    // paginate
    // ========================================================================

    #[tokio::test]
    async fn test_paginate_first_page() {
        let fetcher = CountingFetcher::new();
        let result = paginate(10, PageRequest::new(1, 5), &fetcher).await.unwrap();

        assert_eq!(result.total, 10);
        assert_eq!(result.total_page, 2);
        assert_eq!(result.current_page, 1);
        assert_eq!(result.rows, vec![0, 1, 2, 3, 4]);
        assert!(result.has_next_page);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_paginate_last_page_has_no_next() {
        let fetcher = CountingFetcher::new();
        let result = paginate(10, PageRequest::new(2, 5), &fetcher).await.unwrap();
        assert_eq!(result.total_page, 2);
        assert!(!result.has_next_page);
    }

    #[tokio::test]
    async fn test_paginate_partial_last_page() {
        let fetcher = CountingFetcher::new();
        let result = paginate(11, PageRequest::new(2, 5), &fetcher).await.unwrap();
        assert_eq!(result.total_page, 3);
        assert!(result.has_next_page);
    }

    #[tokio::test]
    async fn test_paginate_empty_total() {
        let fetcher = CountingFetcher::new();
        let result = paginate(0, PageRequest::new(1, 5), &fetcher).await.unwrap();
        assert_eq!(result.total_page, 0);
        assert!(!result.has_next_page);
    }

    #[tokio::test]
    async fn test_paginate_rejects_zero_page_size() {
        let fetcher = CountingFetcher::new();
        let err = paginate(10, PageRequest::new(1, 0), &fetcher).await.unwrap_err();
        assert!(matches!(err, PaginationError::InvalidPageSize(0)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_paginate_rejects_zero_page() {
        let fetcher = CountingFetcher::new();
        let err = paginate(10, PageRequest::new(0, 5), &fetcher).await.unwrap_err();
        assert!(matches!(err, PaginationError::InvalidPage(0)));
    }

    #[tokio::test]
    async fn test_paginate_fetch_failure_propagates() {
        let err = paginate(10, PageRequest::new(1, 5), &FailingFetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::DataSource(_)));
        assert_eq!(err.to_string(), "fetch failed");
    }

    #[tokio::test]
    async fn test_paginate_is_idempotent_for_pure_fetcher() {
        let fetcher = CountingFetcher::new();
        let request = PageRequest::new(3, 4);
        let first = paginate(30, request, &fetcher).await.unwrap();
        let second = paginate(30, request, &fetcher).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_paginate_with_closure() {
        let fetcher = |page: u64, page_size: u64| async move {
            Ok::<_, anyhow::Error>(vec![json!({"page": page, "size": page_size})])
        };
        let result = paginate(7, PageRequest::new(2, 3), &fetcher).await.unwrap();
        assert_eq!(result.rows, vec![json!({"page": 2, "size": 3})]);
        assert_eq!(result.total_page, 3);
    }

    #[tokio::test]
    async fn test_paginate_source() {
        let source = RecordingSource::new(7);
        let result = paginate_source(&source, "items", &Filter::All, PageRequest::new(2, 3))
            .await
            .unwrap();

        assert_eq!(result.total, 7);
        assert_eq!(result.total_page, 3);
        let ids: Vec<Value> = result.rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(4), json!(5), json!(6)]);
        assert_eq!(source.calls(), vec!["count", "fetch_page 3 3"]);
    }

    #[tokio::test]
    async fn test_paginate_source_count_failure_builds_nothing() {
        let mut source = RecordingSource::new(3);
        source.fail_count = true;
        let err = paginate_source(&source, "items", &Filter::All, PageRequest::new(1, 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "count failed");
        assert_eq!(source.calls(), vec!["count"]);
    }

    // ========================================================================
    // paginate_by_source
    // ========================================================================

    #[tokio::test]
    async fn test_paginate_by_source() {
        let source = RecordingSource::new(25);
        let page = paginate_by_source(&source, "items", &Filter::All, PageRequest::new(3, 10))
            .await
            .unwrap();

        assert_eq!(page.count, 25);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.rows[0]["id"], json!(21));
        assert_eq!(source.calls(), vec!["fetch_page 20 10", "count"]);
    }

    #[tokio::test]
    async fn test_paginate_by_source_forwards_filter() {
        let source = RecordingSource::new(10);
        let filter = Filter::eq("kind", "even");
        let page = paginate_by_source(&source, "items", &filter, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.rows[0]["id"], json!(2));
        assert_eq!(page.rows[1]["id"], json!(4));
    }

    #[tokio::test]
    async fn test_paginate_by_source_transform_runs_before_count() {
        let source = RecordingSource::new(4);
        let page = paginate_by_source_with(
            &source,
            "items",
            &Filter::All,
            PageRequest::new(1, 2),
            |rows: &mut Vec<Row>| {
                source.log.lock().unwrap().push("transform".to_string());
                for row in rows.iter_mut() {
                    row.insert("seen".to_string(), json!(true));
                }
            },
        )
        .await
        .unwrap();

        assert!(page.rows.iter().all(|r| r["seen"] == json!(true)));
        assert_eq!(
            source.calls(),
            vec!["fetch_page 0 2", "transform", "count"]
        );
    }

    #[tokio::test]
    async fn test_paginate_by_source_fetch_failure_skips_count() {
        let mut source = RecordingSource::new(4);
        source.fail_fetch = true;
        let err = paginate_by_source(&source, "items", &Filter::All, PageRequest::new(1, 2))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fetch failed");
        assert_eq!(source.calls(), vec!["fetch_page 0 2"]);
    }

    #[tokio::test]
    async fn test_paginate_by_source_count_failure() {
        let mut source = RecordingSource::new(4);
        source.fail_count = true;
        let err = paginate_by_source(&source, "items", &Filter::All, PageRequest::new(1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::DataSource(_)));
    }

    #[tokio::test]
    async fn test_paginate_by_source_over_shared_sql_source() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.execute("CREATE TABLE item (id INTEGER PRIMARY KEY)")
            .await
            .expect("Failed to create table");
        pool.execute("INSERT INTO item (id) VALUES (1), (2), (3)")
            .await
            .expect("Failed to seed table");

        let source: DynDataSource = SqlxDataSource::boxed(pool);
        let page = paginate_by_source(source.as_ref(), "item", &Filter::All, PageRequest::new(2, 2))
            .await
            .unwrap();

        assert_eq!(page.count, 3);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["id"], json!(3));
    }

    #[tokio::test]
    async fn test_paginate_by_source_rejects_zero_limit() {
        let source = RecordingSource::new(4);
        let err = paginate_by_source(&source, "items", &Filter::All, PageRequest::new(1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::InvalidPageSize(0)));
        assert!(source.calls().is_empty());
    }
}
