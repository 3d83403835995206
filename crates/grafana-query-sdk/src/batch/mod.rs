/*! Batched, rate-limited pagination over paged list APIs.

The query endpoints of the backend services return at most a fixed number of
records per request. A [`BatchQuery`] repeatedly calls a "fetch one page"
function, accumulating records until the service reports there are no more,
while never dispatching more than a configured number of requests per second.

Two paging styles are supported:

- [`BatchQuery::until_complete`] follows continuation tokens;
- [`BatchQuery::using_skip`] advances a `skip` offset.

```rust
use grafana_query_sdk::batch::{query_using_skip, BatchConfig, Page};

# #[tokio::main(flavor = "current_thread")]
# async fn main() {
let records: Vec<u32> = (0..7).collect();
let config = BatchConfig::new(3, 0);
let result = query_using_skip(
    |take, skip| {
        let page: Vec<u32> = records.iter().copied().skip(skip).take(take).collect();
        async move { Ok::<_, std::io::Error>(Page::new(page).with_total_count(7)) }
    },
    &config,
)
.await
.unwrap();
assert_eq!(result.data, records);
# }
```
*/
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod throttle;

use throttle::Throttle;

/// Paging limits shared by every batch query of a data source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// The largest page requested from the service.
    pub max_take_per_request: usize,
    /// The most requests dispatched in any one-second window. `0` disables throttling.
    pub requests_per_second: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_take_per_request: 500,
            requests_per_second: 4,
        }
    }
}

impl BatchConfig {
    /// Create a config.
    pub fn new(max_take_per_request: usize, requests_per_second: u32) -> Self {
        Self {
            max_take_per_request,
            requests_per_second,
        }
    }

    /// Check the config can drive a query.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_take_per_request == 0 {
            return Err("maxTakePerRequest must be greater than zero");
        }
        Ok(())
    }
}

/// One page returned by a paged list API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    /// The records of this page.
    pub data: Vec<T>,
    /// The token requesting the next page, if there is one.
    pub continuation_token: Option<String>,
    /// The total number of records matching the query, if the service reports it.
    pub total_count: Option<usize>,
}

impl<T> Page<T> {
    /// Create a page with no continuation token or total.
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            continuation_token: None,
            total_count: None,
        }
    }

    /// Set the continuation token.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Set the total count.
    pub fn with_total_count(mut self, total_count: usize) -> Self {
        self.total_count = Some(total_count);
        self
    }
}

/// The accumulated result of a batch query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResult<T> {
    /// Every record fetched, in arrival order.
    pub data: Vec<T>,
    /// The continuation token of the last page.
    pub continuation_token: Option<String>,
    /// The last total count reported by the service.
    pub total_count: Option<usize>,
}

/// Errors that can occur when running a batch query.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError<E> {
    /// Fetching a page failed. No partial result is returned.
    #[error("Page request failed: {0}")]
    Fetch(#[source] E),

    /// The query was cancelled before completing.
    #[error("Batch query cancelled")]
    Cancelled,

    /// The batch config cannot drive a query.
    #[error("Invalid batch config: {0}")]
    InvalidConfig(&'static str),
}

/// A paged query, configured with limits and optionally a record limit and a
/// cancellation token.
#[derive(Clone, Debug, Default)]
pub struct BatchQuery {
    config: BatchConfig,
    take: Option<usize>,
    cancellation: Option<CancellationToken>,
}

impl BatchQuery {
    /// Create a query with the given limits.
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            take: None,
            cancellation: None,
        }
    }

    /// Stop after `take` records in total.
    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// Abort the query, between or during page requests, once `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The size of the next page, or `None` once the record limit or the
    /// reported total is reached.
    fn next_take(&self, accumulated: usize, total_count: Option<usize>) -> Option<usize> {
        let max = self.config.max_take_per_request;
        match self.take.into_iter().chain(total_count).min() {
            Some(limit) if accumulated >= limit => None,
            Some(limit) => Some((limit - accumulated).min(max)),
            None => Some(max),
        }
    }

    /// Run `fut` unless the query is cancelled first.
    async fn guard<O, E, Fut>(&self, fut: Fut) -> Result<O, BatchError<E>>
    where
        Fut: Future<Output = O>,
    {
        let Some(token) = &self.cancellation else {
            return Ok(fut.await);
        };
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(BatchError::Cancelled),
            out = fut => Ok(out),
        }
    }

    fn finish<T>(&self, mut data: Vec<T>, continuation_token: Option<String>, total_count: Option<usize>) -> BatchResult<T> {
        if let Some(take) = self.take {
            data.truncate(take);
        }
        debug!(records = data.len(), ?total_count, "Batch query complete");
        BatchResult {
            data,
            continuation_token,
            total_count,
        }
    }

    /// Fetch pages by continuation token until none remain.
    ///
    /// `fetch` is called with the page size and the token returned by the
    /// previous page (`None` for the first page). Paging stops when a page is
    /// empty or carries no token, when the reported total has been reached or,
    /// if no total is reported, when a page is shorter than requested.
    #[tracing::instrument(skip_all, level = "debug", fields(take = ?self.take))]
    pub async fn until_complete<T, E, F, Fut>(&self, mut fetch: F) -> Result<BatchResult<T>, BatchError<E>>
    where
        F: FnMut(usize, Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        self.config.validate().map_err(BatchError::<E>::InvalidConfig)?;
        let mut throttle = Throttle::new(self.config.requests_per_second);
        let mut data = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut total_count = None;
        while let Some(take) = self.next_take(data.len(), total_count) {
            self.guard::<_, E, _>(throttle.acquire()).await?;
            let page = self
                .guard::<_, E, _>(fetch(take, continuation_token.take()))
                .await?
                .map_err(BatchError::Fetch)?;
            let received = page.data.len();
            debug!(take, received, total_count = ?page.total_count, "Fetched page");
            total_count = page.total_count.or(total_count);
            continuation_token = page.continuation_token;
            data.extend(page.data);
            let exhausted = match total_count {
                Some(total) => data.len() >= total,
                None => received < take,
            };
            let no_token = continuation_token.as_deref().map_or(true, str::is_empty);
            if received == 0 || no_token || exhausted {
                break;
            }
        }
        Ok(self.finish(data, continuation_token, total_count))
    }

    /// Fetch pages by offset until none remain.
    ///
    /// `fetch` is called with the page size and the number of records to skip.
    /// Paging stops when a page is empty, when the offset reaches the reported
    /// total or, if no total is reported, when a page is shorter than requested.
    #[tracing::instrument(skip_all, level = "debug", fields(take = ?self.take))]
    pub async fn using_skip<T, E, F, Fut>(&self, mut fetch: F) -> Result<BatchResult<T>, BatchError<E>>
    where
        F: FnMut(usize, usize) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        self.config.validate().map_err(BatchError::<E>::InvalidConfig)?;
        let mut throttle = Throttle::new(self.config.requests_per_second);
        let mut data = Vec::new();
        let mut total_count = None;
        let mut skip = 0;
        while let Some(take) = self.next_take(data.len(), total_count) {
            self.guard::<_, E, _>(throttle.acquire()).await?;
            let page = self
                .guard::<_, E, _>(fetch(take, skip))
                .await?
                .map_err(BatchError::Fetch)?;
            let received = page.data.len();
            debug!(take, skip, received, total_count = ?page.total_count, "Fetched page");
            total_count = page.total_count.or(total_count);
            skip += received;
            data.extend(page.data);
            let exhausted = match total_count {
                Some(total) => skip >= total,
                None => received < take,
            };
            if received == 0 || exhausted {
                break;
            }
        }
        Ok(self.finish(data, None, total_count))
    }
}

/// Fetch every page by continuation token. See [`BatchQuery::until_complete`].
pub async fn query_until_complete<T, E, F, Fut>(fetch: F, config: &BatchConfig) -> Result<BatchResult<T>, BatchError<E>>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    BatchQuery::new(*config).until_complete(fetch).await
}

/// Fetch every page by offset. See [`BatchQuery::using_skip`].
pub async fn query_using_skip<T, E, F, Fut>(fetch: F, config: &BatchConfig) -> Result<BatchResult<T>, BatchError<E>>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    BatchQuery::new(*config).using_skip(fetch).await
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use tokio::time::Instant;

    use super::*;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[tokio::test]
    async fn record_limit_shrinks_last_page() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let query = BatchQuery::new(BatchConfig::new(2, 0)).take(5);
        let result = query
            .until_complete(|take, _| {
                let requested = Arc::clone(&requested);
                async move {
                    requested.lock().unwrap().push(take);
                    Ok::<_, Boom>(Page::new(vec!['x'; take]).with_continuation_token("more"))
                }
            })
            .await
            .unwrap();
        assert_eq!(result.data.len(), 5);
        assert_eq!(*requested.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn reported_total_shrinks_last_page() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let result = query_until_complete(
            |take, _| {
                let requested = Arc::clone(&requested);
                async move {
                    requested.lock().unwrap().push(take);
                    Ok::<_, Boom>(
                        Page::new(vec!['x'; take])
                            .with_continuation_token("more")
                            .with_total_count(5),
                    )
                }
            },
            &BatchConfig::new(2, 0),
        )
        .await
        .unwrap();
        assert_eq!(result.data.len(), 5);
        assert_eq!(*requested.lock().unwrap(), vec![2, 2, 1]);

        let requested = Arc::new(Mutex::new(Vec::new()));
        let result = query_using_skip(
            |take, skip| {
                let requested = Arc::clone(&requested);
                async move {
                    requested.lock().unwrap().push(take);
                    Ok::<_, Boom>(Page::new((skip..skip + take).collect()).with_total_count(3))
                }
            },
            &BatchConfig::new(2, 0),
        )
        .await
        .unwrap();
        assert_eq!(result.data, vec![0, 1, 2]);
        assert_eq!(*requested.lock().unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn tokens_are_passed_along() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let config = BatchConfig::new(1, 0);
        let result = query_until_complete(
            |_, token| {
                let seen = Arc::clone(&seen);
                async move {
                    let next = match token.as_deref() {
                        None => Some("p2"),
                        Some("p2") => Some("p3"),
                        _ => None,
                    };
                    seen.lock().unwrap().push(token);
                    let page = Page::new(vec![1]);
                    Ok::<_, Boom>(match next {
                        Some(next) => page.with_continuation_token(next),
                        None => page,
                    })
                }
            },
            &config,
        )
        .await
        .unwrap();
        assert_eq!(result.data, vec![1, 1, 1]);
        assert_eq!(result.continuation_token, None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_token_stops_paging() {
        let calls = AtomicUsize::new(0);
        let result = query_until_complete(
            |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Boom>(Page::new(vec![1, 2]).with_continuation_token("")) }
            },
            &BatchConfig::new(2, 0),
        )
        .await
        .unwrap();
        assert_eq!(result.data, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let result = query_using_skip(
            |_, skip| async move {
                if skip == 0 {
                    Ok(Page::new(vec![1]))
                } else {
                    Err(Boom)
                }
            },
            &BatchConfig::new(1, 0),
        )
        .await;
        assert!(matches!(result, Err(BatchError::Fetch(Boom))));
    }

    #[tokio::test]
    async fn zero_page_size_is_rejected() {
        let result = query_using_skip(
            |_, _| async { Ok::<_, Boom>(Page::new(vec![1])) },
            &BatchConfig::new(0, 4),
        )
        .await;
        assert!(matches!(result, Err(BatchError::InvalidConfig(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_throttled() {
        let dispatched = Arc::new(Mutex::new(Vec::new()));
        let result = query_using_skip(
            |_, skip| {
                let dispatched = Arc::clone(&dispatched);
                async move {
                    dispatched.lock().unwrap().push(Instant::now());
                    Ok::<_, Boom>(Page::new(vec![skip]).with_total_count(5))
                }
            },
            &BatchConfig::new(1, 2),
        )
        .await
        .unwrap();
        assert_eq!(result.data, vec![0, 1, 2, 3, 4]);
        let dispatched = dispatched.lock().unwrap();
        assert_eq!(dispatched.len(), 5);
        assert!(dispatched[4] - dispatched[0] >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn cancellation_between_pages() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = BatchQuery::new(BatchConfig::new(1, 0)).cancellation(token.clone());
        let result = query
            .using_skip(|_, skip| {
                let token = token.clone();
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if skip == 1 {
                        token.cancel();
                    }
                    Ok::<_, Boom>(Page::new(vec![skip]).with_total_count(10))
                }
            })
            .await;
        assert!(matches!(result, Err(BatchError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_throttle_wait() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });
        let calls = AtomicUsize::new(0);
        let start = Instant::now();
        let result = BatchQuery::new(BatchConfig::new(1, 1))
            .cancellation(token)
            .using_skip(|_, skip| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, Boom>(Page::new(vec![skip]).with_total_count(10)) }
            })
            .await;
        assert!(matches!(result, Err(BatchError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Instant::now() - start < Duration::from_secs(1));
    }
}
