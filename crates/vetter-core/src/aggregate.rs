//! Concurrent page aggregation
//!
//! Reconstructs the full record set from a paginated source. One task per
//! page, all launched eagerly and gated by a shared semaphore, results
//! funneled through a single channel. A failed page never takes its siblings
//! down with it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fetch::{FetchError, PageFetcher};
use crate::types::Record;

const DEFAULT_PAGE_SIZE: u64 = 5;
const DEFAULT_MAX_CONCURRENCY: usize = 8;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Aggregation settings.
///
/// `page_size` is fixed at 5 by the source contract; it is configurable here
/// for sources that ever change the contract, not as a tuning knob.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub page_size: u64,
    pub max_concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl AggregatorConfig {
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }
}

/// A page that could not be collected, kept next to the records that could.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page: u32,
    pub error: FetchError,
}

/// Everything one aggregation pass produced.
///
/// Record order is stable within a page; across pages it follows arrival
/// order and carries no guarantee.
#[derive(Debug, Default)]
pub struct PageSet {
    pub records: Vec<Record>,
    pub failures: Vec<PageFailure>,
}

/// Aggregation broke its own accounting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// Fewer page results than dispatched tasks, which means a task died
    /// without reporting. Distinct from page failures, which are counted.
    #[error("collected {received} of {expected} page results")]
    Incomplete { expected: u32, received: u32 },
}

/// Fans out page fetches and collects the results.
#[derive(Debug, Clone, Default)]
pub struct PageAggregator {
    config: AggregatorConfig,
}

impl PageAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Number of pages the source serves for `total` records.
    ///
    /// The source contract is `total / page_size + 1`, so there is always at
    /// least one page, even for an empty collection.
    pub fn page_count(&self, total: u64) -> u32 {
        // page_size is never zero in a sane config; clamp guards the division.
        let pages = total / self.config.page_size.max(1) + 1;
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Fetches pages `1..=page_count` concurrently and gathers their records.
    ///
    /// Page 0 is the caller's metadata probe and is never requested here.
    /// Each page task waits for a semaphore permit, then races its fetch
    /// against the per-fetch timeout and the cancellation token. Abandoning
    /// the returned future cancels still-running tasks via a drop guard on a
    /// child token.
    pub async fn collect(
        &self,
        fetcher: Arc<dyn PageFetcher>,
        locator: &str,
        total: u64,
        cancel: &CancellationToken,
    ) -> Result<PageSet, AggregateError> {
        let page_count = self.page_count(total);
        debug!(total, page_count, "starting page aggregation");

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let (tx, mut rx) = mpsc::channel::<(u32, Result<Vec<Record>, FetchError>)>(
            page_count as usize,
        );

        let token = cancel.child_token();
        let _guard = token.clone().drop_guard();

        let mut handles = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            let fetcher = Arc::clone(&fetcher);
            let locator = locator.to_string();
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            let fetch_timeout = self.config.fetch_timeout;
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let result =
                    fetch_one_page(&*fetcher, &locator, page, semaphore, token, fetch_timeout)
                        .await;
                // Channel capacity equals the page count, so this never blocks;
                // it only fails if the collector was dropped, and then nobody
                // is listening anyway.
                let _ = tx.send((page, result)).await;
            }));
        }
        drop(tx);

        futures::future::join_all(handles).await;

        let mut set = PageSet::default();
        let mut received = 0u32;
        while let Some((page, result)) = rx.recv().await {
            received += 1;
            match result {
                Ok(records) => {
                    debug!(page, records = records.len(), "page collected");
                    set.records.extend(records);
                }
                Err(error) => {
                    warn!(page, %error, "page failed");
                    set.failures.push(PageFailure { page, error });
                }
            }
        }

        if received != page_count {
            return Err(AggregateError::Incomplete {
                expected: page_count,
                received,
            });
        }

        debug!(
            records = set.records.len(),
            failed_pages = set.failures.len(),
            "page aggregation finished"
        );
        Ok(set)
    }
}

async fn fetch_one_page(
    fetcher: &dyn PageFetcher,
    locator: &str,
    page: u32,
    semaphore: Arc<Semaphore>,
    token: CancellationToken,
    fetch_timeout: Duration,
) -> Result<Vec<Record>, FetchError> {
    let _permit = tokio::select! {
        _ = token.cancelled() => return Err(FetchError::Cancelled),
        permit = semaphore.clone().acquire_owned() => {
            permit.map_err(|_| FetchError::Cancelled)?
        }
    };

    tokio::select! {
        _ = token.cancelled() => Err(FetchError::Cancelled),
        result = timeout(fetch_timeout, fetcher.fetch_page(locator, page)) => {
            match result {
                Ok(Ok(raw)) => Ok(raw.customers),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(FetchError::Timeout {
                    secs: fetch_timeout.as_secs(),
                }),
            }
        }
    }
}
