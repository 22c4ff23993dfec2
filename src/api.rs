//! Paginated ingestion with exponential backoff retry logic.
//!
//! This module drains every page of a search query from the content API.
//! It retries transient page failures with exponential backoff and fails the
//! whole run when a page exhausts its retry budget.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`PageFetcher`]: Core trait issuing one request for one page
//! - [`RetryPolicy`]: Decides whether and how long to wait before retrying
//! - [`IngestionClient`]: Drives any [`PageFetcher`] across all pages
//!
//! The HTTP implementation of [`PageFetcher`] lives in
//! [`crate::sources::guardian`].
//!
//! # Retry Strategy
//!
//! - 3 attempts per page by default; the budget resets on every new page
//! - Exponential backoff starting at 5 seconds
//! - Only statuses classified [`StatusClass::Retryable`] and transport
//!   errors are retried
//! - Waiting is cancellable through a [`CancellationToken`]

use crate::error::{FetchError, IngestionError};
use crate::models::{PageResult, QuerySpec, Record};
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Fixed page size: the API maximum, to keep round-trips down.
pub const PAGE_SIZE: u32 = 200;

/// Trait for fetching a single page of search results.
///
/// Implementors issue exactly one request per call; retries are the
/// caller's business.
pub trait PageFetcher {
    /// Fetch the 1-based `page` of `query`.
    async fn fetch_page(&self, query: &QuerySpec, page: u32) -> Result<PageResult, FetchError>;
}

/// How the retry loop should treat a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Retryable,
    Fatal,
}

impl StatusClass {
    /// 2xx succeed; 408, 429 and 5xx are worth retrying; everything else is final.
    pub fn classify(status: u16) -> Self {
        match status {
            200..=299 => StatusClass::Success,
            408 | 429 | 500..=599 => StatusClass::Retryable,
            _ => StatusClass::Fatal,
        }
    }

    /// Classify a failed attempt.
    pub fn of_error(err: &FetchError) -> Self {
        match err {
            FetchError::Status { status, .. } => match Self::classify(*status) {
                // a "successful" status can't be an error; treat it as final
                StatusClass::Success => StatusClass::Fatal,
                class => class,
            },
            FetchError::Transport { .. } => StatusClass::Retryable,
            FetchError::Malformed { .. } => StatusClass::Fatal,
        }
    }
}

/// Exponential backoff schedule with a per-page attempt budget.
///
/// The delay after failed attempt `n` follows:
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts allowed per page, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failed attempt (doubles with each attempt).
    pub base_delay: Duration,
    /// Cap applied before jitter.
    pub max_delay: Duration,
    /// Upper bound of the uniform random jitter; zero disables it.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            max_jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            ..Self::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        Self::within_budget(attempt, self.max_attempts)
    }

    pub fn within_budget(attempt: u32, max_attempts: u32) -> bool {
        attempt < max_attempts
    }

    /// Wait before the attempt following failed attempt `attempt`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = Self::delay_for(attempt, self.base_delay).min(self.max_delay);
        if self.max_jitter.is_zero() {
            return delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=self.max_jitter.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }

    /// `base_delay * 2^(attempt-1)`, saturating.
    pub fn delay_for(attempt: u32, base_delay: Duration) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        base_delay.saturating_mul(factor)
    }
}

/// Drives a [`PageFetcher`] across every page of a query.
///
/// Pages are requested strictly in order because the total page count is
/// only known once the first page arrives.
pub struct IngestionClient<F> {
    fetcher: F,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl<F> fmt::Debug for IngestionClient<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionClient")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Per-run counters threaded through the page loop for error context.
#[derive(Debug, Default)]
struct Progress {
    pages_fetched: u32,
    requests: u32,
}

impl<F> IngestionClient<F>
where
    F: PageFetcher,
{
    pub fn new(fetcher: F, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one tied to Ctrl-C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every page of `query` and return the records in page order.
    ///
    /// # Errors
    ///
    /// - [`IngestionError::InvalidQuery`] before any request is made
    /// - [`IngestionError::Exhausted`] when a page runs out of attempts
    /// - [`IngestionError::FatalStatus`] / [`IngestionError::MalformedResponse`]
    ///   on the first non-retryable failure
    /// - [`IngestionError::Cancelled`] when the token fires
    ///
    /// Records gathered before a failure are discarded.
    #[instrument(
        level = "info",
        skip_all,
        fields(keyword = %query.keyword, from = %query.from_date, to = %query.to_date)
    )]
    pub async fn fetch_all(&self, query: &QuerySpec) -> Result<Vec<Record>, IngestionError> {
        if let Err(e) = query.validate() {
            error!(error = %e, "Refusing to start ingestion");
            return Err(e);
        }

        let t0 = Instant::now();
        let mut records: Vec<Record> = Vec::new();
        let mut progress = Progress::default();
        let mut current_page = 1u32;
        let mut total_pages = 1u32;

        while current_page <= total_pages {
            let page = self.fetch_page_with_retry(query, current_page, &mut progress).await?;
            total_pages = page.total_pages;
            progress.pages_fetched += 1;
            records.extend(page.items);

            info!(
                page = current_page,
                reported_page = page.page_number,
                total_pages,
                running_total = records.len(),
                "Fetched page"
            );
            current_page += 1;
        }

        if records.is_empty() {
            warn!("Query returned no records");
        }
        info!(
            count = records.len(),
            pages = progress.pages_fetched,
            requests = progress.requests,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Ingestion complete"
        );
        Ok(records)
    }

    async fn fetch_page_with_retry(
        &self,
        query: &QuerySpec,
        page: u32,
        progress: &mut Progress,
    ) -> Result<PageResult, IngestionError> {
        let mut attempt = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                warn!(page, pages_fetched = progress.pages_fetched, "Ingestion cancelled");
                return Err(IngestionError::Cancelled {
                    pages_fetched: progress.pages_fetched,
                });
            }

            attempt += 1;
            progress.requests += 1;
            let attempt_t0 = Instant::now();

            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    warn!(page, attempt, "Ingestion cancelled mid-request");
                    return Err(IngestionError::Cancelled {
                        pages_fetched: progress.pages_fetched,
                    });
                }
                r = self.fetcher.fetch_page(query, page) => r,
            };

            let e = match result {
                Ok(page_result) => return Ok(page_result),
                Err(e) => e,
            };
            let elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64;

            match StatusClass::of_error(&e) {
                StatusClass::Retryable => {}
                _ => {
                    error!(
                        keyword = %query.keyword,
                        from = %query.from_date,
                        to = %query.to_date,
                        page,
                        attempt,
                        error = %e,
                        "Page failed with a non-retryable error"
                    );
                    return Err(fatal_error(e, progress.pages_fetched));
                }
            }

            if !self.policy.should_retry(attempt) {
                error!(
                    keyword = %query.keyword,
                    from = %query.from_date,
                    to = %query.to_date,
                    page,
                    attempt,
                    max = self.policy.max_attempts,
                    elapsed_ms_attempt,
                    error = %e,
                    "Page exhausted retries"
                );
                return Err(IngestionError::Exhausted {
                    page,
                    attempts: attempt,
                    pages_fetched: progress.pages_fetched,
                    last_status: e.status(),
                    source: e,
                });
            }

            let delay = self.policy.next_delay(attempt);
            warn!(
                page,
                attempt,
                max = self.policy.max_attempts,
                elapsed_ms_attempt,
                ?delay,
                error = %e,
                "Page attempt failed; backing off"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    warn!(page, attempt, "Ingestion cancelled during backoff");
                    return Err(IngestionError::Cancelled {
                        pages_fetched: progress.pages_fetched,
                    });
                }
                _ = sleep(delay) => {}
            }
        }
    }
}

fn fatal_error(e: FetchError, pages_fetched: u32) -> IngestionError {
    match e {
        FetchError::Status { page, status } => IngestionError::FatalStatus {
            page,
            status,
            pages_fetched,
        },
        other => IngestionError::MalformedResponse {
            page: other.page(),
            pages_fetched,
            source: other,
        },
    }
}
