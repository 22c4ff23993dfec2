//! Error types for configuration, page fetches and whole ingestion runs.
//!
//! Two levels are kept apart:
//! - [`FetchError`]: one failed attempt at one page. Retryable variants are
//!   absorbed by the retry loop in [`crate::api`].
//! - [`IngestionError`]: the run as a whole failed. Partial results are
//!   never returned alongside it.

use chrono::NaiveDate;
use thiserror::Error;

/// A single page request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("page {page} returned HTTP {status}")]
    Status { page: u32, status: u16 },

    /// No usable response (connect failure, timeout, truncated body).
    #[error("transport error on page {page}: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The body did not have the `response.results` / `response.pages` shape.
    #[error("malformed response on page {page}: {source}")]
    Malformed {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Status { page, .. }
            | FetchError::Transport { page, .. }
            | FetchError::Malformed { page, .. } => *page,
        }
    }

    /// HTTP status, when the server got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            FetchError::Malformed { .. } => None,
        }
    }
}

/// An ingestion run failed and produced no records.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Rejected before any network call.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// A page kept failing until its retry budget ran out.
    #[error(
        "page {page} failed after {attempts} attempts (last status: {}; {pages_fetched} pages fetched)",
        display_status(*.last_status)
    )]
    Exhausted {
        page: u32,
        attempts: u32,
        pages_fetched: u32,
        last_status: Option<u16>,
        #[source]
        source: FetchError,
    },

    /// The server answered with a status that retrying cannot fix.
    #[error("page {page} rejected with HTTP {status} ({pages_fetched} pages fetched)")]
    FatalStatus {
        page: u32,
        status: u16,
        pages_fetched: u32,
    },

    /// A page could not be decoded.
    #[error("malformed response on page {page} ({pages_fetched} pages fetched)")]
    MalformedResponse {
        page: u32,
        pages_fetched: u32,
        #[source]
        source: FetchError,
    },

    /// The run was cancelled before it completed.
    #[error("ingestion cancelled after {pages_fetched} pages")]
    Cancelled { pages_fetched: u32 },
}

fn display_status(status: Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// Startup configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no API key: set guardian_api.api_key in {path}, pass --api-key or set GUARDIAN_API_KEY")]
    MissingApiKey { path: String },

    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid retry settings: {0}")]
    InvalidRetry(String),
}

/// Reason text for an inverted date range.
pub fn inverted_range_reason(from: NaiveDate, to: NaiveDate) -> String {
    format!("from-date {from} is after to-date {to}")
}
