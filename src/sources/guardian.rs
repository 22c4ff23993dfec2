//! Guardian Content API page fetcher.
//!
//! This module queries the [Guardian Content API](https://open-platform.theguardian.com)
//! `/search` endpoint one page at a time.
//!
//! # Request
//!
//! ```text
//! GET {endpoint}?q=..&from-date=YYYY-MM-DD&to-date=YYYY-MM-DD
//!     &page-size=200&page=N&api-key=..&show-fields=headline,byline,sectionName,webPublicationDate
//! ```
//!
//! # Response
//!
//! Only `response.results` and `response.pages` are required; anything else
//! in the envelope is ignored.

use crate::api::{PAGE_SIZE, PageFetcher, StatusClass};
use crate::error::FetchError;
use crate::models::{PageResult, QuerySpec, Record};
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

/// Default search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://content.guardianapis.com/search";

/// Fields requested alongside each result.
const SHOW_FIELDS: &str = "headline,byline,sectionName,webPublicationDate";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    results: Vec<Record>,
    pages: u32,
    #[serde(default)]
    current_page: Option<u32>,
}

/// HTTP client for the `/search` endpoint.
pub struct GuardianClient {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl fmt::Debug for GuardianClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardianClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GuardianClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// The request URL carries the API key; drop it before the error travels.
fn transport_error(page: u32, source: reqwest::Error) -> FetchError {
    FetchError::Transport {
        page,
        source: source.without_url(),
    }
}

impl PageFetcher for GuardianClient {
    #[instrument(level = "debug", skip_all, fields(keyword = %query.keyword, page = page))]
    async fn fetch_page(&self, query: &QuerySpec, page: u32) -> Result<PageResult, FetchError> {
        let t0 = Instant::now();
        let from_date = query.from_date.format("%Y-%m-%d").to_string();
        let to_date = query.to_date.format("%Y-%m-%d").to_string();
        let page_size = PAGE_SIZE.to_string();
        let page_number = page.to_string();

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("q", query.keyword.as_str()),
                ("from-date", from_date.as_str()),
                ("to-date", to_date.as_str()),
                ("page-size", page_size.as_str()),
                ("page", page_number.as_str()),
                ("api-key", self.api_key.as_str()),
                ("show-fields", SHOW_FIELDS),
            ])
            .send()
            .await
            .map_err(|source| transport_error(page, source))?;

        let status = response.status().as_u16();
        if StatusClass::classify(status) != StatusClass::Success {
            let body = response.text().await.unwrap_or_default();
            warn!(
                page,
                status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body_preview = %truncate_for_log(&body, 300),
                "Search request failed"
            );
            return Err(FetchError::Status { page, status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| transport_error(page, source))?;
        let envelope: SearchEnvelope = serde_json::from_str(&body).map_err(|source| {
            warn!(
                page,
                error = %source,
                body_preview = %truncate_for_log(&body, 300),
                "Search response did not match the expected shape"
            );
            FetchError::Malformed { page, source }
        })?;

        let SearchResponse {
            results,
            pages,
            current_page,
        } = envelope.response;
        debug!(
            page,
            reported_page = ?current_page,
            pages,
            items = results.len(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Decoded search page"
        );

        Ok(PageResult {
            items: results,
            page_number: current_page.unwrap_or(page),
            total_pages: pages,
        })
    }
}
