//! Content sources that implement [`crate::api::PageFetcher`].
//!
//! Each source follows the same contract: one call issues exactly one HTTP
//! request for one page and classifies the outcome. Retrying, pagination and
//! accumulation are left to [`crate::api::IngestionClient`].
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | The Guardian | [`guardian`] | Content API `/search` | Requires API key; 200 results per page |

pub mod guardian;
