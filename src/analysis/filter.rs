//! Optional text filter applied to the ingested records.

use crate::models::Record;
use tracing::{info, warn};

/// Result of [`filter_records`].
///
/// `Empty` is kept apart from an unfiltered empty list so callers can tell
/// "nothing matched" from "nothing was asked for".
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// No predicate was given; the input is returned untouched.
    Unfiltered(Vec<Record>),
    /// At least one record matched the predicate.
    Matched(Vec<Record>),
    /// A predicate was given and nothing matched.
    Empty,
}

impl FilterOutcome {
    pub fn records(&self) -> &[Record] {
        match self {
            FilterOutcome::Unfiltered(records) | FilterOutcome::Matched(records) => records,
            FilterOutcome::Empty => &[],
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            FilterOutcome::Unfiltered(records) | FilterOutcome::Matched(records) => records,
            FilterOutcome::Empty => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Keep records whose title or headline contains `predicate`, ignoring case.
///
/// A missing or blank predicate returns the input unchanged.
pub fn filter_records(records: Vec<Record>, predicate: Option<&str>) -> FilterOutcome {
    let Some(needle) = predicate.map(str::trim).filter(|p| !p.is_empty()) else {
        return FilterOutcome::Unfiltered(records);
    };
    let needle = needle.to_lowercase();
    let before = records.len();

    let matched: Vec<Record> = records
        .into_iter()
        .filter(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.headline().is_some_and(|h| h.to_lowercase().contains(&needle))
        })
        .collect();

    if matched.is_empty() {
        warn!(predicate = %needle, before, "Filter matched no records");
        FilterOutcome::Empty
    } else {
        info!(predicate = %needle, before, after = matched.len(), "Filtered records");
        FilterOutcome::Matched(matched)
    }
}
