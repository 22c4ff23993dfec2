//! Article details for flagged days.

use crate::models::{DateEvents, EventDetail, Record};
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::HashMap;

/// Group the article records published on each of `dates`.
///
/// One [`DateEvents`] per distinct date, in the order the dates were given.
/// A date without articles gets an empty list. Articles within a day are
/// ordered by publication time.
pub fn details_for_dates(records: &[Record], dates: &[NaiveDate]) -> Vec<DateEvents> {
    let mut by_date: HashMap<NaiveDate, Vec<&Record>> = HashMap::new();
    for record in records.iter().filter(|r| r.is_article()) {
        by_date.entry(record.publication_date()).or_default().push(record);
    }

    dates
        .iter()
        .unique()
        .map(|date| {
            let articles = by_date
                .get(date)
                .map(|day| {
                    day.iter()
                        .sorted_by_key(|r| r.publication_timestamp)
                        .map(|r| EventDetail {
                            title: r.title.clone(),
                            category: r.category.clone(),
                            url: r.url.clone(),
                            publication_timestamp: r.publication_timestamp,
                        })
                        .collect()
                })
                .unwrap_or_default();
            DateEvents {
                date: *date,
                articles,
            }
        })
        .collect()
}
