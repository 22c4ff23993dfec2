//! Gap-free daily article counts.
//!
//! The calendar is generated independently of the records so days without a
//! single article still show up with a zero count.

use crate::models::{DailyCount, DailySeries, PeriodCount, Record};
use chrono::{Datelike, Days, NaiveDate};
use clap::ValueEnum;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

/// Build one entry per calendar day from `from_date` to `today`, inclusive.
///
/// Only article records are counted; each is counted once, on its UTC
/// publication date. Records outside the range are ignored. An inverted
/// range yields an empty series.
pub fn build_daily_series(records: &[Record], from_date: NaiveDate, today: NaiveDate) -> DailySeries {
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for record in records.iter().filter(|r| r.is_article()) {
        *per_day.entry(record.publication_date()).or_insert(0) += 1;
    }

    let entries = from_date
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|date| DailyCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect();

    DailySeries::from_entries(entries)
}

/// Calendar bucket used by [`rollup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Granularity {
    Day,
    /// ISO weeks, starting on Monday.
    Week,
    #[default]
    Month,
    Year,
}

impl Granularity {
    /// First day of the bucket containing `date`.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            Granularity::Month => date.with_day(1).unwrap_or(date),
            Granularity::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        };
        f.write_str(name)
    }
}

/// Sum a daily series into calendar buckets, ordered by bucket start.
pub fn rollup(series: &DailySeries, granularity: Granularity) -> Vec<PeriodCount> {
    let chunks = series.iter().chunk_by(|entry| granularity.period_start(entry.date));
    let mut periods = Vec::new();
    for (period_start, entries) in &chunks {
        periods.push(PeriodCount {
            period_start,
            count: entries.map(|e| e.count).sum(),
        });
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{date, record};

    fn counts(series: &DailySeries) -> Vec<(String, u64)> {
        series
            .iter()
            .map(|e| (e.date.format("%m-%d").to_string(), e.count))
            .collect()
    }

    #[test]
    fn test_empty_records_yield_zero_filled_calendar() {
        let series = build_daily_series(&[], date("2018-01-01"), date("2018-01-05"));
        assert_eq!(series.len(), 5);
        assert!(series.iter().all(|e| e.count == 0));
        assert_eq!(series.iter().next().map(|e| e.date), Some(date("2018-01-01")));
        assert_eq!(series.iter().last().map(|e| e.date), Some(date("2018-01-05")));
    }

    #[test]
    fn test_counts_only_articles() {
        let records = vec![
            record("a", "article", "2018-01-02T08:00:00Z", None),
            record("b", "article", "2018-01-02T21:30:00Z", None),
            record("c", "liveblog", "2018-01-02T12:00:00Z", None),
        ];
        let series = build_daily_series(&records, date("2018-01-01"), date("2018-01-03"));
        assert_eq!(
            counts(&series),
            vec![
                ("01-01".to_string(), 0),
                ("01-02".to_string(), 2),
                ("01-03".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_records_outside_range_are_ignored() {
        let records = vec![
            record("early", "article", "2017-12-31T23:59:59Z", None),
            record("in", "article", "2018-01-01T00:00:00Z", None),
            record("late", "article", "2018-01-03T00:00:01Z", None),
        ];
        let series = build_daily_series(&records, date("2018-01-01"), date("2018-01-02"));
        assert_eq!(series.total(), 1);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let series = build_daily_series(&[], date("2018-01-05"), date("2018-01-01"));
        assert!(series.is_empty());
    }

    #[test]
    fn test_single_day_range() {
        let records = vec![record("a", "article", "2018-01-01T10:00:00Z", None)];
        let series = build_daily_series(&records, date("2018-01-01"), date("2018-01-01"));
        assert_eq!(series.len(), 1);
        assert_eq!(series.total(), 1);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let records = vec![
            record("a", "article", "2018-01-02T08:00:00Z", None),
            record("b", "article", "2018-01-04T08:00:00Z", None),
        ];
        let first = build_daily_series(&records, date("2018-01-01"), date("2018-01-05"));
        let second = build_daily_series(&records, date("2018-01-01"), date("2018-01-05"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_period_start() {
        // 2018-01-03 was a Wednesday
        let d = date("2018-01-03");
        assert_eq!(Granularity::Day.period_start(d), d);
        assert_eq!(Granularity::Week.period_start(d), date("2018-01-01"));
        assert_eq!(Granularity::Month.period_start(date("2018-02-17")), date("2018-02-01"));
        assert_eq!(Granularity::Year.period_start(date("2018-07-04")), date("2018-01-01"));
    }

    #[test]
    fn test_rollup_by_month() {
        let records = vec![
            record("a", "article", "2018-01-15T08:00:00Z", None),
            record("b", "article", "2018-01-31T08:00:00Z", None),
            record("c", "article", "2018-02-01T08:00:00Z", None),
        ];
        let series = build_daily_series(&records, date("2018-01-10"), date("2018-03-02"));
        let periods = rollup(&series, Granularity::Month);

        assert_eq!(
            periods,
            vec![
                PeriodCount { period_start: date("2018-01-01"), count: 2 },
                PeriodCount { period_start: date("2018-02-01"), count: 1 },
                PeriodCount { period_start: date("2018-03-01"), count: 0 },
            ]
        );
    }

    #[test]
    fn test_rollup_by_week_keeps_total() {
        let records = vec![
            record("a", "article", "2018-01-01T08:00:00Z", None),
            record("b", "article", "2018-01-08T08:00:00Z", None),
            record("c", "article", "2018-01-14T08:00:00Z", None),
        ];
        let series = build_daily_series(&records, date("2018-01-01"), date("2018-01-20"));
        let periods = rollup(&series, Granularity::Week);

        assert_eq!(periods.len(), 3);
        assert_eq!(periods[1].period_start, date("2018-01-08"));
        assert_eq!(periods[1].count, 2);
        assert_eq!(periods.iter().map(|p| p.count).sum::<u64>(), series.total());
    }
}
