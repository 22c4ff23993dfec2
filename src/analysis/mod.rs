//! Pure analytics over an already-fetched record set.
//!
//! Every function here borrows its input and returns fresh tables, so running
//! the same analysis twice over the same records yields identical output.
//!
//! # Submodules
//!
//! - [`filter`]: Optional case-insensitive text filter over the records
//! - [`series`]: Gap-free daily article counts and calendar rollups
//! - [`sections`]: Article counts per section, most frequent first
//! - [`anomalies`]: Days outside a standard-deviation band around the mean
//! - [`inspector`]: Article details for a set of flagged days
//!
//! # Flow
//!
//! ```text
//! records ─▶ filter ─▶ series ─▶ anomalies ─▶ inspector
//!                  └──▶ sections
//! ```

pub mod anomalies;
pub mod filter;
pub mod inspector;
pub mod sections;
pub mod series;

use crate::models::{QuerySpec, Record, TrendReport};
use chrono::{DateTime, NaiveDate, Utc};
use series::Granularity;
use tracing::{info, instrument};

/// Knobs for [`build_report`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub threshold: f64,
    pub group_by: Granularity,
    /// The filter that produced `records`, recorded in the report only.
    pub filter: Option<String>,
}

/// Run every analysis over `records` for the range of `query`.
#[instrument(level = "info", skip_all, fields(keyword = %query.keyword, records = records.len()))]
pub fn build_report(
    records: &[Record],
    query: &QuerySpec,
    options: &AnalysisOptions,
    generated_at: DateTime<Utc>,
) -> TrendReport {
    let daily = series::build_daily_series(records, query.from_date, query.to_date);
    let periods = series::rollup(&daily, options.group_by);
    let sections = sections::top_sections(records);
    let stats = anomalies::series_stats(&daily, options.threshold);
    let anomalies = anomalies::detect_anomalies(&daily, options.threshold);
    let flagged: Vec<NaiveDate> = anomalies.iter().map(|a| a.date).collect();
    let events = inspector::details_for_dates(records, &flagged);

    info!(
        days = daily.len(),
        articles = daily.total(),
        active_days = daily.active_days(),
        mean = stats.mean,
        std_dev = stats.std_dev,
        anomalies = anomalies.len(),
        sections = sections.len(),
        "Computed coverage statistics"
    );

    TrendReport {
        keyword: query.keyword.clone(),
        filter: options.filter.clone(),
        from_date: query.from_date,
        to_date: query.to_date,
        generated_at,
        total_records: records.len(),
        total_articles: daily.total(),
        average_per_day: daily.mean(),
        active_days: daily.active_days(),
        group_by: options.group_by.to_string(),
        stats,
        daily,
        periods,
        sections,
        anomalies,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{date, record};

    fn corpus() -> Vec<Record> {
        let mut records = Vec::new();
        for (i, day) in ["2018-01-01", "2018-01-02", "2018-01-03", "2018-01-04"].iter().enumerate() {
            records.push(record(&format!("d{i}"), "article", &format!("{day}T09:00:00Z"), Some("Politics")));
        }
        for i in 0..12 {
            records.push(record(&format!("s{i}"), "article", "2018-01-05T12:00:00Z", Some("World news")));
        }
        records.push(record("blog", "liveblog", "2018-01-05T13:00:00Z", Some("World news")));
        records
    }

    fn options() -> AnalysisOptions {
        AnalysisOptions {
            threshold: 1.5,
            group_by: Granularity::Week,
            filter: None,
        }
    }

    #[test]
    fn test_build_report_end_to_end() {
        let records = corpus();
        let query = QuerySpec::new("Trudeau", date("2018-01-01"), date("2018-01-07")).unwrap();
        let report = build_report(&records, &query, &options(), Utc::now());

        assert_eq!(report.total_records, 17);
        assert_eq!(report.total_articles, 16);
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.active_days, 5);
        assert_eq!(report.sections[0].category, "World news");
        assert_eq!(report.sections[0].count, 12);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].date, date("2018-01-05"));
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].articles.len(), 12);
        assert_eq!(report.group_by, "week");
        assert_eq!(report.periods.len(), 1);
    }

    #[test]
    fn test_build_report_is_idempotent() {
        let records = corpus();
        let query = QuerySpec::new("Trudeau", date("2018-01-01"), date("2018-01-07")).unwrap();
        let at = Utc::now();

        let first = build_report(&records, &query, &options(), at);
        let second = build_report(&records, &query, &options(), at);
        assert_eq!(first.daily, second.daily);
        assert_eq!(first.sections, second.sections);
        assert_eq!(first.anomalies, second.anomalies);
        assert_eq!(first.events, second.events);
        assert_eq!(records, corpus());
    }
}
