//! Markdown rendering of a trend report.

use crate::models::TrendReport;
use crate::utils::slugify;
use std::error::Error;
use std::fmt::Write;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Escape characters that would break a table cell or link text.
fn escape(text: &str) -> String {
    text.replace('|', "\\|")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Render `report` as a Markdown document, listing at most `top` sections.
pub fn report_to_markdown(report: &TrendReport, top: usize) -> String {
    let mut md = String::new();

    // writing into a String cannot fail
    let _ = writeln!(md, "# Coverage report: {}\n", escape(&report.keyword));
    let _ = writeln!(
        md,
        "_{} to {} · generated {}_\n",
        report.from_date,
        report.to_date,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(filter) = &report.filter {
        let _ = writeln!(md, "Filtered to titles containing `{filter}`.\n");
    }

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "| Metric | Value |\n|---|---|");
    let _ = writeln!(md, "| Records retrieved | {} |", report.total_records);
    let _ = writeln!(md, "| Articles | {} |", report.total_articles);
    let _ = writeln!(md, "| Average articles per day | {:.2} |", report.average_per_day);
    let _ = writeln!(
        md,
        "| Days with coverage | {} of {} |",
        report.active_days,
        report.daily.len()
    );
    match report.sections.first() {
        Some(section) => {
            let _ = writeln!(
                md,
                "| Top section | {} ({}) |",
                escape(&section.category),
                section.count
            );
        }
        None => {
            let _ = writeln!(md, "| Top section | none |");
        }
    }

    let _ = writeln!(md, "\n## Articles by section\n");
    let _ = writeln!(md, "| Section | Articles |\n|---|---|");
    for section in report.sections.iter().take(top) {
        let _ = writeln!(md, "| {} | {} |", escape(&section.category), section.count);
    }

    let _ = writeln!(md, "\n## Articles by {}\n", report.group_by);
    let _ = writeln!(md, "| Period starting | Articles |\n|---|---|");
    for period in &report.periods {
        let _ = writeln!(md, "| {} | {} |", period.period_start, period.count);
    }

    let stats = &report.stats;
    let _ = writeln!(md, "\n## Unusual coverage\n");
    let _ = writeln!(
        md,
        "Mean {:.2} articles/day, σ {:.2}; flagged outside {:.2} ± {}σ = [{:.2}, {:.2}].\n",
        stats.mean, stats.std_dev, stats.mean, stats.threshold, stats.lower, stats.upper
    );
    if report.anomalies.is_empty() {
        let _ = writeln!(md, "No day fell outside the band.");
    } else {
        let _ = writeln!(md, "| Date | Articles |\n|---|---|");
        for anomaly in &report.anomalies {
            let _ = writeln!(md, "| {} | {} |", anomaly.date, anomaly.count);
        }
    }

    if !report.events.is_empty() {
        let _ = writeln!(md, "\n## Event details");
        for day in &report.events {
            let _ = writeln!(md, "\n### {} ({} articles)\n", day.date, day.articles.len());
            if day.articles.is_empty() {
                let _ = writeln!(md, "_No articles found for this date._");
            }
            for article in &day.articles {
                let section = article
                    .category
                    .as_deref()
                    .map(|c| format!(" <small>`{c}`</small>"))
                    .unwrap_or_default();
                let _ = writeln!(
                    md,
                    "- {} [{}]({}){}",
                    article.publication_timestamp.format("%H:%M"),
                    escape(&article.title),
                    article.url,
                    section
                );
            }
        }
    }

    md
}

/// Render and write `report` to `{markdown_output_dir}/{keyword-slug}_{to-date}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    report: &TrendReport,
    markdown_output_dir: &str,
    top: usize,
) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(markdown_output_dir).await?;
    let path = PathBuf::from(markdown_output_dir).join(format!(
        "{}_{}.md",
        slugify(&report.keyword),
        report.to_date
    ));
    fs::write(&path, report_to_markdown(report, top)).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::tests::date;
    use crate::models::{
        AnomalyEntry, DailyCount, DailySeries, DateEvents, EventDetail, PeriodCount, SectionCount,
        SeriesStats,
    };
    use chrono::{TimeZone, Utc};

    pub(crate) fn sample_report() -> TrendReport {
        let daily = DailySeries::from_entries(vec![
            DailyCount { date: date("2019-10-22"), count: 0 },
            DailyCount { date: date("2019-10-23"), count: 3 },
            DailyCount { date: date("2019-10-24"), count: 0 },
            DailyCount { date: date("2019-10-25"), count: 1 },
        ]);
        TrendReport {
            keyword: "Justin Trudeau".to_string(),
            filter: None,
            from_date: date("2019-10-22"),
            to_date: date("2019-10-25"),
            generated_at: Utc.with_ymd_and_hms(2019, 10, 26, 9, 0, 0).unwrap(),
            total_records: 5,
            total_articles: 4,
            average_per_day: 1.0,
            active_days: 2,
            group_by: "month".to_string(),
            stats: SeriesStats {
                mean: 1.0,
                std_dev: 1.22,
                threshold: 1.5,
                lower: -0.83,
                upper: 2.83,
            },
            daily,
            periods: vec![PeriodCount { period_start: date("2019-10-01"), count: 4 }],
            sections: vec![
                SectionCount { category: "World news".to_string(), count: 3 },
                SectionCount { category: "Politics".to_string(), count: 1 },
            ],
            anomalies: vec![AnomalyEntry { date: date("2019-10-23"), count: 3 }],
            events: vec![DateEvents {
                date: date("2019-10-23"),
                articles: vec![EventDetail {
                    title: "Trudeau wins [second] term".to_string(),
                    category: Some("World news".to_string()),
                    url: "https://www.theguardian.com/world/trudeau".to_string(),
                    publication_timestamp: Utc.with_ymd_and_hms(2019, 10, 23, 4, 12, 0).unwrap(),
                }],
            }],
        }
    }

    #[test]
    fn test_report_sections() {
        let md = report_to_markdown(&sample_report(), 10);
        assert!(md.starts_with("# Coverage report: Justin Trudeau"));
        assert!(md.contains("| Days with coverage | 2 of 4 |"));
        assert!(md.contains("| Top section | World news (3) |"));
        assert!(md.contains("## Articles by month"));
        assert!(md.contains("| 2019-10-01 | 4 |"));
        assert!(md.contains("| 2019-10-23 | 3 |"));
        assert!(md.contains("### 2019-10-23 (1 articles)"));
        assert!(md.contains(
            "- 04:12 [Trudeau wins \\[second\\] term](https://www.theguardian.com/world/trudeau) <small>`World news`</small>"
        ));
    }

    #[test]
    fn test_top_limits_section_rows() {
        let md = report_to_markdown(&sample_report(), 1);
        assert!(md.contains("| World news | 3 |"));
        assert!(!md.contains("| Politics | 1 |"));
    }

    #[test]
    fn test_empty_anomalies_and_empty_event_day() {
        let mut report = sample_report();
        report.anomalies.clear();
        report.events[0].articles.clear();
        let md = report_to_markdown(&report, 10);
        assert!(md.contains("No day fell outside the band."));
        assert!(md.contains("_No articles found for this date._"));
    }

    #[tokio::test]
    async fn test_write_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&sample_report(), dir.path().to_str().unwrap(), 10)
            .await
            .unwrap();
        assert!(path.ends_with("justin-trudeau_2019-10-25.md"));
        assert!(std::fs::read_to_string(path).unwrap().contains("## Summary"));
    }
}
