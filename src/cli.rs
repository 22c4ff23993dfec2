//! Command-line interface definitions for Guardian Trends.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The API key can be provided via flag, environment variable or config file.

use crate::analysis::anomalies::DEFAULT_THRESHOLD;
use crate::analysis::series::Granularity;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Guardian Trends application.
///
/// # Examples
///
/// ```sh
/// # Everything about a keyword since 2018, up to today
/// guardian_trends -k "Justin Trudeau"
///
/// # A narrower window, only headlines mentioning "election", weekly rollup
/// guardian_trends -k "Justin Trudeau" --from-date 2019-01-01 --to-date 2019-12-31 \
///     --filter election --group-by week -j ./json -m ./markdown
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search keyword sent to the content API
    #[arg(short, long)]
    pub keyword: String,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long, default_value = "2018-01-01")]
    pub from_date: NaiveDate,

    /// Last day of the range (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long)]
    pub to_date: Option<NaiveDate>,

    /// Only analyse records whose title or headline contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Anomaly band width in standard deviations
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
    pub threshold: f64,

    /// Calendar bucket for the publication rollup
    #[arg(short, long, value_enum, default_value_t = Granularity::Month)]
    pub group_by: Granularity,

    /// Number of sections to show in the Markdown report
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Guardian Content API key
    #[arg(long, env = "GUARDIAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown report
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Also write logs to DIR/YYYYMMDD/<run>.log
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Last day of the range; without `--to-date`, the UTC date of `now`.
    ///
    /// Publication timestamps are bucketed by UTC date, so "today" must be too.
    pub fn end_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_date.unwrap_or_else(|| now.date_naive())
    }
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err("threshold must be a finite number greater than zero".to_string())
    }
}
