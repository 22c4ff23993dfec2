//! # Guardian Trends
//!
//! Retrieves every Guardian article matching a keyword over a date range and
//! computes publication statistics over the retrieved corpus: a gap-free
//! daily series, per-section counts, calendar rollups and days with
//! unusually heavy or light coverage.
//!
//! ## Usage
//!
//! ```sh
//! guardian_trends -k "Justin Trudeau" -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Ingestion**: Drain every page of the search, retrying transient failures
//! 2. **Filtering**: Optionally keep only records whose title matches a text
//! 3. **Analysis**: Daily series, sections, rollup, anomalies, event details
//! 4. **Output**: Write JSON and Markdown reports (or print Markdown to stdout)

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod analysis;
mod api;
mod cli;
mod config;
mod error;
mod logging;
mod models;
mod outputs;
mod sources;
mod utils;

use analysis::AnalysisOptions;
use analysis::filter::filter_records;
use api::IngestionClient;
use cli::Cli;
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use models::QuerySpec;
use sources::guardian::GuardianClient;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let log_file = logging::init_tracing(args.log_dir.as_deref())?;

    let start_time = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), log_file = ?log_file, "guardian_trends starting up");
    debug!(?args.keyword, ?args.from_date, ?args.to_date, ?args.filter, "Parsed CLI arguments");

    let result = run(args).await;

    let elapsed = start_time.elapsed();
    match &result {
        Ok(()) => info!(?elapsed, secs = elapsed.as_secs(), "Execution complete"),
        Err(e) => error!(?elapsed, error = %e, "Execution failed"),
    }
    result
}

async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    // ---- Configuration ----
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH).to_path_buf());
    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_if_present(&config_path)?,
    };
    let api_key = config.api_key(args.api_key.as_deref(), &config_path)?;
    let policy = config.retry_policy()?;

    // ---- Query ----
    let query = QuerySpec::new(args.keyword.clone(), args.from_date, args.end_date(Utc::now()))?;
    info!(keyword = %query.keyword, from = %query.from_date, to = %query.to_date, "Query prepared");

    // Early check: output dirs must be writable before spending API quota
    for dir in [&args.json_output_dir, &args.markdown_output_dir].into_iter().flatten() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable (fix perms or choose a different path)");
            return Err(e.into());
        }
    }

    // ---- Ingestion ----
    let fetcher = GuardianClient::new(config.endpoint()?, api_key, config.request_timeout())?;
    info!(endpoint = %fetcher.endpoint(), ?policy, "Search client ready");

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling ingestion");
            ctrl_c_token.cancel();
        }
    });

    let ingestion = IngestionClient::new(fetcher, policy).with_cancellation(cancel);
    let records = ingestion.fetch_all(&query).await?;
    if records.is_empty() {
        warn!(keyword = %query.keyword, "No records retrieved; nothing to analyse");
        return Ok(());
    }

    // ---- Filtering ----
    let outcome = filter_records(records, args.filter.as_deref());
    if outcome.is_empty() {
        warn!(filter = ?args.filter, "Filter left no records; nothing to analyse");
        return Ok(());
    }
    debug!(kept = outcome.records().len(), "Records ready for analysis");
    let records = outcome.into_records();

    // ---- Analysis ----
    let options = AnalysisOptions {
        threshold: args.threshold,
        group_by: args.group_by,
        filter: args.filter.clone(),
    };
    let report = analysis::build_report(&records, &query, &options, Utc::now());
    info!(
        total_records = report.total_records,
        total_articles = report.total_articles,
        average_per_day = report.average_per_day,
        active_days = report.active_days,
        anomalies = report.anomalies.len(),
        "Analysis complete"
    );
    if let Some(top) = report.sections.first() {
        info!(section = %top.category, count = top.count, "Top section");
    }

    // ---- Output ----
    if let Some(dir) = &args.json_output_dir {
        outputs::json::write_report(&report, dir).await?;
    }
    match &args.markdown_output_dir {
        Some(dir) => {
            outputs::markdown::write_report(&report, dir, args.top).await?;
        }
        None if args.json_output_dir.is_none() => {
            println!("{}", outputs::markdown::report_to_markdown(&report, args.top));
        }
        None => {}
    }

    Ok(())
}
