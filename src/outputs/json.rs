//! JSON output of a trend report.
//!
//! Files are organized per keyword, one file per range end date:
//! ```text
//! json_output_dir/
//! └── justin-trudeau/
//!     └── 2025-05-06.json
//! ```
//! Re-running on the same day overwrites that day's file.

use crate::models::TrendReport;
use crate::utils::slugify;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `report` as pretty JSON under `json_output_dir`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &TrendReport,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(slugify(&report.keyword));
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join(format!("{}.json", report.to_date));
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename.display(), "Wrote JSON report");

    Ok(output_json_filename)
}
