//! Process-wide tracing setup.
//!
//! Console logs go to stderr so a report printed to stdout stays clean. With `--log-dir` every run also gets its own
//! plain-text file under a per-day folder:
//!
//! ```text
//! logs/
//! └── 20250506/
//!     ├── guardian_trends_20250506_081502.log
//!     └── guardian_trends_20250506_174233.log
//! ```

use chrono::{DateTime, Local};
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt as tfmt};

/// Where this run's log file goes inside `log_dir`.
pub fn log_file_path(log_dir: &Path, now: DateTime<Local>) -> PathBuf {
    log_dir.join(now.format("%Y%m%d").to_string()).join(format!(
        "{}_{}.log",
        env!("CARGO_PKG_NAME"),
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Human-readable console layer writing to `writer`.
fn console_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
}

/// Install the global subscriber. Call once, first thing in `main`.
///
/// Returns the path of the log file when `log_dir` is given.
pub fn init_tracing(log_dir: Option<&Path>) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            let path = log_file_path(dir, Local::now());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(&path)?;
            let layer = tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(log_path)
}
