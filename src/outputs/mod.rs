//! Output generation for computed trend reports.
//!
//! Both writers consume an already computed [`crate::models::TrendReport`];
//! nothing here recomputes statistics.
//!
//! # Submodules
//!
//! - [`json`]: Writes the full report as JSON for downstream charting
//! - [`markdown`]: Renders a human-readable Markdown report
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── justin-trudeau/
//!     └── 2025-05-06.json
//!
//! markdown_output_dir/
//! └── justin-trudeau_2025-05-06.md
//! ```

pub mod json;
pub mod markdown;
