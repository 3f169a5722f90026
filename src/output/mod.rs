//! Output module for inventory summaries and reports
//!
//! This module handles:
//! - Printing the end-of-run summary
//! - Writing the markdown location report
//! - Exporting per-location statistics as JSON

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::{format_location_stats, write_location_stats};
pub use markdown::{format_markdown_report, write_markdown_report};
pub use stats::print_summary;
pub use traits::{OutputError, OutputResult, RunMode, RunSummary, SourceSummary};

use crate::config::OutputConfig;
use crate::reconcile::InventoryReport;
use std::path::Path;

/// Writes every configured report file
///
/// # Arguments
///
/// * `report` - The reconciled inventory report
/// * `run` - Run metadata and per-source statistics
/// * `config` - Output paths
pub fn write_reports(
    report: &InventoryReport,
    run: &RunSummary,
    config: &OutputConfig,
) -> OutputResult<()> {
    write_markdown_report(report, run, Path::new(&config.summary_path))?;
    write_location_stats(report, Path::new(&config.stats_path))?;
    Ok(())
}
