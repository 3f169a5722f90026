//! JSON location-stats export for the map generator

use crate::output::traits::OutputResult;
use crate::reconcile::{AggregateStat, InventoryReport, TierThresholds};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
struct Totals {
    records: usize,
    duplicates: usize,
    overlap_percentage: f64,
    located: usize,
    unresolved: usize,
    unlocated: usize,
}

#[derive(Debug, Serialize)]
struct LocationStatsExport<'a> {
    generated_at: DateTime<Utc>,
    thresholds: TierThresholds,
    totals: Totals,
    locations: Vec<&'a AggregateStat>,
}

impl<'a> LocationStatsExport<'a> {
    fn from_report(report: &'a InventoryReport) -> Self {
        Self {
            generated_at: report.generated_at,
            thresholds: report.thresholds,
            totals: Totals {
                records: report.total_records,
                duplicates: report.duplicate_count(),
                overlap_percentage: report.overlap_percentage(),
                located: report.aggregation.located,
                unresolved: report.aggregation.unresolved,
                unlocated: report.aggregation.unlocated,
            },
            locations: report.aggregation.ranked(),
        }
    }
}

/// Serializes per-location statistics to a pretty-printed JSON string
pub fn format_location_stats(report: &InventoryReport) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(
        &LocationStatsExport::from_report(report),
    )?)
}

/// Writes per-location statistics as JSON
///
/// Locations are ordered by total, largest first, and every known location
/// is present even when it has no inventory.
pub fn write_location_stats(report: &InventoryReport, output_path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, &LocationStatsExport::from_report(report))?;
    writer.flush()?;

    tracing::info!("Wrote location stats to {}", output_path.display());
    Ok(())
}
