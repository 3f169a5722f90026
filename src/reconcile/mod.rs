//! Reconciliation of harvested inventory
//!
//! This module provides:
//! - The location reference table
//! - Cross-source duplicate matching
//! - Per-location aggregation with tier classification
//! - Assembly of the full inventory report

pub mod aggregate;
pub mod locations;
pub mod matcher;

pub use aggregate::{aggregate, AggregateStat, Aggregation, SourceCounts, Tier, TierThresholds};
pub use locations::{LocationEntry, LocationTable};
pub use matcher::{flag_duplicates, match_sources, MatchKey, MatchReport};

use crate::inventory::InventoryRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the reporting layer needs about one reconciled record set
#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,

    pub total_records: usize,

    /// Record counts per configured source name, duplicates included
    pub records_by_source: BTreeMap<String, usize>,

    /// Record counts per source kind, duplicates included
    pub records_by_kind: SourceCounts,

    /// Present only when both primary and secondary records exist
    pub matches: Option<MatchReport>,

    pub aggregation: Aggregation,

    pub thresholds: TierThresholds,
}

impl InventoryReport {
    pub fn duplicate_count(&self) -> usize {
        self.matches.as_ref().map_or(0, |m| m.duplicate_count)
    }

    pub fn overlap_percentage(&self) -> f64 {
        self.matches
            .as_ref()
            .map_or(0.0, MatchReport::overlap_percentage)
    }
}

/// Matches, flags and aggregates a full record set
///
/// Primary (new and used) records form the base set and secondary records
/// are matched against it. Existing duplicate flags are cleared first, so a
/// reloaded run is reconciled from scratch.
///
/// # Arguments
///
/// * `records` - All harvested records; duplicate flags are updated in place
/// * `table` - Reference table of known locations
/// * `thresholds` - Tier thresholds for this pass
pub fn build_report(
    records: &mut [InventoryRecord],
    table: &LocationTable,
    thresholds: TierThresholds,
) -> InventoryReport {
    for record in records.iter_mut() {
        record.duplicate = false;
    }

    let secondary_positions: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.source.is_primary())
        .map(|(i, _)| i)
        .collect();
    let has_primary = secondary_positions.len() < records.len();

    let matches = if has_primary && !secondary_positions.is_empty() {
        let report = match_sources(
            records.iter().filter(|r| r.source.is_primary()),
            secondary_positions.iter().map(|&i| &records[i]),
        );
        for &position in &report.duplicate_indices {
            records[secondary_positions[position]].duplicate = true;
        }

        tracing::info!(
            "{} of {} secondary records duplicate primary inventory ({:.1}%)",
            report.duplicate_count,
            report.total_b,
            report.overlap_percentage()
        );
        Some(report)
    } else {
        tracing::debug!("Skipping cross-source matching: need both primary and secondary records");
        None
    };

    let mut records_by_source = BTreeMap::new();
    let mut records_by_kind = SourceCounts::default();
    for record in records.iter() {
        *records_by_source
            .entry(record.source_name.clone())
            .or_insert(0) += 1;
        records_by_kind.increment(record.source);
    }

    let aggregation = aggregate(records, table, thresholds);

    InventoryReport {
        generated_at: Utc::now(),
        total_records: records.len(),
        records_by_source,
        records_by_kind,
        matches,
        aggregation,
        thresholds,
    }
}
