//! Per-location aggregation and tiering

use crate::inventory::{InventoryRecord, SourceKind};
use crate::reconcile::locations::LocationTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Inventory-volume class of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts above which a location is HIGH or MEDIUM
///
/// Two independent sets exist: one applied at crawl time and one applied
/// when reporting over a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high: u32,
    pub medium: u32,
}

impl TierThresholds {
    pub const CRAWL: Self = Self {
        high: 50,
        medium: 20,
    };

    pub const REPORT: Self = Self {
        high: 150,
        medium: 100,
    };

    /// Classifies a location total
    ///
    /// HIGH when `count > high`, MEDIUM when `count > medium`, LOW otherwise.
    pub fn classify(&self, count: u32) -> Tier {
        if count > self.high {
            Tier::High
        } else if count > self.medium {
            Tier::Medium
        } else {
            Tier::Low
        }
    }
}

/// Per-source record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub new: u32,
    pub used: u32,
    pub secondary: u32,
}

impl SourceCounts {
    pub fn increment(&mut self, kind: SourceKind) {
        match kind {
            SourceKind::New => self.new += 1,
            SourceKind::Used => self.used += 1,
            SourceKind::Secondary => self.secondary += 1,
        }
    }

    pub fn get(&self, kind: SourceKind) -> u32 {
        match kind {
            SourceKind::New => self.new,
            SourceKind::Used => self.used,
            SourceKind::Secondary => self.secondary,
        }
    }

    pub fn total(&self) -> u32 {
        self.new + self.used + self.secondary
    }
}

/// Inventory totals for one known location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStat {
    pub location: String,
    pub label: String,
    pub lat: f64,
    pub lng: f64,

    /// Non-duplicate records attributed here
    pub total: u32,

    pub by_source: SourceCounts,

    /// Secondary records already counted under a primary source
    pub duplicates: u32,

    pub tier: Tier,
}

/// Aggregation result over a full record set
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    /// One stat per table entry, keyed by canonical name
    pub stats: BTreeMap<String, AggregateStat>,

    /// Records attributed to a known location, duplicates included
    pub located: usize,

    /// Records with a location the table does not know
    pub unresolved: usize,

    /// Records with no location at all
    pub unlocated: usize,
}

impl Aggregation {
    /// Number of locations in each tier
    pub fn tier_counts(&self) -> BTreeMap<Tier, usize> {
        let mut counts = BTreeMap::new();
        for stat in self.stats.values() {
            *counts.entry(stat.tier).or_insert(0) += 1;
        }
        counts
    }

    /// Stats ordered by total, largest first
    pub fn ranked(&self) -> Vec<&AggregateStat> {
        let mut ranked: Vec<_> = self.stats.values().collect();
        ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.location.cmp(&b.location)));
        ranked
    }
}

/// Attributes records to known locations and classifies each location
///
/// Every table entry gets a stat, including those with no records. Records
/// with an empty or unknown location are counted but attributed nowhere.
/// Records flagged as duplicates only raise the location's duplicate count.
///
/// # Arguments
///
/// * `records` - Records to aggregate, duplicate flags already set
/// * `table` - Reference table of known locations
/// * `thresholds` - Tier thresholds to classify with
pub fn aggregate(
    records: &[InventoryRecord],
    table: &LocationTable,
    thresholds: TierThresholds,
) -> Aggregation {
    let mut aggregation = Aggregation {
        stats: table
            .entries()
            .map(|entry| {
                (
                    entry.name.clone(),
                    AggregateStat {
                        location: entry.name.clone(),
                        label: entry.label.clone(),
                        lat: entry.lat,
                        lng: entry.lng,
                        total: 0,
                        by_source: SourceCounts::default(),
                        duplicates: 0,
                        tier: Tier::Low,
                    },
                )
            })
            .collect(),
        ..Aggregation::default()
    };

    for record in records {
        if !record.has_location() {
            aggregation.unlocated += 1;
            continue;
        }

        let stat = match table
            .resolve(&record.location)
            .and_then(|entry| aggregation.stats.get_mut(&entry.name))
        {
            Some(stat) => stat,
            None => {
                tracing::debug!("Unknown location '{}'", record.location);
                aggregation.unresolved += 1;
                continue;
            }
        };

        aggregation.located += 1;
        if record.duplicate {
            stat.duplicates += 1;
        } else {
            stat.total += 1;
            stat.by_source.increment(record.source);
        }
    }

    for stat in aggregation.stats.values_mut() {
        stat.tier = thresholds.classify(stat.total);
    }

    aggregation
}
