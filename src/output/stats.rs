//! Summary statistics printed at the end of a run

use crate::output::traits::RunSummary;
use crate::reconcile::{InventoryReport, Tier};

/// Number of locations listed in the printed summary
const TOP_LOCATIONS: usize = 10;

/// Prints the run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The reconciled inventory report
/// * `run` - Run metadata and per-source crawl statistics
pub fn print_summary(report: &InventoryReport, run: &RunSummary) {
    println!("=== Inventory Summary ({}) ===\n", run.mode.as_str());

    if let Some(run_id) = run.run_id {
        println!("Run: {}", run_id);
    }
    println!("Total records: {}", report.total_records);
    println!();

    println!("Sources:");
    for source in &run.sources {
        match (&source.termination, source.pages_fetched) {
            (Some(termination), Some(pages)) => println!(
                "  {} [{}]: {} records from {} pages ({})",
                source.name, source.kind, source.records, pages, termination
            ),
            _ => println!(
                "  {} [{}]: {} records",
                source.name, source.kind, source.records
            ),
        }
    }
    println!();

    match &report.matches {
        Some(matches) => {
            println!("Cross-source matching:");
            println!("  Duplicates: {}", matches.duplicate_count);
            println!("  Unique to primary sources: {}", matches.unique_a);
            println!("  Unique to secondary sources: {}", matches.unique_b);
            println!("  Overlap: {:.1}%", matches.overlap_percentage());
        }
        None => println!("Cross-source matching: skipped (single source kind)"),
    }
    println!();

    let aggregation = &report.aggregation;
    println!("Locations:");
    println!("  Attributed records: {}", aggregation.located);
    println!("  Unknown locations: {}", aggregation.unresolved);
    println!("  Missing locations: {}", aggregation.unlocated);

    let tiers = aggregation.tier_counts();
    println!(
        "  Tiers (>{} HIGH, >{} MEDIUM): {} HIGH, {} MEDIUM, {} LOW",
        report.thresholds.high,
        report.thresholds.medium,
        tiers.get(&Tier::High).copied().unwrap_or(0),
        tiers.get(&Tier::Medium).copied().unwrap_or(0),
        tiers.get(&Tier::Low).copied().unwrap_or(0)
    );
    println!();

    let ranked = aggregation.ranked();
    if !ranked.is_empty() {
        println!("Top locations:");
        for stat in ranked.iter().take(TOP_LOCATIONS) {
            println!(
                "  {:<20} {:>5}  {}",
                stat.label, stat.total, stat.tier
            );
        }
        println!();
    }

    let anomalies: Vec<_> = run.anomalies().collect();
    if !anomalies.is_empty() {
        println!("Anomalies ({}):", anomalies.len());
        for source in anomalies {
            println!(
                "  - {}: {}",
                source.name,
                source.termination.as_deref().unwrap_or("unknown")
            );
        }
    }
}
