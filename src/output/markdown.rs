//! Markdown location report
//!
//! This module renders the reconciled inventory as a human-readable markdown
//! report: run information, per-source counts, cross-source overlap, and a
//! per-location table ordered by inventory volume.

use crate::output::traits::{OutputResult, RunSummary};
use crate::reconcile::{InventoryReport, Tier};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report to a file
///
/// # Arguments
///
/// * `report` - The reconciled inventory report
/// * `run` - Run metadata and per-source statistics
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    report: &InventoryReport,
    run: &RunSummary,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(report, run);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote markdown report to {}", output_path.display());
    Ok(())
}

/// Formats the inventory report as markdown
pub fn format_markdown_report(report: &InventoryReport, run: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Inventory Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(run_id) = run.run_id {
        md.push_str(&format!("- **Run ID**: {}\n", run_id));
    }
    md.push_str(&format!("- **Mode**: {}\n", run.mode.as_str()));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.to_rfc3339()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n", run.config_hash));
    md.push_str(&format!(
        "- **Tier Thresholds**: HIGH > {}, MEDIUM > {}\n\n",
        report.thresholds.high, report.thresholds.medium
    ));

    // Sources
    md.push_str("## Sources\n\n");
    md.push_str("| Source | Kind | Records | Pages | Detail Failures | Ended By |\n");
    md.push_str("|--------|------|---------|-------|-----------------|----------|\n");
    for source in &run.sources {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            source.name,
            source.kind,
            source.records,
            source
                .pages_fetched
                .map_or_else(|| "-".to_string(), |p| p.to_string()),
            source
                .detail_failures
                .map_or_else(|| "-".to_string(), |f| f.to_string()),
            source.termination.as_deref().unwrap_or("-")
        ));
    }
    md.push('\n');

    // Reconciliation
    md.push_str("## Cross-Source Overlap\n\n");
    match &report.matches {
        Some(matches) => {
            md.push_str(&format!(
                "- **Duplicate Listings**: {}\n",
                matches.duplicate_count
            ));
            md.push_str(&format!(
                "- **Unique to Primary Sources**: {}\n",
                matches.unique_a
            ));
            md.push_str(&format!(
                "- **Unique to Secondary Sources**: {}\n",
                matches.unique_b
            ));
            md.push_str(&format!(
                "- **Overlap**: {:.1}%\n\n",
                matches.overlap_percentage()
            ));
        }
        None => {
            md.push_str("Matching skipped: records from only one kind of source.\n\n");
        }
    }

    // Locations
    let aggregation = &report.aggregation;
    md.push_str("## Locations\n\n");
    md.push_str(&format!(
        "- **Attributed Records**: {}\n",
        aggregation.located
    ));
    md.push_str(&format!(
        "- **Unknown Locations**: {}\n",
        aggregation.unresolved
    ));
    md.push_str(&format!(
        "- **Missing Locations**: {}\n\n",
        aggregation.unlocated
    ));

    let tiers = aggregation.tier_counts();
    md.push_str("| Tier | Locations |\n");
    md.push_str("|------|-----------|\n");
    for tier in [Tier::High, Tier::Medium, Tier::Low] {
        md.push_str(&format!(
            "| {} | {} |\n",
            tier,
            tiers.get(&tier).copied().unwrap_or(0)
        ));
    }
    md.push('\n');

    md.push_str("| Location | Total | New | Used | Secondary | Duplicates | Tier |\n");
    md.push_str("|----------|-------|-----|------|-----------|------------|------|\n");
    for stat in aggregation.ranked() {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            stat.label,
            stat.total,
            stat.by_source.new,
            stat.by_source.used,
            stat.by_source.secondary,
            stat.duplicates,
            stat.tier
        ));
    }
    md.push('\n');

    md
}
