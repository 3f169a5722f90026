//! Inventory Harvest main entry point
//!
//! This is the command-line interface for the equipment inventory harvester.

use anyhow::Context;
use clap::Parser;
use inventory_harvest::config::{load_config_with_hash, Config};
use inventory_harvest::crawler::harvest_all;
use inventory_harvest::output::{print_summary, write_reports, RunMode, RunSummary, SourceSummary};
use inventory_harvest::reconcile::{build_report, LocationTable};
use inventory_harvest::storage::{SqliteStorage, Storage};
use inventory_harvest::url::page_url;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Inventory Harvest: equipment-listing harvester and reconciler
///
/// Crawls the configured catalogs, enriches listings from their detail
/// pages, flags listings that appear in more than one source, and reports
/// inventory per store location.
#[derive(Parser, Debug)]
#[command(name = "inventory-harvest")]
#[command(version)]
#[command(about = "Harvest and reconcile equipment inventory", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "report")]
    dry_run: bool,

    /// Reconcile the latest completed run from the database without crawling
    #[arg(long, conflicts_with = "dry_run")]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let result = if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.report {
        handle_report(&config, &config_hash)
    } else {
        handle_crawl(&config, &config_hash).await
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("inventory_harvest=info,warn"),
            1 => EnvFilter::new("inventory_harvest=debug,info"),
            2 => EnvFilter::new("inventory_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_locations(config: &Config) -> anyhow::Result<LocationTable> {
    let path = Path::new(&config.locations.path);
    LocationTable::load(path)
        .with_context(|| format!("Failed to load location table {}", path.display()))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let table = load_locations(config)?;

    println!("=== Inventory Harvest Dry Run ===\n");

    println!("Harvester:");
    println!("  Max pages per source: {}", config.harvester.max_pages);
    println!("  Page delay: {}ms", config.harvester.page_delay_ms);
    println!(
        "  Detail concurrency: {}",
        config.harvester.detail_concurrency
    );
    println!("  Batch delay: {}ms", config.harvester.batch_delay_ms);
    println!("  Detail timeout: {}ms", config.harvester.detail_timeout_ms);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let first = page_url(&source.catalog_url, source.first_page, source.page_size)?;
        println!(
            "  - {} [{}]: {} per page, up to {} pages, enrich: {}",
            source.name,
            source.kind,
            source.page_size,
            source.page_ceiling(&config.harvester),
            source.enrich
        );
        println!("    * {}", first);
    }

    println!("\nLocations: {}", table.len());
    println!(
        "Tiers: crawl HIGH > {} / MEDIUM > {}, report HIGH > {} / MEDIUM > {}",
        config.tiers.crawl.high,
        config.tiers.crawl.medium,
        config.tiers.report.high,
        config.tiers.report.medium
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);
    println!("  Location stats: {}", config.output.stats_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --report mode: reconciles the latest completed run
fn handle_report(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let table = load_locations(config)?;
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    let run = storage
        .latest_completed_run()?
        .context("No completed harvest run found in the database")?;
    if run.config_hash != config_hash {
        tracing::warn!(
            "Run {} was harvested with a different configuration ({})",
            run.id,
            run.config_hash
        );
    }

    let mut records = storage.load_records(run.id)?;
    tracing::info!("Loaded {} records from run {}", records.len(), run.id);

    let report = build_report(&mut records, &table, config.tiers.report);

    let sources = report
        .records_by_source
        .iter()
        .filter_map(|(name, &count)| {
            records
                .iter()
                .find(|r| &r.source_name == name)
                .map(|r| SourceSummary::reloaded(name, r.source, count))
        })
        .collect();

    let summary = RunSummary {
        run_id: Some(run.id),
        mode: RunMode::Report,
        config_hash: run.config_hash,
        sources,
    };

    print_summary(&report, &summary);
    write_reports(&report, &summary, &config.output)?;

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let table = load_locations(config)?;
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash)?;

    tracing::info!(
        "Starting harvest run {} over {} sources",
        run_id,
        config.sources.len()
    );

    let outcomes = match harvest_all(config).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            if let Err(storage_err) = storage.fail_run(run_id) {
                tracing::warn!("Failed to mark run {} as failed: {}", run_id, storage_err);
            }
            return Err(e).context("Harvest failed");
        }
    };

    let sources: Vec<SourceSummary> = outcomes.iter().map(SourceSummary::from_outcome).collect();
    let mut records: Vec<_> = outcomes.into_iter().flat_map(|o| o.records).collect();

    let report = build_report(&mut records, &table, config.tiers.crawl);

    storage
        .store_run(run_id, &records)
        .with_context(|| format!("Failed to store records for run {}", run_id))?;

    let summary = RunSummary {
        run_id: Some(run_id),
        mode: RunMode::Crawl,
        config_hash: config_hash.to_string(),
        sources,
    };

    print_summary(&report, &summary);
    write_reports(&report, &summary, &config.output)?;

    tracing::info!("Harvest run {} completed", run_id);
    Ok(())
}
