//! Crawler module for catalog harvesting
//!
//! This module contains the crawl-and-enrich pipeline, including:
//! - HTTP fetching of listing and detail pages
//! - The page-parsing adapter
//! - Bounded-concurrency scheduling of detail fetches
//! - Pagination control and termination

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{CrawlOutcome, Harvester, Termination};
pub use fetcher::{build_http_client, extract_detail_fields, fetch_listing, DetailFetcher};
pub use parser::{ListingPage, PageParser, SelectorParser};
pub use scheduler::{BatchOutcome, BatchScheduler};

use crate::config::Config;
use crate::{HarvestError, Result};

/// Crawls every configured source in order
///
/// This is the main entry point for a harvest. Sources are crawled one
/// after another with a shared HTTP client.
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(Vec<CrawlOutcome>)` - One outcome per source, in configuration order
/// * `Err(HarvestError::NoRecords)` - Every source came back empty
/// * `Err(HarvestError)` - The client could not be built or a source's selectors
///   are invalid; nothing is fetched in either case
pub async fn harvest_all(config: &Config) -> Result<Vec<CrawlOutcome>> {
    let harvester = Harvester::new(&config.http, config.harvester.clone())?;

    // Compile every source's selectors before the first request
    let parsers = config
        .sources
        .iter()
        .map(|source| SelectorParser::from_config(&source.selectors))
        .collect::<Result<Vec<_>>>()?;

    let mut outcomes = Vec::with_capacity(config.sources.len());
    for (source, parser) in config.sources.iter().zip(&parsers) {
        outcomes.push(harvester.crawl_with_parser(source, parser).await);
    }

    let total: usize = outcomes.iter().map(|o| o.records.len()).sum();
    if total == 0 {
        return Err(HarvestError::NoRecords {
            sources: outcomes.len(),
        });
    }

    tracing::info!(
        "Harvested {} records from {} sources",
        total,
        outcomes.len()
    );
    Ok(outcomes)
}
