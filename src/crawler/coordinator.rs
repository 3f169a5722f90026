//! Harvester - pagination control for one catalog source
//!
//! This module contains the crawl loop for a single source:
//! - Rendering each listing page URL from the source template
//! - Fetching pages strictly one after another, with a fixed delay
//! - Normalizing tiles and enriching them through the batch scheduler
//! - Deciding when pagination ends

use crate::config::{HarvesterConfig, HttpConfig, SourceConfig};
use crate::crawler::fetcher::{build_http_client, fetch_listing, DetailFetcher};
use crate::crawler::parser::{PageParser, SelectorParser};
use crate::crawler::scheduler::BatchScheduler;
use crate::inventory::{normalize_tile, InventoryRecord, SourceKind};
use crate::url::page_url;
use crate::Result;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Why a crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// A page came back with no tiles
    EndOfResults,

    /// A page came back with fewer tiles than the page size; it was kept
    ShortPage,

    /// The page ceiling was reached before the catalog ended
    PageCeiling,

    /// A listing request failed; records gathered before it were kept
    TransportFailure { page: u32, error: String },
}

impl Termination {
    /// Whether the crawl ended in a way worth flagging to the operator
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::PageCeiling | Self::TransportFailure { .. })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfResults => write!(f, "end of results"),
            Self::ShortPage => write!(f, "short page"),
            Self::PageCeiling => write!(f, "page ceiling reached"),
            Self::TransportFailure { page, error } => {
                write!(f, "listing page {} failed: {}", page, error)
            }
        }
    }
}

/// Everything one source's crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub source_name: String,
    pub source_kind: SourceKind,

    /// Records in page order, then tile order
    pub records: Vec<InventoryRecord>,

    /// Listing pages successfully fetched
    pub pages_fetched: u32,

    /// Detail fetches that fell back to unknown fields
    pub detail_failures: usize,

    pub termination: Termination,
}

/// Drives listing-page crawls against configured sources
pub struct Harvester {
    client: Client,
    settings: HarvesterConfig,
}

impl Harvester {
    /// Creates a harvester with its own HTTP client
    pub fn new(http: &HttpConfig, settings: HarvesterConfig) -> Result<Self> {
        Ok(Self::with_client(build_http_client(http)?, settings))
    }

    pub fn with_client(client: Client, settings: HarvesterConfig) -> Self {
        Self { client, settings }
    }

    /// Crawls a source using its configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The crawl ran; check `termination` for how it ended
    /// * `Err(HarvestError::Selector)` - The source's selectors do not compile
    pub async fn crawl(&self, source: &SourceConfig) -> Result<CrawlOutcome> {
        let parser = SelectorParser::from_config(&source.selectors)?;
        Ok(self.crawl_with_parser(source, &parser).await)
    }

    /// Crawls a source with the given parsing adapter
    ///
    /// Starts at the source's first page on every call. Pages are fetched
    /// one at a time. A page with zero tiles or fewer tiles than the page
    /// size ends the crawl, as does the page ceiling. A failed listing
    /// request ends the crawl early; it is reported in the outcome and never
    /// returned as an error.
    ///
    /// # Arguments
    ///
    /// * `source` - The source to crawl
    /// * `parser` - Adapter that turns listing and detail markup into raw values
    pub async fn crawl_with_parser(
        &self,
        source: &SourceConfig,
        parser: &dyn PageParser,
    ) -> CrawlOutcome {
        let ceiling = source.page_ceiling(&self.settings);
        let page_delay = Duration::from_millis(self.settings.page_delay_ms);
        let scheduler = BatchScheduler::from_config(&self.settings);
        let detail = DetailFetcher::new(
            &self.client,
            parser,
            &source.detail_labels,
            Duration::from_millis(self.settings.detail_timeout_ms),
        );

        tracing::info!(
            source = %source.name,
            kind = %source.kind,
            "Starting crawl (page size {}, ceiling {})",
            source.page_size,
            ceiling
        );

        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut detail_failures = 0;
        let mut page = source.first_page;

        let termination = loop {
            if pages_fetched >= ceiling {
                tracing::warn!(
                    source = %source.name,
                    "Page ceiling of {} reached; the catalog may be larger than expected",
                    ceiling
                );
                break Termination::PageCeiling;
            }

            if pages_fetched > 0 && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }

            let url = match page_url(&source.catalog_url, page, source.page_size) {
                Ok(url) => url,
                Err(e) => {
                    break Termination::TransportFailure {
                        page,
                        error: e.to_string(),
                    }
                }
            };

            let body = match fetch_listing(&self.client, url.as_str()).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        source = %source.name,
                        page,
                        "Listing fetch failed, keeping {} records: {}",
                        records.len(),
                        e
                    );
                    break Termination::TransportFailure {
                        page,
                        error: e.to_string(),
                    };
                }
            };
            pages_fetched += 1;

            let listing = parser.parse_listing(&body, &url);
            let tile_count = listing.tile_count;
            tracing::info!(
                source = %source.name,
                page,
                tiles = tile_count,
                kept = listing.tiles.len(),
                "Fetched {}",
                url
            );

            if tile_count == 0 {
                break Termination::EndOfResults;
            }

            let mut page_records: Vec<InventoryRecord> = listing
                .tiles
                .into_iter()
                .map(|tile| normalize_tile(tile, source))
                .collect();

            if source.enrich {
                let detail_urls: Vec<String> =
                    page_records.iter().map(|r| r.detail_url.clone()).collect();
                let outcome = scheduler
                    .process_with_fallback(&detail_urls, |url| detail.try_fetch(url))
                    .await;

                detail_failures += outcome.failed.len();
                for (record, fields) in page_records.iter_mut().zip(outcome.results) {
                    record.apply_detail(fields);
                }
            }

            records.extend(page_records);

            if (tile_count as u64) < u64::from(source.page_size) {
                break Termination::ShortPage;
            }

            page += 1;
        };

        tracing::info!(
            source = %source.name,
            "Crawl finished ({}): {} records from {} pages, {} detail failures",
            termination,
            records.len(),
            pages_fetched,
            detail_failures
        );

        CrawlOutcome {
            source_name: source.name.clone(),
            source_kind: source.kind,
            records,
            pages_fetched,
            detail_failures,
            termination,
        }
    }
}
