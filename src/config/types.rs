use crate::inventory::SourceKind;
use crate::reconcile::TierThresholds;
use serde::Deserialize;

/// Main configuration structure for a harvest run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub locations: LocationsConfig,
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// Crawl pacing and concurrency limits shared by every source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HarvesterConfig {
    /// Hard ceiling on listing pages fetched per source
    pub max_pages: u32,

    /// Fixed delay between consecutive listing pages (milliseconds)
    pub page_delay_ms: u64,

    /// Number of detail pages in flight within one window
    pub detail_concurrency: usize,

    /// Fixed delay between detail windows (milliseconds)
    pub batch_delay_ms: u64,

    /// Per-call timeout for detail page fetches (milliseconds)
    pub detail_timeout_ms: u64,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            page_delay_ms: 1000,
            detail_concurrency: 5,
            batch_delay_ms: 500,
            detail_timeout_ms: 15_000,
        }
    }
}

/// Static request headers and client timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Path to the markdown location report
    pub summary_path: String,

    /// Path to the JSON location statistics consumed by the map generator
    pub stats_path: String,
}

/// Where the location reference table lives
#[derive(Debug, Clone, Deserialize)]
pub struct LocationsConfig {
    pub path: String,
}

/// Threshold sets for the two aggregation variants
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Used right after a crawl
    pub crawl: TierThresholds,

    /// Used by the report-only reconciliation pass
    pub report: TierThresholds,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            crawl: TierThresholds::CRAWL,
            report: TierThresholds::REPORT,
        }
    }
}

/// One catalog to harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// Unique source name, stored with every record
    pub name: String,

    /// Logical source the records count against
    pub kind: SourceKind,

    /// Listing URL template with `{page}`, `{size}` and/or `{offset}`
    pub catalog_url: String,

    /// Nominal number of tiles per listing page
    pub page_size: u32,

    /// Number of the first listing page
    #[serde(default)]
    pub first_page: u32,

    /// Overrides `harvester.max-pages` for this source
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Whether detail pages are fetched for location and hours
    #[serde(default = "default_true")]
    pub enrich: bool,

    /// Make used when a tile carries no brand
    #[serde(default)]
    pub default_make: Option<String>,

    /// Path segment of the detail URL holding the category
    #[serde(default)]
    pub category_segment: Option<usize>,

    pub selectors: SelectorConfig,

    #[serde(default)]
    pub detail_labels: DetailLabels,
}

impl SourceConfig {
    /// Effective page ceiling for this source
    pub fn page_ceiling(&self, harvester: &HarvesterConfig) -> u32 {
        self.max_pages.unwrap_or(harvester.max_pages)
    }
}

fn default_true() -> bool {
    true
}

/// CSS selectors for the listing and detail markup of one source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Container for one listing tile
    pub tile: String,

    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub badges: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,

    /// Store name shown on the listing page, if any
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub model: Option<String>,

    /// One label/value row on a detail page
    #[serde(default)]
    pub detail_row: Option<String>,
    #[serde(default)]
    pub detail_label: Option<String>,
    #[serde(default)]
    pub detail_value: Option<String>,
}

/// Detail-page labels that carry the enrichment fields
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetailLabels {
    pub location: Vec<String>,
    pub hours: Vec<String>,
}

impl Default for DetailLabels {
    fn default() -> Self {
        Self {
            location: vec!["Location".to_string(), "Store".to_string()],
            hours: vec!["Hours".to_string(), "Engine Hours".to_string()],
        }
    }
}
