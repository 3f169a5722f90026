//! Page-parsing adapter
//!
//! This module turns listing and detail markup into raw field values:
//! - Listing pages become an ordered list of [`RawTile`]s
//! - Detail pages become ordered label/value rows
//!
//! Nothing here interprets the values; that is the normalizer's job.

use crate::config::SelectorConfig;
use crate::inventory::RawTile;
use crate::url::resolve_link;
use crate::{HarvestError, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const DEFAULT_LINK: &str = "a[href]";
const DEFAULT_IMAGE: &str = "img";
const DEFAULT_DETAIL_ROW: &str = "tr";
const DEFAULT_DETAIL_LABEL: &str = "th";
const DEFAULT_DETAIL_VALUE: &str = "td";

/// One parsed listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Tiles that carried a name, in page order
    pub tiles: Vec<RawTile>,

    /// Tile containers on the page, including ones skipped for a missing name
    pub tile_count: usize,
}

/// Extracts raw values from a source's markup
pub trait PageParser: Send + Sync {
    /// Returns the tiles of one listing page
    ///
    /// Relative detail and image URLs are resolved against `page_url`.
    /// `tile_count` drives pagination, so it counts every tile container.
    fn parse_listing(&self, html: &str, page_url: &Url) -> ListingPage;

    /// Returns the label/value rows of one detail page, in page order
    ///
    /// Labels are trimmed and a trailing `:` is removed. When a label
    /// repeats exactly, only the first row is kept.
    fn parse_detail(&self, html: &str) -> Vec<(String, String)>;
}

/// CSS-selector driven parser built from a source's configuration
#[derive(Debug)]
pub struct SelectorParser {
    tile: Selector,
    name: Selector,
    brand: Option<Selector>,
    price: Option<Selector>,
    badges: Option<Selector>,
    link: Selector,
    image: Selector,
    location: Option<Selector>,
    year: Option<Selector>,
    model: Option<Selector>,
    detail_row: Selector,
    detail_label: Selector,
    detail_value: Selector,
}

impl SelectorParser {
    /// Compiles every configured selector
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorParser)` - All selectors compiled
    /// * `Err(HarvestError::Selector)` - A selector is not valid CSS
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            tile: compile(&config.tile)?,
            name: compile(&config.name)?,
            brand: compile_optional(config.brand.as_deref())?,
            price: compile_optional(config.price.as_deref())?,
            badges: compile_optional(config.badges.as_deref())?,
            link: compile(config.link.as_deref().unwrap_or(DEFAULT_LINK))?,
            image: compile(config.image.as_deref().unwrap_or(DEFAULT_IMAGE))?,
            location: compile_optional(config.location.as_deref())?,
            year: compile_optional(config.year.as_deref())?,
            model: compile_optional(config.model.as_deref())?,
            detail_row: compile(config.detail_row.as_deref().unwrap_or(DEFAULT_DETAIL_ROW))?,
            detail_label: compile(
                config
                    .detail_label
                    .as_deref()
                    .unwrap_or(DEFAULT_DETAIL_LABEL),
            )?,
            detail_value: compile(
                config
                    .detail_value
                    .as_deref()
                    .unwrap_or(DEFAULT_DETAIL_VALUE),
            )?,
        })
    }

    fn parse_tile(&self, tile: ElementRef<'_>, page_url: &Url) -> Option<RawTile> {
        let name = first_text(tile, &self.name)?;

        let detail_url = tile
            .select(&self.link)
            .find_map(|a| a.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url))
            .unwrap_or_default();

        let image_url = tile
            .select(&self.image)
            .find_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .and_then(|src| resolve_link(src, page_url))
            .unwrap_or_default();

        Some(RawTile {
            name,
            brand: self
                .brand
                .as_ref()
                .and_then(|s| first_text(tile, s))
                .unwrap_or_default(),
            price: self
                .price
                .as_ref()
                .and_then(|s| first_text(tile, s))
                .unwrap_or_default(),
            badges: self
                .badges
                .as_ref()
                .map(|s| tile.select(s).map(element_text).filter(|t| !t.is_empty()).collect())
                .unwrap_or_default(),
            detail_url,
            image_url,
            location: self.location.as_ref().and_then(|s| first_text(tile, s)),
            year: self.year.as_ref().and_then(|s| first_text(tile, s)),
            model: self.model.as_ref().and_then(|s| first_text(tile, s)),
        })
    }
}

impl PageParser for SelectorParser {
    fn parse_listing(&self, html: &str, page_url: &Url) -> ListingPage {
        let document = Html::parse_document(html);
        let mut page = ListingPage::default();

        for tile in document.select(&self.tile) {
            page.tile_count += 1;
            match self.parse_tile(tile, page_url) {
                Some(parsed) => page.tiles.push(parsed),
                None => tracing::debug!("Skipping tile without a name on {}", page_url),
            }
        }

        page
    }

    fn parse_detail(&self, html: &str) -> Vec<(String, String)> {
        let document = Html::parse_document(html);
        let mut fields: Vec<(String, String)> = Vec::new();

        for row in document.select(&self.detail_row) {
            let label = match first_text(row, &self.detail_label) {
                Some(label) => clean_label(&label),
                None => continue,
            };
            if label.is_empty() {
                continue;
            }

            if fields.iter().any(|(seen, _)| *seen == label) {
                continue;
            }

            let value = first_text(row, &self.detail_value).unwrap_or_default();
            fields.push((label, value));
        }

        fields
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn compile_optional(selector: Option<&str>) -> Result<Option<Selector>> {
    selector
        .filter(|s| !s.trim().is_empty())
        .map(compile)
        .transpose()
}

/// Whitespace-collapsed text of an element and its descendants
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first non-empty match under `scope`
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn clean_label(label: &str) -> String {
    label.trim().trim_end_matches(':').trim_end().to_string()
}
