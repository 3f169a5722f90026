//! Record normalization
//!
//! Pure conversions from listing-page text to typed record fields. None of
//! these functions fail: a field that cannot be parsed comes back empty and
//! the rest of the record is kept.

use crate::config::SourceConfig;
use crate::inventory::record::{InventoryRecord, RawTile};
use crate::url::{parent_segment, path_segment};
use regex::Regex;
use std::sync::LazyLock;

/// Promotional prefixes stripped from displayed prices, longest first
pub const PRICE_PREFIXES: &[&str] = &[
    "Starting at",
    "List Price:",
    "Sale Price:",
    "Price:",
];

/// Year, model and numeric id parsed out of a listing name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub year: String,
    pub model: String,
    pub product_id: String,
}

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s+(.+?)\s+-\s+(\d+)$").expect("valid name regex"));

/// Parses a name of the shape `<year> <model> - <numericId>`
///
/// On no match the whole (trimmed) string becomes the model and year and id
/// stay empty.
///
/// # Examples
///
/// ```
/// use inventory_harvest::inventory::parse_name;
///
/// let parsed = parse_name("2024 5095M - 431539");
/// assert_eq!(parsed.year, "2024");
/// assert_eq!(parsed.model, "5095M");
/// assert_eq!(parsed.product_id, "431539");
/// ```
pub fn parse_name(name: &str) -> ParsedName {
    let name = collapse_whitespace(name);

    match NAME_RE.captures(&name) {
        Some(caps) => ParsedName {
            year: caps[1].to_string(),
            model: caps[2].to_string(),
            product_id: caps[3].to_string(),
        },
        None => ParsedName {
            model: name,
            ..ParsedName::default()
        },
    }
}

/// Strips promotional prefixes and collapses whitespace
///
/// The result is display text; it is not checked for numeric well-formedness.
pub fn clean_price(raw: &str) -> String {
    let mut price = collapse_whitespace(raw);

    loop {
        let before = price.len();
        for prefix in PRICE_PREFIXES {
            if let Some(head) = price.get(..prefix.len()) {
                if head.eq_ignore_ascii_case(prefix) {
                    price = price[prefix.len()..].trim_start().to_string();
                }
            }
        }
        if price.len() == before {
            break;
        }
    }

    price
}

/// Derives a category from a detail URL path segment
///
/// With no explicit index the segment before the item slug is used.
/// Hyphens become spaces.
pub fn category_from_url(url: &str, segment: Option<usize>) -> String {
    let raw = match segment {
        Some(index) => path_segment(url, index),
        None => parent_segment(url),
    };

    raw.map(|s| s.replace('-', " ")).unwrap_or_default()
}

/// Uppercases a make and folds separators to single spaces
pub fn normalize_make(make: &str) -> String {
    make.replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Uppercases a model and drops spaces and hyphens, so `5095 M` matches `5095M`
pub fn normalize_model(model: &str) -> String {
    model
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Canonicalizes a free-text store name
///
/// Anything after the first comma (usually a state) is dropped, the rest is
/// uppercased with whitespace collapsed: `"Gretna, NE"` becomes `"GRETNA"`.
pub fn normalize_location(raw: &str) -> String {
    let head = raw.split(',').next().unwrap_or_default();
    collapse_whitespace(head).to_uppercase()
}

/// Accepts only four-digit years
fn normalize_year(raw: &str) -> String {
    let year = raw.trim();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year.to_string()
    } else {
        String::new()
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Converts a listing tile into a record for the given source
///
/// Location is the listing-page guess (if any) and hours are unknown; both
/// are filled in later from the detail page.
pub fn normalize_tile(tile: RawTile, source: &SourceConfig) -> InventoryRecord {
    let parsed = parse_name(&tile.name);

    let year = tile
        .year
        .as_deref()
        .map(normalize_year)
        .filter(|y| !y.is_empty())
        .unwrap_or(parsed.year);

    let model = tile
        .model
        .map(|m| collapse_whitespace(&m))
        .filter(|m| !m.is_empty())
        .unwrap_or(parsed.model);

    let brand = collapse_whitespace(&tile.brand);
    let make = if brand.is_empty() {
        source.default_make.as_deref().map(normalize_make).unwrap_or_default()
    } else {
        normalize_make(&brand)
    };

    let badges = tile
        .badges
        .iter()
        .map(|b| collapse_whitespace(b))
        .filter(|b| !b.is_empty())
        .fold(Vec::new(), |mut acc, badge| {
            if !acc.contains(&badge) {
                acc.push(badge);
            }
            acc
        });

    InventoryRecord {
        source_name: source.name.clone(),
        source: source.kind,
        product_id: parsed.product_id,
        year,
        make,
        model,
        price: clean_price(&tile.price),
        hours: None,
        location: tile
            .location
            .as_deref()
            .map(normalize_location)
            .unwrap_or_default(),
        badges,
        category: category_from_url(&tile.detail_url, source.category_segment),
        detail_url: tile.detail_url,
        image_url: tile.image_url,
        duplicate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetailLabels, SelectorConfig};
    use crate::inventory::SourceKind;

    fn source() -> SourceConfig {
        SourceConfig {
            name: "dealer-new".to_string(),
            kind: SourceKind::New,
            catalog_url: "https://dealer.example/new?page={page}".to_string(),
            page_size: 24,
            first_page: 0,
            max_pages: None,
            enrich: true,
            default_make: Some("John Deere".to_string()),
            category_segment: None,
            selectors: SelectorConfig::default(),
            detail_labels: DetailLabels::default(),
        }
    }

    #[test]
    fn test_parse_name_full_shape() {
        let parsed = parse_name("2024 5095M - 431539");
        assert_eq!(parsed.year, "2024");
        assert_eq!(parsed.model, "5095M");
        assert_eq!(parsed.product_id, "431539");
    }

    #[test]
    fn test_parse_name_multi_word_model() {
        let parsed = parse_name("  2021  S780 Combine -  88120 ");
        assert_eq!(parsed.year, "2021");
        assert_eq!(parsed.model, "S780 Combine");
        assert_eq!(parsed.product_id, "88120");
    }

    #[test]
    fn test_parse_name_without_id_suffix() {
        let parsed = parse_name("2024 5095M");
        assert_eq!(parsed.year, "");
        assert_eq!(parsed.product_id, "");
        assert_eq!(parsed.model, "2024 5095M");
    }

    #[test]
    fn test_parse_name_non_numeric_id() {
        let parsed = parse_name("2024 5095M - ABC");
        assert_eq!(parsed.model, "2024 5095M - ABC");
        assert!(parsed.year.is_empty());
    }

    #[test]
    fn test_clean_price_strips_starting_at() {
        assert_eq!(clean_price("Starting at $96,977.25"), "$96,977.25");
    }

    #[test]
    fn test_clean_price_strips_list_price() {
        assert_eq!(clean_price("  List Price:\n   $12,500 "), "$12,500");
    }

    #[test]
    fn test_clean_price_leaves_plain_text() {
        assert_eq!(clean_price("Call for price"), "Call for price");
        assert_eq!(clean_price(""), "");
    }

    #[test]
    fn test_category_from_parent_segment() {
        let url = "https://dealer.example/used/compact-utility-tractors/2019-3038e-5521";
        assert_eq!(category_from_url(url, None), "compact utility tractors");
    }

    #[test]
    fn test_category_from_explicit_segment() {
        let url = "https://dealer.example/equipment/hay-tools/balers/item-1";
        assert_eq!(category_from_url(url, Some(1)), "hay tools");
        assert_eq!(category_from_url(url, Some(9)), "");
    }

    #[test]
    fn test_normalize_make_and_model() {
        assert_eq!(normalize_make("John   Deere"), "JOHN DEERE");
        assert_eq!(normalize_make("john-deere"), "JOHN DEERE");
        assert_eq!(normalize_model("5095 m"), "5095M");
        assert_eq!(normalize_model("X-350"), "X350");
    }

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("Gretna, NE"), "GRETNA");
        assert_eq!(normalize_location("  council   bluffs "), "COUNCIL BLUFFS");
        assert_eq!(normalize_location(""), "");
    }

    #[test]
    fn test_normalize_tile() {
        let tile = RawTile {
            name: "2024 5095M - 431539".to_string(),
            brand: "John Deere".to_string(),
            price: "Starting at $96,977.25".to_string(),
            badges: vec!["New".to_string(), " In Stock ".to_string(), "New".to_string()],
            detail_url: "https://dealer.example/new/utility-tractors/2024-5095m-431539"
                .to_string(),
            image_url: "https://cdn.example/5095m.jpg".to_string(),
            location: Some("Gretna, NE".to_string()),
            year: None,
            model: None,
        };

        let record = normalize_tile(tile, &source());
        assert_eq!(record.source, SourceKind::New);
        assert_eq!(record.source_name, "dealer-new");
        assert_eq!(record.year, "2024");
        assert_eq!(record.model, "5095M");
        assert_eq!(record.product_id, "431539");
        assert_eq!(record.make, "JOHN DEERE");
        assert_eq!(record.price, "$96,977.25");
        assert_eq!(record.location, "GRETNA");
        assert_eq!(record.badges, vec!["New", "In Stock"]);
        assert_eq!(record.category, "utility tractors");
        assert_eq!(record.hours, None);
        assert!(!record.duplicate);
    }

    #[test]
    fn test_normalize_tile_with_separate_columns() {
        let tile = RawTile {
            name: "John Deere 5095M Utility Tractor".to_string(),
            year: Some("2024".to_string()),
            model: Some("5095M".to_string()),
            ..RawTile::default()
        };

        let record = normalize_tile(tile, &source());
        assert_eq!(record.year, "2024");
        assert_eq!(record.model, "5095M");
        assert_eq!(record.product_id, "");
        // empty brand falls back to the source default
        assert_eq!(record.make, "JOHN DEERE");
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_normalize_tile_rejects_bad_year_column() {
        let tile = RawTile {
            name: "2023 8R 410 - 1200".to_string(),
            year: Some("n/a".to_string()),
            ..RawTile::default()
        };
        let record = normalize_tile(tile, &source());
        assert_eq!(record.year, "2023");
    }
}
