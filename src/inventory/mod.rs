//! Inventory data model and record normalization
//!
//! A listing tile (`RawTile`) becomes an `InventoryRecord` once, through
//! `normalize_tile`, and is mutated once more when its detail page is applied.

mod normalize;
mod record;

pub use normalize::{
    category_from_url, clean_price, normalize_location, normalize_make, normalize_model,
    normalize_tile, parse_name, ParsedName, PRICE_PREFIXES,
};
pub use record::{DetailFields, InventoryRecord, RawTile, SourceKind};
