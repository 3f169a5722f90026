use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical source a record counts against
///
/// Attached by the crawler when the record is created, from the source's
/// configuration. Nothing downstream infers it from names or paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Dealer catalog of new equipment
    New,
    /// Dealer catalog of used equipment
    Used,
    /// Independent marketplace listing the same kind of equipment
    Secondary,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
            Self::Secondary => "secondary",
        }
    }

    /// Whether records of this kind form the base set for duplicate matching
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::New | Self::Used)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Self::New),
            "used" => Ok(Self::Used),
            "secondary" => Ok(Self::Secondary),
            other => Err(format!(
                "Unknown source kind '{}'. Valid options are: new, used, secondary",
                other
            )),
        }
    }
}

/// One listing tile as the parsing adapter extracted it
///
/// Every field is free text exactly as it appeared on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTile {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub badges: Vec<String>,
    pub detail_url: String,
    pub image_url: String,
    /// Store name guessed from the listing page, if shown there
    pub location: Option<String>,
    /// Year column, for sources that do not embed it in the name
    pub year: Option<String>,
    /// Model column, for sources that do not embed it in the name
    pub model: Option<String>,
}

/// Fields only available on an item's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    /// Canonical store name, empty when unknown
    pub location: String,
    pub hours: Option<String>,
}

impl DetailFields {
    /// The sentinel returned when a detail fetch fails
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.location.is_empty() && self.hours.is_none()
    }
}

/// The durable unit of harvested inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Name of the configured source the record came from
    pub source_name: String,
    pub source: SourceKind,
    pub product_id: String,
    pub year: String,
    pub make: String,
    pub model: String,
    pub price: String,
    pub hours: Option<String>,
    /// Canonical uppercase store name, empty when unknown
    pub location: String,
    pub badges: Vec<String>,
    pub category: String,
    pub detail_url: String,
    pub image_url: String,
    /// Set when the same item was already seen in a primary source
    #[serde(default)]
    pub duplicate: bool,
}

impl InventoryRecord {
    /// Applies detail-page enrichment
    ///
    /// A non-empty detail location replaces the listing-page guess; an
    /// empty one leaves the guess in place.
    pub fn apply_detail(&mut self, detail: DetailFields) {
        if !detail.location.is_empty() {
            self.location = detail.location;
        }
        if detail.hours.is_some() {
            self.hours = detail.hours;
        }
    }

    pub fn has_location(&self) -> bool {
        !self.location.is_empty()
    }
}
