//! Location reference table
//!
//! The table is loaded once from a TOML file and is read-only afterwards. A
//! record is attributed to a store only if its location resolves here.

use crate::inventory::normalize_location;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One store in the reference table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Canonical uppercase store name
    pub name: String,

    /// Display label, e.g. "Gretna, NE"
    pub label: String,

    pub lat: f64,
    pub lng: f64,

    /// Other spellings that resolve to this store
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LocationFile {
    #[serde(default, rename = "location")]
    locations: Vec<LocationEntry>,
}

/// Canonical store names with coordinates and labels
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    entries: BTreeMap<String, LocationEntry>,
    aliases: HashMap<String, String>,
}

impl LocationTable {
    /// Loads the table from a TOML file of `[[location]]` entries
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: LocationFile = toml::from_str(&content)?;
        let table = Self::from_entries(file.locations)?;

        tracing::debug!(
            "Loaded {} locations from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Builds the table, canonicalizing names and aliases
    ///
    /// Fails on empty names, out-of-range coordinates, or a name or alias
    /// claimed by two entries.
    pub fn from_entries(entries: Vec<LocationEntry>) -> Result<Self, ConfigError> {
        let mut table = Self::default();

        for mut entry in entries {
            entry.name = normalize_location(&entry.name);
            if entry.name.is_empty() {
                return Err(ConfigError::Locations(
                    "location name cannot be empty".to_string(),
                ));
            }

            if !(-90.0..=90.0).contains(&entry.lat) || !(-180.0..=180.0).contains(&entry.lng) {
                return Err(ConfigError::Locations(format!(
                    "location '{}' has out-of-range coordinates ({}, {})",
                    entry.name, entry.lat, entry.lng
                )));
            }

            if table.entries.contains_key(&entry.name) || table.aliases.contains_key(&entry.name) {
                return Err(ConfigError::Locations(format!(
                    "location '{}' is defined twice",
                    entry.name
                )));
            }

            entry.aliases = entry
                .aliases
                .iter()
                .map(|a| normalize_location(a))
                .filter(|a| !a.is_empty() && *a != entry.name)
                .collect();

            for alias in &entry.aliases {
                if table.entries.contains_key(alias) || table.aliases.contains_key(alias) {
                    return Err(ConfigError::Locations(format!(
                        "alias '{}' of '{}' is already taken",
                        alias, entry.name
                    )));
                }
                table.aliases.insert(alias.clone(), entry.name.clone());
            }

            table.entries.insert(entry.name.clone(), entry);
        }

        Ok(table)
    }

    /// Resolves a free-text location to its entry
    pub fn resolve(&self, raw: &str) -> Option<&LocationEntry> {
        let key = normalize_location(raw);
        if key.is_empty() {
            return None;
        }

        self.entries.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|canonical| self.entries.get(canonical))
        })
    }

    /// Returns the entry for a canonical name
    pub fn get(&self, name: &str) -> Option<&LocationEntry> {
        self.entries.get(name)
    }

    /// Entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &LocationEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
