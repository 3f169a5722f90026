//! Cross-source duplicate detection
//!
//! A secondary listing is the same physical item as a primary one when both
//! produce the same [`MatchKey`]. Records with an incomplete key never match.

use crate::inventory::{normalize_location, normalize_make, normalize_model, InventoryRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Normalized `year|make|model|location` identity of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    /// Builds the key for a record
    ///
    /// Returns None if any of the four components is empty after
    /// normalization.
    pub fn for_record(record: &InventoryRecord) -> Option<Self> {
        let year = record.year.trim();
        let make = normalize_make(&record.make);
        let model = normalize_model(&record.model);
        let location = normalize_location(&record.location);

        if year.is_empty() || make.is_empty() || model.is_empty() || location.is_empty() {
            return None;
        }

        Some(Self(format!("{}|{}|{}|{}", year, make, model, location)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of matching a secondary set against a primary set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    /// Secondary records whose key was found in the primary set
    pub duplicate_count: usize,

    /// Primary records no secondary record matched
    pub unique_a: usize,

    /// Secondary records with no primary counterpart
    pub unique_b: usize,

    /// Size of the secondary set
    pub total_b: usize,

    /// Positions within the secondary set that are duplicates
    #[serde(skip)]
    pub duplicate_indices: Vec<usize>,
}

impl MatchReport {
    /// Share of the secondary set that duplicates primary inventory, in percent
    pub fn overlap_percentage(&self) -> f64 {
        if self.total_b == 0 {
            return 0.0;
        }
        self.duplicate_count as f64 / self.total_b as f64 * 100.0
    }
}

/// Matches set B against set A
///
/// Each key keeps the first A record that produced it. A B record is a
/// duplicate when its key is present and the A record came from a different
/// source. Repeats within one set are never reported.
///
/// # Arguments
///
/// * `set_a` - The base (primary) records
/// * `set_b` - The records checked against the base
///
/// # Returns
///
/// Counts plus the positions in `set_b` that duplicate an A record.
pub fn match_sources<'a, A, B>(set_a: A, set_b: B) -> MatchReport
where
    A: IntoIterator<Item = &'a InventoryRecord>,
    B: IntoIterator<Item = &'a InventoryRecord>,
{
    let mut index: HashMap<MatchKey, &InventoryRecord> = HashMap::new();
    let mut total_a: usize = 0;
    for record in set_a {
        total_a += 1;
        if let Some(key) = MatchKey::for_record(record) {
            index.entry(key).or_insert(record);
        }
    }

    let mut report = MatchReport::default();
    let mut hit_keys: HashSet<MatchKey> = HashSet::new();

    for (position, record) in set_b.into_iter().enumerate() {
        report.total_b += 1;

        let hit = MatchKey::for_record(record).and_then(|key| {
            index
                .get(&key)
                .filter(|a| a.source_name != record.source_name)
                .map(|_| key)
        });

        match hit {
            Some(key) => {
                tracing::trace!("Duplicate {} at position {}", key, position);
                report.duplicate_count += 1;
                report.duplicate_indices.push(position);
                hit_keys.insert(key);
            }
            None => report.unique_b += 1,
        }
    }

    report.unique_a = total_a.saturating_sub(hit_keys.len());

    tracing::debug!(
        "Matched {} of {} records against {} base records",
        report.duplicate_count,
        report.total_b,
        total_a
    );

    report
}

/// Sets the duplicate flag on every record the report names
///
/// `set_b` must be the same sequence that was passed to [`match_sources`].
pub fn flag_duplicates(set_b: &mut [InventoryRecord], report: &MatchReport) {
    for &position in &report.duplicate_indices {
        if let Some(record) = set_b.get_mut(position) {
            record.duplicate = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SourceKind;

    fn record(source: SourceKind, year: &str, model: &str, location: &str) -> InventoryRecord {
        InventoryRecord {
            source_name: source.as_str().to_string(),
            source,
            product_id: String::new(),
            year: year.to_string(),
            make: "JOHN DEERE".to_string(),
            model: model.to_string(),
            price: String::new(),
            hours: None,
            location: location.to_string(),
            badges: vec![],
            category: String::new(),
            detail_url: String::new(),
            image_url: String::new(),
            duplicate: false,
        }
    }

    #[test]
    fn test_key_normalizes_components() {
        let mut a = record(SourceKind::Used, "2024", "5095 M", "Gretna, NE");
        a.make = "John-Deere".to_string();
        let b = record(SourceKind::Secondary, "2024", "5095M", "GRETNA");

        let ka = MatchKey::for_record(&a).unwrap();
        assert_eq!(ka.as_str(), "2024|JOHN DEERE|5095M|GRETNA");
        assert_eq!(Some(ka), MatchKey::for_record(&b));
    }

    #[test]
    fn test_key_requires_all_components() {
        assert!(MatchKey::for_record(&record(SourceKind::Used, "", "5095M", "GRETNA")).is_none());
        assert!(MatchKey::for_record(&record(SourceKind::Used, "2024", "", "GRETNA")).is_none());
        assert!(MatchKey::for_record(&record(SourceKind::Used, "2024", "5095M", "")).is_none());

        let mut no_make = record(SourceKind::Used, "2024", "5095M", "GRETNA");
        no_make.make.clear();
        assert!(MatchKey::for_record(&no_make).is_none());
    }

    #[test]
    fn test_match_single_duplicate() {
        let a = vec![record(SourceKind::Used, "2024", "5095M", "GRETNA")];
        let b = vec![
            record(SourceKind::Secondary, "2024", "5095M", "GRETNA"),
            record(SourceKind::Secondary, "2022", "6120M", "OMAHA"),
        ];

        let report = match_sources(&a, &b);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.unique_b, 1);
        assert_eq!(report.unique_a, 0);
        assert_eq!(report.duplicate_indices, vec![0]);
        assert!((report.overlap_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_location_never_matches() {
        let a = vec![record(SourceKind::Used, "2024", "5095M", "")];
        let b = vec![record(SourceKind::Secondary, "2024", "5095M", "")];

        let report = match_sources(&a, &b);
        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.unique_b, 1);
        assert_eq!(report.unique_a, 1);
    }

    #[test]
    fn test_same_source_never_matches() {
        let a = vec![record(SourceKind::Used, "2024", "5095M", "GRETNA")];
        let report = match_sources(&a, &a);
        assert_eq!(report.duplicate_count, 0);
    }

    #[test]
    fn test_first_a_record_wins_and_unique_a_counts_keys() {
        let a = vec![
            record(SourceKind::New, "2024", "5095M", "GRETNA"),
            record(SourceKind::Used, "2024", "5095M", "GRETNA"),
            record(SourceKind::Used, "2020", "1025R", "OMAHA"),
        ];
        let b = vec![
            record(SourceKind::Secondary, "2024", "5095M", "GRETNA"),
            record(SourceKind::Secondary, "2024", "5095M", "GRETNA"),
        ];

        let report = match_sources(&a, &b);
        assert_eq!(report.duplicate_count, 2);
        assert_eq!(report.unique_b, 0);
        // one distinct key was hit
        assert_eq!(report.unique_a, 2);
    }

    #[test]
    fn test_empty_b_has_zero_overlap() {
        let a = vec![record(SourceKind::Used, "2024", "5095M", "GRETNA")];
        let b: Vec<InventoryRecord> = Vec::new();
        let report = match_sources(&a, &b);
        assert_eq!(report.total_b, 0);
        assert_eq!(report.overlap_percentage(), 0.0);
        assert_eq!(report.unique_a, 1);
    }

    #[test]
    fn test_flag_duplicates() {
        let a = vec![record(SourceKind::Used, "2024", "5095M", "GRETNA")];
        let mut b = vec![
            record(SourceKind::Secondary, "2022", "6120M", "OMAHA"),
            record(SourceKind::Secondary, "2024", "5095M", "GRETNA"),
        ];

        let report = match_sources(&a, &b);
        flag_duplicates(&mut b, &report);
        assert!(!b[0].duplicate);
        assert!(b[1].duplicate);
    }
}
