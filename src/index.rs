// 🗂️ Lookup Index - normalized alias key → candidate pairs
//
// Four indices (owned/catalog × exact/loose) are built together by pure
// functions and replaced as a unit; nothing is merged into stale state.
// A bucket with several candidates is a genuine naming collision.

use crate::aliases::alias_variants;
use crate::alt_tags::AltTagTable;
use crate::entities::{Roster, RosterEntry, SyncPairCatalog};
use crate::normalize::{normalize, normalize_loose};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Exact,
    Loose,
}

impl Strictness {
    pub fn key(&self, text: &str) -> String {
        match self {
            Strictness::Exact => normalize(text),
            Strictness::Loose => normalize_loose(text),
        }
    }
}

// ============================================================================
// LOOKUP INDEX
// ============================================================================

#[derive(Debug, Clone)]
pub struct LookupIndex {
    buckets: HashMap<String, Vec<RosterEntry>>,
}

impl LookupIndex {
    pub fn build(entries: &[RosterEntry], strictness: Strictness, table: &AltTagTable) -> Self {
        let mut buckets: HashMap<String, Vec<RosterEntry>> = HashMap::new();

        for entry in entries {
            for variant in alias_variants(&entry.pair, table) {
                let key = strictness.key(&variant);
                if key.is_empty() {
                    continue;
                }

                let bucket = buckets.entry(key).or_default();
                // Two variants of one pair can normalize to the same key
                if !bucket.iter().any(|existing| existing.id == entry.id) {
                    bucket.push(entry.clone());
                }
            }
        }

        LookupIndex { buckets }
    }

    /// Candidates for an already-normalized key
    pub fn get(&self, key: &str) -> Option<&[RosterEntry]> {
        self.buckets
            .get(key)
            .map(Vec::as_slice)
            .filter(|bucket| !bucket.is_empty())
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }
}

// ============================================================================
// INDEX SET (owned pool + full catalog, both strictness levels)
// ============================================================================

#[derive(Debug, Clone)]
pub struct IndexSet {
    pub owned: Vec<RosterEntry>,
    pub catalog: Vec<RosterEntry>,
    pub owned_exact: LookupIndex,
    pub owned_loose: LookupIndex,
    pub catalog_exact: LookupIndex,
    pub catalog_loose: LookupIndex,
}

impl IndexSet {
    pub fn build(catalog: &SyncPairCatalog, roster: &Roster, table: &AltTagTable) -> Self {
        let owned: Vec<RosterEntry> = roster.entries().to_vec();
        let all: Vec<RosterEntry> = catalog
            .pairs()
            .iter()
            .cloned()
            .map(RosterEntry::catalog)
            .collect();

        IndexSet {
            owned_exact: LookupIndex::build(&owned, Strictness::Exact, table),
            owned_loose: LookupIndex::build(&owned, Strictness::Loose, table),
            catalog_exact: LookupIndex::build(&all, Strictness::Exact, table),
            catalog_loose: LookupIndex::build(&all, Strictness::Loose, table),
            owned,
            catalog: all,
        }
    }

    pub fn empty() -> Self {
        Self::build(&SyncPairCatalog::default(), &Roster::default(), &AltTagTable::empty())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PairId;

    fn test_catalog() -> SyncPairCatalog {
        SyncPairCatalog::from_json_str(
            r#"[
                {"dexNumber": 1, "pokemonNumber": 1, "trainerName": "Rosa", "pokemonName": "Serperior"},
                {"dexNumber": 2, "pokemonNumber": 1, "trainerName": "Rosa", "trainerAlt": "Summer 2021", "pokemonName": "Delcatty"},
                {"dexNumber": 3, "pokemonNumber": 1, "trainerName": "Leon", "trainerAlt": "Dynamax", "pokemonName": "Charizard"}
            ]"#,
        )
        .unwrap()
    }

    fn owned_all(catalog: &SyncPairCatalog) -> Roster {
        let export: std::collections::BTreeMap<String, serde_json::Value> = catalog
            .pairs()
            .iter()
            .map(|p| (p.id().to_string(), serde_json::json!("0")))
            .collect();
        Roster::from_export(catalog, &export).0
    }

    #[test]
    fn test_exact_index_buckets() {
        let catalog = test_catalog();
        let roster = owned_all(&catalog);
        let table = AltTagTable::with_defaults();
        let index = LookupIndex::build(roster.entries(), Strictness::Exact, &table);

        let hits = index.get("rosa and serperior").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, PairId::new("1", "1"));

        let summer = index.get("rosa summer and delcatty").unwrap();
        assert_eq!(summer[0].id, PairId::new("2", "1"));
    }

    #[test]
    fn test_collisions_keep_all_candidates_in_order() {
        let catalog = test_catalog();
        let roster = owned_all(&catalog);
        let index = LookupIndex::build(roster.entries(), Strictness::Exact, &AltTagTable::with_defaults());

        // Bare trainer name is shared by both Rosa pairs
        let rosa = index.get("rosa").unwrap();
        assert_eq!(rosa.len(), 2);
        assert_eq!(rosa[0].id, PairId::new("1", "1"));
        assert_eq!(rosa[1].id, PairId::new("2", "1"));
    }

    #[test]
    fn test_no_duplicate_candidate_per_key() {
        let catalog = test_catalog();
        let roster = owned_all(&catalog);
        let index = LookupIndex::build(roster.entries(), Strictness::Loose, &AltTagTable::with_defaults());

        // "Leon Dynamax & Charizard" and "Leon & Charizard" share a loose key
        let leon = index.get("leon and charizard").unwrap();
        assert_eq!(leon.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let index = LookupIndex::build(&[], Strictness::Exact, &AltTagTable::with_defaults());
        assert!(index.get("anything").is_none());
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn test_index_set_separates_owned_and_catalog() {
        let catalog = test_catalog();
        let (roster, _) =
            Roster::from_json_str(&catalog, r#"{"1|1": "0"}"#).unwrap();
        let set = IndexSet::build(&catalog, &roster, &AltTagTable::with_defaults());

        assert!(set.owned_exact.get("leon and charizard").is_none());
        let leon = set.catalog_exact.get("leon dynamax and charizard").unwrap();
        assert!(!leon[0].is_owned());
        assert!(set.owned_exact.get("rosa and serperior").unwrap()[0].is_owned());
    }
}
