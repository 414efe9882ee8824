// 🎒 Owned Roster - The user's sync pairs, parsed from a tracker export
//
// Export format: { "dex|pokemon": "syncLevelIndex|..." }
// Keys missing from the catalog are counted, never fatal.

use super::sync_pair::{PairId, SyncPair, SyncPairCatalog};
use crate::error::LoadError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Export level index → in-game sync level
pub const SYNC_LEVEL_MAPPING: [u8; 10] = [1, 2, 3, 4, 5, 5, 5, 5, 5, 5];

// ============================================================================
// ROSTER ENTRY
// ============================================================================

/// A lookup candidate: an owned pair (with sync level) or a bare catalog pair
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: PairId,
    pub pair: Arc<SyncPair>,

    /// `Some` for owned pairs, `None` for catalog-only entries
    pub sync_level: Option<u8>,
}

impl RosterEntry {
    pub fn owned(pair: Arc<SyncPair>, sync_level: u8) -> Self {
        RosterEntry {
            id: pair.id(),
            pair,
            sync_level: Some(sync_level),
        }
    }

    pub fn catalog(pair: Arc<SyncPair>) -> Self {
        RosterEntry {
            id: pair.id(),
            pair,
            sync_level: None,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.sync_level.is_some()
    }

    pub fn display_name(&self) -> String {
        self.pair.display_name()
    }
}

/// Map the first `|` field of an export value to a sync level (default 1)
pub fn sync_level_from_export(raw: &str) -> u8 {
    raw.split('|')
        .next()
        .and_then(|field| field.trim().parse::<usize>().ok())
        .and_then(|index| SYNC_LEVEL_MAPPING.get(index).copied())
        .unwrap_or(1)
}

// ============================================================================
// ROSTER
// ============================================================================

/// Raw export object, kept so the roster can be re-derived after a catalog reload
pub type RosterExport = BTreeMap<String, Value>;

pub fn parse_export(json: &str) -> Result<RosterExport, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Json {
        what: "ownership export",
        source,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterSummary {
    pub loaded: usize,
    pub missing: usize,
    pub missing_keys: Vec<String>,
}

/// The owned pool; replaced wholesale on reload
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    by_id: HashMap<PairId, usize>,
}

impl Roster {
    /// Build from a parsed export object
    pub fn from_export(
        catalog: &SyncPairCatalog,
        export: &BTreeMap<String, Value>,
    ) -> (Roster, RosterSummary) {
        let mut roster = Roster::default();
        let mut summary = RosterSummary::default();

        for (raw_key, raw_value) in export {
            let pair = raw_key
                .parse::<PairId>()
                .ok()
                .and_then(|id| catalog.get(&id).cloned());

            let Some(pair) = pair else {
                summary.missing += 1;
                summary.missing_keys.push(raw_key.clone());
                continue;
            };

            let sync_level = match raw_value {
                Value::String(s) => sync_level_from_export(s),
                Value::Number(n) => sync_level_from_export(&n.to_string()),
                _ => 1,
            };

            let entry = RosterEntry::owned(pair, sync_level);
            if roster.by_id.contains_key(&entry.id) {
                continue;
            }
            roster.by_id.insert(entry.id.clone(), roster.entries.len());
            roster.entries.push(entry);
        }

        summary.loaded = roster.entries.len();
        (roster, summary)
    }

    pub fn from_json_str(
        catalog: &SyncPairCatalog,
        json: &str,
    ) -> Result<(Roster, RosterSummary), LoadError> {
        let export = parse_export(json)?;
        Ok(Roster::from_export(catalog, &export))
    }

    pub fn get(&self, id: &PairId) -> Option<&RosterEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn owns(&self, id: &PairId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
