// 🔍 Match Resolver - Free-text label → canonical sync pair
// Ordered tier chain; first conclusive tier wins, ambiguity is terminal.
//
//   1. Tag abbreviation   "Lear (SS) & Hoopa"
//   2. Owned exact        normalize(label)
//   3. Owned digitless    normalize(strip_digits(label))
//   4. Owned loose        normalize_loose(label)
//   5. Split on "and"     trainer ⊇ left, pokemon ⊇ right
//   6. Catalog fallback   tiers 2-4 against every known pair → NotOwned
//   7. Unmatched

use crate::alt_tags::AltTagTable;
use crate::entities::RosterEntry;
use crate::index::{IndexSet, LookupIndex};
use crate::normalize::{normalize, normalize_loose, strip_digits};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// MATCH OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Resolved to a pair the user owns
    Match(RosterEntry),

    /// Resolved to a catalog pair the user does not own
    NotOwned(RosterEntry),

    /// Two or more equally valid candidates
    Ambiguous(Vec<RosterEntry>),

    /// No candidate under any tier
    Unmatched,

    /// Blank label
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    Match,
    NotOwned,
    Ambiguous,
    Unmatched,
    Empty,
}

impl MatchOutcome {
    pub fn status(&self) -> MatchStatus {
        match self {
            MatchOutcome::Match(_) => MatchStatus::Match,
            MatchOutcome::NotOwned(_) => MatchStatus::NotOwned,
            MatchOutcome::Ambiguous(_) => MatchStatus::Ambiguous,
            MatchOutcome::Unmatched => MatchStatus::Unmatched,
            MatchOutcome::Empty => MatchStatus::Empty,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Match(_))
    }

    /// The resolved pair for Match / NotOwned
    pub fn entry(&self) -> Option<&RosterEntry> {
        match self {
            MatchOutcome::Match(entry) | MatchOutcome::NotOwned(entry) => Some(entry),
            _ => None,
        }
    }

    /// Every candidate relevant to the outcome
    pub fn candidates(&self) -> Vec<&RosterEntry> {
        match self {
            MatchOutcome::Match(entry) | MatchOutcome::NotOwned(entry) => vec![entry],
            MatchOutcome::Ambiguous(entries) => entries.iter().collect(),
            MatchOutcome::Unmatched | MatchOutcome::Empty => Vec::new(),
        }
    }
}

/// 0 candidates → inconclusive, 1 → resolved, 2+ → ambiguous
fn conclude(candidates: &[RosterEntry], owned_pool: bool) -> Option<MatchOutcome> {
    match candidates {
        [] => None,
        [single] if owned_pool => Some(MatchOutcome::Match(single.clone())),
        [single] => Some(MatchOutcome::NotOwned(single.clone())),
        many => Some(MatchOutcome::Ambiguous(many.to_vec())),
    }
}

// ============================================================================
// RESOLVE INPUT (label keys computed once per call)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolveInput<'a> {
    pub raw: &'a str,
    pub exact: String,
    pub digitless: String,
    pub loose: String,
}

impl<'a> ResolveInput<'a> {
    pub fn new(raw: &'a str) -> Self {
        ResolveInput {
            raw,
            exact: normalize(raw),
            digitless: normalize(&strip_digits(raw)),
            loose: normalize_loose(raw),
        }
    }

    fn digitless_key(&self) -> Option<&str> {
        Some(self.digitless.as_str()).filter(|k| !k.is_empty() && *k != self.exact)
    }

    fn loose_key(&self) -> Option<&str> {
        Some(self.loose.as_str()).filter(|k| !k.is_empty() && *k != self.exact)
    }
}

// ============================================================================
// RESOLVER TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverTier {
    TagAbbreviation,
    OwnedExact,
    OwnedDigitless,
    OwnedLoose,
    Split,
    CatalogExact,
    CatalogDigitless,
    CatalogLoose,
}

/// Evaluation order of the tier chain
pub const TIER_ORDER: [ResolverTier; 8] = [
    ResolverTier::TagAbbreviation,
    ResolverTier::OwnedExact,
    ResolverTier::OwnedDigitless,
    ResolverTier::OwnedLoose,
    ResolverTier::Split,
    ResolverTier::CatalogExact,
    ResolverTier::CatalogDigitless,
    ResolverTier::CatalogLoose,
];

impl ResolverTier {
    pub fn name(&self) -> &'static str {
        match self {
            ResolverTier::TagAbbreviation => "tag abbreviation",
            ResolverTier::OwnedExact => "owned exact",
            ResolverTier::OwnedDigitless => "owned digitless",
            ResolverTier::OwnedLoose => "owned loose",
            ResolverTier::Split => "split on and",
            ResolverTier::CatalogExact => "catalog exact",
            ResolverTier::CatalogDigitless => "catalog digitless",
            ResolverTier::CatalogLoose => "catalog loose",
        }
    }
}

fn tag_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)\(\s*([A-Za-z]{2,3})\s*\)").expect("tag label pattern is valid")
    })
}

// ============================================================================
// MATCH RESOLVER
// ============================================================================

/// Read-only query over the index set; deterministic, no state between calls
pub struct MatchResolver<'a> {
    indices: &'a IndexSet,
    table: &'a AltTagTable,
}

impl<'a> MatchResolver<'a> {
    pub fn new(indices: &'a IndexSet, table: &'a AltTagTable) -> Self {
        MatchResolver { indices, table }
    }

    pub fn resolve(&self, label: &str) -> MatchOutcome {
        self.resolve_traced(label).1
    }

    /// Resolve and report which tier concluded (None for Empty / Unmatched)
    pub fn resolve_traced(&self, label: &str) -> (Option<ResolverTier>, MatchOutcome) {
        let input = ResolveInput::new(label);
        if input.exact.is_empty() {
            return (None, MatchOutcome::Empty);
        }

        for tier in TIER_ORDER {
            if let Some(outcome) = self.apply(tier, &input) {
                return (Some(tier), outcome);
            }
        }

        (None, MatchOutcome::Unmatched)
    }

    /// Run one tier in isolation
    pub fn apply(&self, tier: ResolverTier, input: &ResolveInput<'_>) -> Option<MatchOutcome> {
        let idx = self.indices;
        match tier {
            ResolverTier::TagAbbreviation => self.check_tag_abbreviation(input),
            ResolverTier::OwnedExact => lookup(&idx.owned_exact, Some(input.exact.as_str()), true),
            ResolverTier::OwnedDigitless => lookup(&idx.owned_exact, input.digitless_key(), true),
            ResolverTier::OwnedLoose => lookup(&idx.owned_loose, input.loose_key(), true),
            ResolverTier::Split => self.check_split(input),
            ResolverTier::CatalogExact => lookup(&idx.catalog_exact, Some(input.exact.as_str()), false),
            ResolverTier::CatalogDigitless => {
                lookup(&idx.catalog_exact, input.digitless_key(), false)
            }
            ResolverTier::CatalogLoose => lookup(&idx.catalog_loose, input.loose_key(), false),
        }
    }

    /// Tier 1: "Trainer (TAG)" → trainer name + alt abbreviation, owned first
    fn check_tag_abbreviation(&self, input: &ResolveInput<'_>) -> Option<MatchOutcome> {
        let caps = tag_label_pattern().captures(input.raw)?;
        let trainer = normalize(caps.get(1)?.as_str());
        let tag = caps.get(2)?.as_str().to_uppercase();

        if trainer.is_empty() {
            return None;
        }

        let find = |pool: &[RosterEntry]| -> Vec<RosterEntry> {
            pool.iter()
                .filter(|entry| normalize(&entry.pair.trainer_name) == trainer)
                .filter(|entry| {
                    entry
                        .pair
                        .alt()
                        .and_then(|alt| self.table.abbreviation(alt))
                        .map_or(false, |abbrev| abbrev.eq_ignore_ascii_case(&tag))
                })
                .cloned()
                .collect()
        };

        conclude(&find(&self.indices.owned), true)
            .or_else(|| conclude(&find(&self.indices.catalog), false))
    }

    /// Tier 5: "left and right" → trainer(+alt) contains left, pokemon contains right
    fn check_split(&self, input: &ResolveInput<'_>) -> Option<MatchOutcome> {
        let parts: Vec<&str> = input.exact.split(" and ").collect();
        let [left, right] = parts.as_slice() else {
            return None;
        };
        if left.is_empty() || right.is_empty() {
            return None;
        }

        let hits: Vec<RosterEntry> = self
            .indices
            .owned
            .iter()
            .filter(|entry| {
                let trainer = normalize(&format!(
                    "{} {}",
                    entry.pair.trainer_name,
                    entry.pair.alt().unwrap_or("")
                ));
                let pokemon = normalize(&entry.pair.pokemon_name);
                trainer.contains(left) && pokemon.contains(right)
            })
            .cloned()
            .collect();

        conclude(&hits, true)
    }
}

fn lookup(index: &LookupIndex, key: Option<&str>, owned_pool: bool) -> Option<MatchOutcome> {
    let candidates = index.get(key?)?;
    conclude(candidates, owned_pool)
}

// ============================================================================
// TESTS
// ============================================================================
