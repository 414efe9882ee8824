// ⚔️ Clear Builder - Sheet rows → per-boss clears + resolution diagnostics
//
// Every row label goes through the resolver once:
//   Match      → one Clear per non-blank boss cell
//   NotOwned   → counted, cheapest clear remembered
//   Ambiguous  → candidates listed by display name
//   Unmatched  → counted
// Manual overrides are applied afterwards and win over diagnostics.

use crate::entities::{PairId, Roster};
use crate::investment::investment_score;
use crate::normalize::normalize;
use crate::overrides::OverrideLedger;
use crate::payload::{ClearDetail, ClearsPayload};
use crate::resolver::{MatchOutcome, MatchResolver};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

// ============================================================================
// CLEAR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clear {
    pub boss: String,
    pub pair_id: PairId,
    pub investment: String,
    pub investment_score: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ClearDetail>,

    /// Synthesized from a manual override binding
    pub manual: bool,
}

impl Clear {
    pub fn new(boss: &str, pair_id: PairId, investment: &str) -> Self {
        Clear {
            boss: boss.to_string(),
            pair_id,
            investment: investment.to_string(),
            investment_score: investment_score(Some(investment)),
            detail: None,
            manual: false,
        }
    }

    pub fn with_detail(mut self, detail: Option<ClearDetail>) -> Self {
        self.detail = detail;
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }
}

// ============================================================================
// OBJECTIVE BUCKETS
// ============================================================================

/// boss → clears, bosses in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectiveBuckets {
    buckets: IndexMap<String, Vec<Clear>>,
}

impl ObjectiveBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clear: Clear) {
        self.buckets
            .entry(clear.boss.clone())
            .or_default()
            .push(clear);
    }

    pub fn contains(&self, boss: &str, pair_id: &PairId) -> bool {
        self.buckets
            .get(boss)
            .map_or(false, |clears| clears.iter().any(|c| &c.pair_id == pair_id))
    }

    pub fn get(&self, boss: &str) -> Option<&[Clear]> {
        self.buckets.get(boss).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Clear>)> {
        self.buckets.iter()
    }

    pub fn bosses(&self) -> impl Iterator<Item = &String> {
        self.buckets.keys()
    }

    pub fn boss_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl FromIterator<Clear> for ObjectiveBuckets {
    fn from_iter<I: IntoIterator<Item = Clear>>(iter: I) -> Self {
        let mut buckets = ObjectiveBuckets::new();
        for clear in iter {
            buckets.push(clear);
        }
        buckets
    }
}

// ============================================================================
// RESOLUTION REPORT
// ============================================================================

/// Cheapest clear seen for a label the user does not own
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotOwnedInfo {
    pub pair_id: PairId,
    pub display_name: String,
    pub count: usize,
    pub cheapest: Option<CheapestClear>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheapestClear {
    pub boss: String,
    pub investment: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// label → rows seen
    pub unmatched: BTreeMap<String, usize>,
    /// label → candidate display names
    pub ambiguous: BTreeMap<String, Vec<String>>,
    pub not_owned: BTreeMap<String, NotOwnedInfo>,
    pub matched_rows: usize,
    pub manual_clears: usize,
    pub skipped_overrides: Vec<String>,
}

impl ResolutionReport {
    pub fn forget(&mut self, label: &str) {
        self.unmatched.remove(label);
        self.ambiguous.remove(label);
        self.not_owned.remove(label);
    }

    pub fn unresolved_count(&self) -> usize {
        self.unmatched.len() + self.ambiguous.len() + self.not_owned.len()
    }
}

// ============================================================================
// ROWS CACHE (label → boss cells, kept for override replay)
// ============================================================================

pub type RowCache = IndexMap<String, Vec<IndexMap<String, String>>>;

/// Labels worth resolving, with their non-blank boss cells
pub fn cache_rows(payload: &ClearsPayload) -> RowCache {
    let mut cache: RowCache = IndexMap::new();

    for row in &payload.rows {
        let label = row.sync_pair.trim();
        if is_skipped_label(label) {
            continue;
        }

        let cells: IndexMap<String, String> = row
            .bosses
            .iter()
            .map(|(boss, investment)| (boss.clone(), investment.trim().to_string()))
            .filter(|(_, investment)| !investment.is_empty())
            .collect();

        cache.entry(label.to_string()).or_default().push(cells);
    }

    cache
}

/// Blank labels, the README row and the "number of solos" footer
pub fn is_skipped_label(label: &str) -> bool {
    let key = normalize(label);
    key.is_empty() || key == "readme" || key.starts_with("number of solos")
}

// ============================================================================
// CLEAR BUILDER
// ============================================================================

pub struct ClearBuilder<'a> {
    resolver: &'a MatchResolver<'a>,
    roster: &'a Roster,
}

impl<'a> ClearBuilder<'a> {
    pub fn new(resolver: &'a MatchResolver<'a>, roster: &'a Roster) -> Self {
        ClearBuilder { resolver, roster }
    }

    /// Build fresh buckets and diagnostics; nothing is mutated in place
    pub fn build(
        &self,
        payload: &ClearsPayload,
        rows: &RowCache,
        ledger: &OverrideLedger,
    ) -> (ObjectiveBuckets, ResolutionReport) {
        let mut buckets = ObjectiveBuckets::new();
        let mut report = ResolutionReport::default();

        for (label, label_rows) in rows {
            match self.resolver.resolve(label) {
                MatchOutcome::Match(entry) => {
                    report.matched_rows += label_rows.len();
                    for cells in label_rows {
                        for (boss, investment) in cells {
                            let detail = payload.detail(boss, label).cloned();
                            buckets.push(
                                Clear::new(boss, entry.id.clone(), investment).with_detail(detail),
                            );
                        }
                    }
                }
                MatchOutcome::NotOwned(entry) => {
                    let info = report
                        .not_owned
                        .entry(label.clone())
                        .or_insert_with(|| NotOwnedInfo {
                            pair_id: entry.id.clone(),
                            display_name: entry.display_name(),
                            count: 0,
                            cheapest: None,
                        });
                    info.count += label_rows.len();

                    for (boss, investment) in label_rows.iter().flatten() {
                        let score = investment_score(Some(investment));
                        let cheaper = info.cheapest.as_ref().map_or(true, |c| score < c.score);
                        if cheaper {
                            info.cheapest = Some(CheapestClear {
                                boss: boss.clone(),
                                investment: investment.clone(),
                                score,
                            });
                        }
                    }
                }
                MatchOutcome::Ambiguous(candidates) => {
                    report.ambiguous.insert(
                        label.clone(),
                        candidates.iter().map(|c| c.display_name()).collect(),
                    );
                }
                MatchOutcome::Unmatched => {
                    *report.unmatched.entry(label.clone()).or_insert(0) += label_rows.len();
                }
                MatchOutcome::Empty => {}
            }
        }

        self.apply_overrides(payload, rows, ledger, &mut buckets, &mut report);

        tracing::debug!(
            bosses = buckets.boss_count(),
            clears = buckets.clear_count(),
            unmatched = report.unmatched.len(),
            ambiguous = report.ambiguous.len(),
            not_owned = report.not_owned.len(),
            "built clears"
        );

        (buckets, report)
    }

    fn apply_overrides(
        &self,
        payload: &ClearsPayload,
        rows: &RowCache,
        ledger: &OverrideLedger,
        buckets: &mut ObjectiveBuckets,
        report: &mut ResolutionReport,
    ) {
        for (label, pair_id) in ledger.list() {
            let Some(label_rows) = rows.get(label) else {
                continue;
            };

            if !self.roster.owns(pair_id) {
                tracing::warn!(label = %label, pair_id = %pair_id, "override target not owned, skipping");
                report.skipped_overrides.push(label.clone());
                continue;
            }

            for (boss, investment) in label_rows.iter().flatten() {
                // (boss, pair) already present, from resolution or an earlier row
                if buckets.contains(boss, pair_id) {
                    continue;
                }
                let detail = payload.detail(boss, label).cloned();
                buckets.push(
                    Clear::new(boss, pair_id.clone(), investment)
                        .with_detail(detail)
                        .manual(),
                );
                report.manual_clears += 1;
            }

            report.forget(label);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
