// 🗺️ Round Planner - Greedy sequence of locally best rounds
//
// A round assigns one clear per boss, every pair distinct. Pairs used in a
// round are gone for every later round. Each round maximizes
//
//   Σ scarcity(pair) + 1 / (1 + investment_score)
//
// where scarcity = 1 / (bosses still listing the pair). Not a minimum
// round cover; planning stops at the first boss that runs dry.

use crate::clears::{Clear, ObjectiveBuckets};
use crate::entities::PairId;
use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_CANDIDATES_PER_OBJECTIVE: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Per-boss candidate list is cut to this many before the search
    pub max_candidates_per_objective: usize,
    /// Optional search depth cap (one level per boss); unset plans any boss count
    pub max_objectives: Option<usize>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        PlannerSettings {
            max_candidates_per_objective: DEFAULT_MAX_CANDIDATES_PER_OBJECTIVE,
            max_objectives: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round {
    /// One clear per boss, in bucket order
    pub clears: Vec<Clear>,
    pub score: f64,
}

impl Round {
    pub fn pair_ids(&self) -> impl Iterator<Item = &PairId> {
        self.clears.iter().map(|c| &c.pair_id)
    }

    /// Clears by ascending investment score; equal scores keep bucket order
    pub fn by_investment(&self) -> Vec<&Clear> {
        let mut clears: Vec<&Clear> = self.clears.iter().collect();
        clears.sort_by(|a, b| a.investment_score.total_cmp(&b.investment_score));
        clears
    }

    pub fn len(&self) -> usize {
        self.clears.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clears.is_empty()
    }
}

// ============================================================================
// SEARCH LEVELS
// ============================================================================

#[derive(Debug, Clone)]
struct Candidate<'c> {
    clear: &'c Clear,
    score: f64,
}

/// One boss worth of ranked candidates
#[derive(Debug, Clone)]
struct Level<'c> {
    bucket_index: usize,
    candidates: Vec<Candidate<'c>>,
}

// ============================================================================
// ROUND PLANNER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RoundPlanner {
    settings: PlannerSettings,
}

impl RoundPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        RoundPlanner { settings }
    }

    pub fn plan_rounds(&self, buckets: &ObjectiveBuckets) -> Result<Vec<Round>, PlanError> {
        let count = buckets.boss_count();
        if let Some(limit) = self.settings.max_objectives {
            if count > limit {
                return Err(PlanError::TooManyObjectives { count, limit });
            }
        }

        let mut rounds = Vec::new();
        if count == 0 {
            return Ok(rounds);
        }

        let mut used: HashSet<PairId> = HashSet::new();
        while let Some(round) = self.best_round(buckets, &used) {
            used.extend(round.pair_ids().cloned());
            tracing::debug!(round = rounds.len() + 1, score = round.score, "planned round");
            rounds.push(round);
        }

        tracing::info!(rounds = rounds.len(), bosses = count, pairs_used = used.len(), "planning finished");
        Ok(rounds)
    }

    /// Highest-scoring complete assignment over the unused pairs, if any
    fn best_round(&self, buckets: &ObjectiveBuckets, used: &HashSet<PairId>) -> Option<Round> {
        let levels = self.rank_levels(buckets, used)?;
        let (score, picks) = search(&levels)?;

        let mut chosen: Vec<(usize, &Clear)> = levels
            .iter()
            .zip(picks)
            .map(|(level, pick)| (level.bucket_index, level.candidates[pick].clear))
            .collect();
        chosen.sort_by_key(|(bucket_index, _)| *bucket_index);

        Some(Round {
            clears: chosen.into_iter().map(|(_, clear)| clear.clone()).collect(),
            score,
        })
    }

    /// Filter, score, sort and truncate each boss list; None once any boss runs dry
    fn rank_levels<'c>(
        &self,
        buckets: &'c ObjectiveBuckets,
        used: &HashSet<PairId>,
    ) -> Option<Vec<Level<'c>>> {
        let remaining: Vec<Vec<&Clear>> = buckets
            .iter()
            .map(|(_, clears)| clears.iter().filter(|c| !used.contains(&c.pair_id)).collect())
            .collect();

        if remaining.iter().any(Vec::is_empty) {
            return None;
        }

        // Bosses that still list each pair
        let mut usage: HashMap<&PairId, usize> = HashMap::new();
        for clears in &remaining {
            let distinct: HashSet<&PairId> = clears.iter().map(|&c| &c.pair_id).collect();
            for pair_id in distinct {
                *usage.entry(pair_id).or_insert(0) += 1;
            }
        }

        let mut levels: Vec<Level<'c>> = remaining
            .into_iter()
            .enumerate()
            .map(|(bucket_index, clears)| {
                let mut candidates: Vec<Candidate<'c>> = clears
                    .into_iter()
                    .map(|clear| {
                        let scarcity = 1.0 / usage.get(&clear.pair_id).copied().unwrap_or(1) as f64;
                        let cost_weight = 1.0 / (1.0 + clear.investment_score);
                        Candidate {
                            clear,
                            score: scarcity + cost_weight,
                        }
                    })
                    .collect();

                candidates.sort_by(|a, b| {
                    a.clear
                        .investment_score
                        .total_cmp(&b.clear.investment_score)
                        .then_with(|| b.score.total_cmp(&a.score))
                });
                candidates.truncate(self.settings.max_candidates_per_objective);

                Level {
                    bucket_index,
                    candidates,
                }
            })
            .collect();

        // Most constrained boss first (stable)
        levels.sort_by_key(|level| level.candidates.len());
        Some(levels)
    }
}

/// Exhaustive depth-first assignment with an explicit stack.
/// Returns the best total and the chosen candidate index per level;
/// ties keep the first assignment found.
fn search(levels: &[Level<'_>]) -> Option<(f64, Vec<usize>)> {
    let depth_limit = levels.len();
    if depth_limit == 0 {
        return None;
    }

    let mut cursors = vec![0usize; depth_limit];
    let mut picks: Vec<usize> = Vec::with_capacity(depth_limit);
    let mut sums: Vec<f64> = Vec::with_capacity(depth_limit);
    let mut in_round: HashSet<&PairId> = HashSet::new();
    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut depth = 0;

    loop {
        if depth == depth_limit {
            let total = sums.last().copied().unwrap_or(0.0);
            if best.as_ref().map_or(true, |(score, _)| total > *score) {
                best = Some((total, picks.clone()));
            }
        } else {
            let level = &levels[depth];
            let mut advanced = false;

            while cursors[depth] < level.candidates.len() {
                let index = cursors[depth];
                cursors[depth] += 1;

                let candidate = &level.candidates[index];
                if in_round.contains(&candidate.clear.pair_id) {
                    continue;
                }

                in_round.insert(&candidate.clear.pair_id);
                picks.push(index);
                sums.push(sums.last().copied().unwrap_or(0.0) + candidate.score);
                advanced = true;
                break;
            }

            if advanced {
                depth += 1;
                if depth < depth_limit {
                    cursors[depth] = 0;
                }
                continue;
            }

            if depth == 0 {
                break;
            }
        }

        // Backtrack: undo the pick made at the previous level
        depth -= 1;
        if let Some(index) = picks.pop() {
            sums.pop();
            in_round.remove(&levels[depth].candidates[index].clear.pair_id);
        }
    }

    best
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn clear(boss: &str, pair: &str, investment: &str) -> Clear {
        Clear::new(boss, PairId::new(pair, "1"), investment)
    }

    fn buckets(clears: Vec<Clear>) -> ObjectiveBuckets {
        clears.into_iter().collect()
    }

    fn pairs(round: &Round) -> Vec<String> {
        round.clears.iter().map(|c| c.pair_id.dex.clone()).collect()
    }

    fn assert_round_invariants(rounds: &[Round], boss_count: usize) {
        let mut seen: HashSet<&PairId> = HashSet::new();
        for round in rounds {
            assert_eq!(round.len(), boss_count);
            let bosses: HashSet<&String> = round.clears.iter().map(|c| &c.boss).collect();
            assert_eq!(bosses.len(), boss_count);
            for pair_id in round.pair_ids() {
                assert!(seen.insert(pair_id), "pair {} reused", pair_id);
            }
        }
    }

    #[test]
    fn test_shared_pair_pool_uses_each_once() {
        let b = buckets(vec![
            clear("A", "x", "1"),
            clear("A", "y", "2"),
            clear("B", "x", "1"),
            clear("B", "y", "2"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();

        assert_eq!(rounds.len(), 1);
        assert_round_invariants(&rounds, 2);
        // Equal totals: first assignment found wins
        assert_eq!(pairs(&rounds[0]), vec!["x", "y"]);
    }

    #[test]
    fn test_disjoint_pools_give_several_rounds() {
        let b = buckets(vec![
            clear("A", "a", "1"),
            clear("A", "b", "3"),
            clear("B", "c", "1"),
            clear("B", "d", "2"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();

        assert_eq!(rounds.len(), 2);
        assert_round_invariants(&rounds, 2);
        assert_eq!(pairs(&rounds[0]), vec!["a", "c"]);
        assert_eq!(pairs(&rounds[1]), vec!["b", "d"]);
    }

    #[test]
    fn test_more_bosses_than_pairs_gives_no_round() {
        let b = buckets(vec![
            clear("A", "x", "1"),
            clear("A", "y", "1"),
            clear("B", "x", "1"),
            clear("B", "y", "1"),
            clear("C", "x", "1"),
            clear("C", "y", "1"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();
        assert!(rounds.is_empty());
    }

    #[test]
    fn test_single_shared_pair_gives_no_round() {
        let b = buckets(vec![clear("A", "x", "1"), clear("B", "x", "1")]);
        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();
        assert!(rounds.is_empty());
    }

    #[test]
    fn test_maximizes_round_score() {
        // p only clears A, r only clears B; q clears both
        let b = buckets(vec![
            clear("A", "p", "1"),
            clear("A", "q", "1"),
            clear("B", "q", "1"),
            clear("B", "r", "5"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();

        assert_eq!(rounds.len(), 1);
        assert_eq!(pairs(&rounds[0]), vec!["p", "r"]);
        let expected = (1.0 + 0.5) + (1.0 + 1.0 / 6.0);
        assert!((rounds[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_round_clears_in_bucket_order() {
        // B has fewer candidates and is searched first
        let b = buckets(vec![
            clear("A", "a", "1"),
            clear("A", "b", "1"),
            clear("B", "a", "1"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();

        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].clears[0].boss, "A");
        assert_eq!(rounds[0].clears[1].boss, "B");
        assert_eq!(pairs(&rounds[0]), vec!["b", "a"]);
    }

    #[test]
    fn test_round_listed_by_investment() {
        let b = buckets(vec![
            clear("A", "a", "5/5"),
            clear("B", "b", "3/5 EX"),
            clear("C", "c", "1/5"),
            clear("D", "d", "1/5"),
        ]);

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();
        assert_eq!(rounds.len(), 1);

        let bosses: Vec<&str> = rounds[0]
            .by_investment()
            .iter()
            .map(|c| c.boss.as_str())
            .collect();
        assert_eq!(bosses, vec!["C", "D", "B", "A"]);
        // Round itself stays in bucket order
        assert_eq!(rounds[0].clears[0].boss, "A");
    }

    #[test]
    fn test_truncation_limits_candidates() {
        let b = buckets(vec![
            clear("A", "a", "1"),
            clear("A", "b", "2"),
            clear("B", "a", "1"),
        ]);

        let wide = RoundPlanner::default().plan_rounds(&b).unwrap();
        assert_eq!(wide.len(), 1);

        let narrow = RoundPlanner::new(PlannerSettings {
            max_candidates_per_objective: 1,
            ..PlannerSettings::default()
        });
        // A keeps only "a", which B also needs
        assert!(narrow.plan_rounds(&b).unwrap().is_empty());
    }

    #[test]
    fn test_empty_buckets() {
        let rounds = RoundPlanner::default()
            .plan_rounds(&ObjectiveBuckets::new())
            .unwrap();
        assert!(rounds.is_empty());
    }

    #[test]
    fn test_too_many_objectives() {
        let b = buckets(vec![
            clear("A", "a", "1"),
            clear("B", "b", "1"),
            clear("C", "c", "1"),
        ]);
        let planner = RoundPlanner::new(PlannerSettings {
            max_objectives: Some(2),
            ..PlannerSettings::default()
        });

        assert_eq!(
            planner.plan_rounds(&b),
            Err(PlanError::TooManyObjectives { count: 3, limit: 2 })
        );
    }

    #[test]
    fn test_wide_sheet_plans_without_cap() {
        let b = buckets(
            (0..33)
                .map(|i| clear(&format!("Boss {}", i), &format!("p{}", i), "1"))
                .collect(),
        );

        let rounds = RoundPlanner::default().plan_rounds(&b).unwrap();

        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].len(), 33);
        assert_round_invariants(&rounds, 33);
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: PlannerSettings =
            serde_json::from_str(r#"{"max_objectives": 12}"#).unwrap();
        assert_eq!(settings.max_objectives, Some(12));
        assert_eq!(settings.max_candidates_per_objective, 160);

        let unset: PlannerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(unset.max_objectives, None);
    }
}
