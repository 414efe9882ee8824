// 💎 Investment Scorer
// Monotone cost proxy for "how expensive is it to reproduce this clear"
//
//   "5* EX 20/20"  → 5 + 1.0 + 1.0 = 7.0
//   "EX 20/20"     → 1.0 + 1.0     = 2.0
//   None / ""      → +∞
//
// Used for ranking only, never for correctness.

use regex::Regex;
use std::sync::OnceLock;

/// Maxed stat investment ("EX" unlocked)
pub const EX_BONUS: f64 = 1.0;
/// Perfect roll ("20/20" lucky skills)
pub const PERFECT_ROLL_BONUS: f64 = 1.0;
/// Ten extra enhancement levels ("+10e")
pub const TEN_LEVELS_BONUS: f64 = 0.5;
/// Random/variable roll (standalone "r")
pub const RANDOM_ROLL_BONUS: f64 = 0.5;

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)20/20|\+?10e").expect("marker pattern is valid"))
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("integer pattern is valid"))
}

fn random_roll_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\br\b").expect("random roll pattern is valid"))
}

/// Score an investment annotation (lower = cheaper)
pub fn investment_score(text: Option<&str>) -> f64 {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return f64::INFINITY,
    };
    let lower = text.to_lowercase();

    let mut score = 0.0;

    // Primary cost: first integer that is not part of a marker token
    let without_markers = marker_pattern().replace_all(text, " ");
    if let Some(first) = integer_pattern().find(&without_markers) {
        score += first.as_str().parse::<f64>().unwrap_or(0.0);
    }

    if lower.contains("ex") {
        score += EX_BONUS;
    }
    if lower.contains("20/20") {
        score += PERFECT_ROLL_BONUS;
    }
    if lower.contains("10e") {
        score += TEN_LEVELS_BONUS;
    }
    if random_roll_pattern().is_match(text) {
        score += RANDOM_ROLL_BONUS;
    }

    score.max(0.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_infinite() {
        assert_eq!(investment_score(None), f64::INFINITY);
        assert_eq!(investment_score(Some("")), f64::INFINITY);
        assert_eq!(investment_score(Some("   ")), f64::INFINITY);
    }

    #[test]
    fn test_markers_without_primary_cost() {
        assert_eq!(investment_score(Some("EX 20/20")), 2.0);
        assert_eq!(investment_score(Some("20/20")), 1.0);
        assert_eq!(investment_score(Some("+10e")), 0.5);
    }

    #[test]
    fn test_primary_cost_plus_markers() {
        assert_eq!(investment_score(Some("5* EX 20/20")), 7.0);
        assert_eq!(investment_score(Some("3/5 +10e")), 3.5);
        assert_eq!(investment_score(Some("1 R")), 1.5);
        assert_eq!(investment_score(Some("F2P")), 2.0);
    }

    #[test]
    fn test_no_contributions_is_zero() {
        assert_eq!(investment_score(Some("free")), 0.0);
        assert_eq!(investment_score(Some("Budget")), 0.0);
    }

    #[test]
    fn test_standalone_r_only() {
        // "r" inside a word does not count
        assert_eq!(investment_score(Some("rare")), 0.0);
        assert_eq!(investment_score(Some("r")), 0.5);
    }

    #[test]
    fn test_monotone_in_investment() {
        let cheap = investment_score(Some("1/5"));
        let pricey = investment_score(Some("1/5 EX"));
        let maxed = investment_score(Some("1/5 EX 20/20 +10e"));
        assert!(cheap < pricey);
        assert!(pricey < maxed);
    }
}
