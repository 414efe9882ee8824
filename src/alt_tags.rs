// 🏷️ Alt-Tag Rules - Rules as Data
// Short-tag equivalents for trainer alternate forms ("Sygna Suit" → "SS")
//
// The resolver never hardcodes a tag: it asks this table for variants and
// abbreviations, so new costumes only need a new rule.

use anyhow::{Context as AnyhowContext, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::normalize::strip_digits;

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Whole alt text equals the pattern (case-insensitive)
    Exact,

    /// Alt text contains the pattern (case-insensitive)
    #[default]
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltTagRule {
    /// Rule ID for tracking
    #[serde(default)]
    pub id: String,

    /// Pattern to match against the alt text
    pub pattern: String,

    #[serde(default)]
    pub kind: MatchKind,

    /// Short tags a transcriber may write instead of the full alt text
    pub tags: Vec<String>,

    /// First tag doubles as the canonical abbreviation used in "Name (TAG)" labels
    #[serde(default)]
    pub abbreviation: bool,
}

impl AltTagRule {
    pub fn contains(id: &str, pattern: &str, tags: &[&str]) -> Self {
        AltTagRule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            kind: MatchKind::Contains,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            abbreviation: false,
        }
    }

    pub fn exact_abbreviation(id: &str, pattern: &str, tag: &str) -> Self {
        AltTagRule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            kind: MatchKind::Exact,
            tags: vec![tag.to_string()],
            abbreviation: true,
        }
    }

    /// Check if the rule applies to the given alt text
    pub fn matches(&self, alt: &str) -> bool {
        let alt_lower = alt.trim().to_lowercase();
        let pattern_lower = self.pattern.trim().to_lowercase();

        if pattern_lower.is_empty() {
            return false;
        }

        match self.kind {
            MatchKind::Exact => alt_lower == pattern_lower,
            MatchKind::Contains => alt_lower.contains(&pattern_lower),
        }
    }
}

// ============================================================================
// RULE TABLE
// ============================================================================

#[derive(Debug, Clone)]
pub struct AltTagTable {
    rules: Vec<AltTagRule>,
}

impl AltTagTable {
    /// Create an empty table (no built-in rules)
    pub fn empty() -> Self {
        AltTagTable { rules: Vec::new() }
    }

    /// Built-in rules for the known costume families
    pub fn with_defaults() -> Self {
        AltTagTable::from_rules(vec![
            AltTagRule::exact_abbreviation("sygna-suit", "sygna suit", "SS"),
            AltTagRule::exact_abbreviation("special-costume", "special costume", "SC"),
            AltTagRule::contains("sygna-suit-renegade", "sygna suit (renegade)", &["SSR"]),
            AltTagRule::contains("sygna-suit-renegade-bare", "sygna suit renegade", &["SSR"]),
            AltTagRule::contains("sygna-suit-alt", "sygna suit (alt", &["SSA"]),
            AltTagRule::contains("sygna-suit-alt-bare", "sygna suit alt", &["SSA"]),
            AltTagRule::contains("special-costume-any", "special costume", &["SC"]),
            AltTagRule::contains("arc-suit", "arc suit", &["Arc"]),
            AltTagRule::contains("palentine", "palentine", &["Palentine's"]),
            AltTagRule::contains("anniversary", "anniversary", &["Anni", "Anniversary"]),
            AltTagRule::contains("dojo-uniform", "dojo uniform", &["Dojo"]),
            AltTagRule::contains("summer", "summer", &["Summer"]),
            AltTagRule::contains("fall", "fall", &["Fall"]),
            AltTagRule::contains("variety", "variety", &["Variety"]),
        ])
    }

    pub fn from_rules(rules: Vec<AltTagRule>) -> Self {
        AltTagTable { rules }
    }

    /// Load extra rules from a JSON array file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read alt-tag rules file: {:?}", path.as_ref()))?;

        let rules: Vec<AltTagRule> =
            serde_json::from_str(&content).context("Failed to parse alt-tag rules JSON")?;

        Ok(AltTagTable::from_rules(rules))
    }

    pub fn add_rule(&mut self, rule: AltTagRule) {
        self.rules.push(rule);
    }

    pub fn extend<I: IntoIterator<Item = AltTagRule>>(&mut self, rules: I) {
        self.rules.extend(rules);
    }

    /// Append another table's rules after this one's
    pub fn merge(&mut self, other: AltTagTable) {
        self.rules.extend(other.rules);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Canonical short tag for "Name (TAG)" labels
    ///
    /// Example: "Sygna Suit" → "SS", "Sygna Suit (Renegade)" → "SSR",
    /// "Sygna Suit (Alt.)" → "SSA"
    pub fn abbreviation(&self, alt: &str) -> Option<String> {
        let alt = alt.trim();
        if alt.is_empty() {
            return None;
        }

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.abbreviation && rule.matches(alt))
        {
            return rule.tags.first().cloned();
        }

        parenthetical_abbreviation(alt)
    }

    /// Every alt spelling that may appear in a label for this alt text
    pub fn variants(&self, alt: &str) -> BTreeSet<String> {
        let mut variants = BTreeSet::new();
        let alt = alt.trim();
        if alt.is_empty() {
            return variants;
        }

        variants.insert(alt.to_string());

        let stripped = strip_digits(alt);
        if !stripped.is_empty() {
            variants.insert(stripped);
        }

        for rule in self.rules.iter().filter(|rule| rule.matches(alt)) {
            variants.extend(rule.tags.iter().cloned());
        }

        if let Some(abbrev) = self.abbreviation(alt) {
            variants.insert(abbrev);
        }

        variants
    }
}

impl Default for AltTagTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// "<prefix> (<parenthetical>)" → prefix initials + first letter of parenthetical
fn parenthetical_abbreviation(alt: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^([^()]+?)\s*\(([^)]+)\)$").expect("parenthetical pattern is valid")
    });

    let caps = pattern.captures(alt)?;
    let prefix = caps.get(1)?.as_str();
    let inner = caps.get(2)?.as_str().replace('.', "");

    let initials: String = prefix
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .collect();
    let last = inner.trim().chars().find(|c| c.is_alphanumeric())?;

    if initials.is_empty() {
        return None;
    }

    Some(format!("{}{}", initials, last).to_uppercase())
}

// ============================================================================
// TESTS
// ============================================================================
