// ⚙️ Planner Configuration
// JSON file, every field optional; CLI flags win over file values.
//
// {
//   "catalog_path": "data/syncPairs.json",
//   "pairs_path": "pairs.json",
//   "clears_path": "clears.json",
//   "overrides_db": "overrides.db",
//   "alt_tag_rules_path": "alt_tags.json",
//   "planner": { "max_candidates_per_objective": 160, "max_objectives": 40 },
//   "extra_alt_tag_rules": [ { "pattern": "holiday", "tags": ["Holiday"] } ],
//   "boss_header_hints": ["tornadus", "terrakion", "raikou"]
// }

use crate::alt_tags::{AltTagRule, AltTagTable};
use crate::payload::DEFAULT_BOSS_HEADER_HINTS;
use crate::planner::PlannerSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub catalog_path: Option<PathBuf>,
    pub pairs_path: Option<PathBuf>,
    pub clears_path: Option<PathBuf>,
    pub overrides_db: Option<PathBuf>,
    /// JSON array of extra alt-tag rules, appended after the inline extras
    pub alt_tag_rules_path: Option<PathBuf>,
    pub planner: PlannerSettings,
    pub extra_alt_tag_rules: Vec<AltTagRule>,
    pub boss_header_hints: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            catalog_path: None,
            pairs_path: None,
            clears_path: None,
            overrides_db: None,
            alt_tag_rules_path: None,
            planner: PlannerSettings::default(),
            extra_alt_tag_rules: Vec::new(),
            boss_header_hints: DEFAULT_BOSS_HEADER_HINTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl PlannerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse config JSON")
    }

    /// Default alt-tag rules, then the inline extras, then the rules file
    pub fn alt_tag_table(&self) -> Result<AltTagTable> {
        let mut table = AltTagTable::with_defaults();
        table.extend(self.extra_alt_tag_rules.iter().cloned());
        if let Some(path) = &self.alt_tag_rules_path {
            table.merge(AltTagTable::from_file(path)?);
        }
        Ok(table)
    }
}

// ============================================================================
// TESTS
// ============================================================================
