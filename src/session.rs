// 🎮 Planner Session - Owns every piece of derived state
//
// catalog + export ──▶ roster ──▶ index set ──┐
// payload ──▶ row cache ──────────────────────┼─▶ clears + report ──▶ rounds
// override ledger ────────────────────────────┘
//
// Each load builds the next state into fresh values and assigns them only
// after every step succeeded. A failed load leaves the session untouched.

use crate::alt_tags::AltTagTable;
use crate::clears::{cache_rows, ClearBuilder, ObjectiveBuckets, ResolutionReport, RowCache};
use crate::config::PlannerConfig;
use crate::entities::{
    parse_export, PairId, Roster, RosterExport, RosterSummary, SyncPairCatalog,
};
use crate::error::{LoadError, PlanError, SessionError};
use crate::index::IndexSet;
use crate::overrides::OverrideLedger;
use crate::payload::{ClearsPayload, DEFAULT_BOSS_HEADER_HINTS};
use crate::planner::{PlannerSettings, Round, RoundPlanner};
use crate::resolver::{MatchOutcome, MatchResolver, ResolverTier};
use std::path::Path;
use tracing::{debug, info, warn};

pub struct PlannerSession {
    table: AltTagTable,
    planner: RoundPlanner,
    boss_hints: Vec<String>,

    catalog: SyncPairCatalog,
    export: RosterExport,
    roster: Roster,
    roster_summary: RosterSummary,
    indices: IndexSet,

    payload: Option<ClearsPayload>,
    rows: RowCache,
    ledger: OverrideLedger,

    buckets: ObjectiveBuckets,
    report: ResolutionReport,
}

impl PlannerSession {
    pub fn new(table: AltTagTable, settings: PlannerSettings) -> Self {
        PlannerSession {
            table,
            planner: RoundPlanner::new(settings),
            boss_hints: DEFAULT_BOSS_HEADER_HINTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            catalog: SyncPairCatalog::default(),
            export: RosterExport::new(),
            roster: Roster::default(),
            roster_summary: RosterSummary::default(),
            indices: IndexSet::empty(),
            payload: None,
            rows: RowCache::new(),
            ledger: OverrideLedger::new(),
            buckets: ObjectiveBuckets::new(),
            report: ResolutionReport::default(),
        }
    }

    /// Fails only when the configured alt-tag rules file cannot be loaded
    pub fn from_config(config: &PlannerConfig) -> anyhow::Result<Self> {
        let mut session = Self::new(config.alt_tag_table()?, config.planner);
        session.boss_hints = config.boss_header_hints.clone();
        Ok(session)
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    pub fn load_catalog<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let catalog = SyncPairCatalog::from_file(path)?;
        self.set_catalog(catalog);
        Ok(())
    }

    /// Swap the catalog and re-derive the roster from the retained export
    pub fn set_catalog(&mut self, catalog: SyncPairCatalog) {
        info!(pairs = catalog.len(), "catalog loaded");
        self.catalog = catalog;
        self.refresh_roster();
    }

    pub fn load_roster<P: AsRef<Path>>(&mut self, path: P) -> Result<&RosterSummary, LoadError> {
        let json = LoadError::read_to_string(path.as_ref())?;
        self.load_roster_str(&json)
    }

    pub fn load_roster_str(&mut self, json: &str) -> Result<&RosterSummary, LoadError> {
        let export = parse_export(json)?;
        self.export = export;
        self.refresh_roster();
        Ok(&self.roster_summary)
    }

    pub fn load_payload<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let payload = ClearsPayload::from_file(path, &self.boss_hints)?;
        self.set_payload(payload);
        Ok(())
    }

    pub fn load_payload_str(&mut self, json: &str) -> Result<(), LoadError> {
        let payload = ClearsPayload::from_json_str(json)?;
        self.set_payload(payload);
        Ok(())
    }

    pub fn set_payload(&mut self, payload: ClearsPayload) {
        info!(rows = payload.rows.len(), bosses = payload.boss_names().len(), "clears payload loaded");
        self.rows = cache_rows(&payload);
        self.payload = Some(payload);
        self.rebuild_clears();
    }

    // ========================================================================
    // OVERRIDES
    // ========================================================================

    /// Bind a label to a catalog pair and rebuild
    pub fn bind(&mut self, label: &str, pair_id: PairId) -> Result<(), SessionError> {
        if !self.catalog.contains(&pair_id) {
            return Err(SessionError::UnknownPair(pair_id.to_string()));
        }
        if !self.roster.owns(&pair_id) {
            warn!(label = %label, pair_id = %pair_id, "binding to a pair that is not owned");
        }

        self.ledger.bind(label, pair_id);
        self.rebuild_clears();
        Ok(())
    }

    pub fn unbind(&mut self, label: &str) -> bool {
        let removed = self.ledger.unbind(label).is_some();
        if removed {
            self.rebuild_clears();
        }
        removed
    }

    pub fn unbind_all(&mut self) {
        self.ledger.unbind_all();
        self.rebuild_clears();
    }

    /// Replace the ledger wholesale (e.g. from the override store)
    pub fn set_ledger(&mut self, ledger: OverrideLedger) {
        debug!(bindings = ledger.len(), "override ledger replaced");
        self.ledger = ledger;
        self.rebuild_clears();
    }

    // ========================================================================
    // DERIVED STATE
    // ========================================================================

    fn refresh_roster(&mut self) {
        let (roster, summary) = Roster::from_export(&self.catalog, &self.export);
        if summary.missing > 0 {
            warn!(missing = summary.missing, "ownership keys not found in catalog");
        }
        info!(owned = summary.loaded, missing = summary.missing, "roster rebuilt");

        let indices = IndexSet::build(&self.catalog, &roster, &self.table);
        debug!(
            owned_keys = indices.owned_exact.key_count(),
            catalog_keys = indices.catalog_exact.key_count(),
            "lookup indices rebuilt"
        );

        self.roster = roster;
        self.roster_summary = summary;
        self.indices = indices;
        self.rebuild_clears();
    }

    /// Re-resolve every cached row; no-op until a payload is loaded
    pub fn rebuild_clears(&mut self) {
        let Some(payload) = &self.payload else {
            return;
        };

        let resolver = MatchResolver::new(&self.indices, &self.table);
        let (buckets, report) =
            ClearBuilder::new(&resolver, &self.roster).build(payload, &self.rows, &self.ledger);

        info!(
            clears = buckets.clear_count(),
            bosses = buckets.boss_count(),
            unresolved = report.unresolved_count(),
            manual = report.manual_clears,
            "clears rebuilt"
        );

        self.buckets = buckets;
        self.report = report;
    }

    pub fn plan(&self) -> Result<Vec<Round>, PlanError> {
        self.planner.plan_rounds(&self.buckets)
    }

    pub fn resolve(&self, label: &str) -> MatchOutcome {
        MatchResolver::new(&self.indices, &self.table).resolve(label)
    }

    /// Resolve against the current indices and report the concluding tier
    pub fn resolve_traced(&self, label: &str) -> (Option<ResolverTier>, MatchOutcome) {
        MatchResolver::new(&self.indices, &self.table).resolve_traced(label)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn catalog(&self) -> &SyncPairCatalog {
        &self.catalog
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_summary(&self) -> &RosterSummary {
        &self.roster_summary
    }

    pub fn payload(&self) -> Result<&ClearsPayload, SessionError> {
        self.payload.as_ref().ok_or(SessionError::NoPayload)
    }

    pub fn ledger(&self) -> &OverrideLedger {
        &self.ledger
    }

    pub fn buckets(&self) -> &ObjectiveBuckets {
        &self.buckets
    }

    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Display name for a pair id, falling back to the raw id
    pub fn pair_name(&self, pair_id: &PairId) -> String {
        self.catalog
            .get(pair_id)
            .map(|pair| pair.display_name())
            .unwrap_or_else(|| pair_id.to_string())
    }
}

impl Default for PlannerSession {
    fn default() -> Self {
        Self::new(AltTagTable::with_defaults(), PlannerSettings::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"dexNumber": 4, "pokemonNumber": 1, "trainerName": "Red", "pokemonName": "Pikachu"},
        {"dexNumber": 5, "pokemonNumber": 12, "trainerName": "Blue", "pokemonName": "Pidgeot"},
        {"dexNumber": 7, "pokemonNumber": 1, "trainerName": "Cynthia", "pokemonName": "Garchomp"}
    ]"#;

    const PAYLOAD: &str = r#"{
        "rows": [
            {"syncPair": "Red & Pikachu", "bosses": {"Tornadus": "1/5", "Raikou": "EX"}},
            {"syncPair": "Blue & Pidgeot", "bosses": {"Tornadus": "2/5", "Raikou": "3/5"}},
            {"syncPair": "Mystery Guest", "bosses": {"Tornadus": "20/20"}}
        ]
    }"#;

    fn loaded_session() -> PlannerSession {
        let mut session = PlannerSession::default();
        session.set_catalog(SyncPairCatalog::from_json_str(CATALOG).unwrap());
        session.load_roster_str(r#"{"4|1": "0", "5|12": "1", "99|1": "0"}"#).unwrap();
        session.load_payload_str(PAYLOAD).unwrap();
        session
    }

    #[test]
    fn test_full_flow() {
        let session = loaded_session();

        assert_eq!(session.roster_summary().loaded, 2);
        assert_eq!(session.roster_summary().missing, 1);
        assert_eq!(session.buckets().clear_count(), 4);
        assert_eq!(session.report().unmatched.get("Mystery Guest"), Some(&1));

        let rounds = session.plan().unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].clears.len(), 2);
    }

    #[test]
    fn test_bind_rebuilds_clears() {
        let mut session = loaded_session();

        session.bind("Mystery Guest", PairId::new("5", "12")).unwrap();
        assert!(session.report().unmatched.is_empty());
        // Blue already clears Tornadus, so the manual clear is deduplicated
        assert_eq!(session.buckets().clear_count(), 4);

        session.unbind_all();
        assert_eq!(session.report().unmatched.get("Mystery Guest"), Some(&1));
    }

    #[test]
    fn test_bind_unknown_pair() {
        let mut session = loaded_session();
        let result = session.bind("Mystery Guest", PairId::new("42", "1"));
        assert_eq!(result, Err(SessionError::UnknownPair("42|1".to_string())));
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut session = loaded_session();

        assert!(session.load_payload_str("{not json").is_err());
        assert!(session.load_roster_str("[1, 2]").is_err());

        assert_eq!(session.roster().len(), 2);
        assert_eq!(session.buckets().clear_count(), 4);
        assert!(session.payload().is_ok());
    }

    #[test]
    fn test_roster_follows_catalog_reload() {
        let mut session = loaded_session();

        // Catalog loses Blue: the export is re-applied against the new catalog
        session.set_catalog(
            SyncPairCatalog::from_json_str(
                r#"[{"dexNumber": 4, "pokemonNumber": 1, "trainerName": "Red", "pokemonName": "Pikachu"}]"#,
            )
            .unwrap(),
        );

        assert_eq!(session.roster().len(), 1);
        assert_eq!(session.roster_summary().missing, 2);
        assert!(session.report().unmatched.contains_key("Blue & Pidgeot"));
    }

    #[test]
    fn test_no_payload() {
        let session = PlannerSession::default();
        assert_eq!(session.payload().err(), Some(SessionError::NoPayload));
        assert!(session.plan().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_and_names() {
        let session = loaded_session();
        assert!(session.resolve("Red").is_match());
        assert!(matches!(session.resolve("Cynthia"), MatchOutcome::NotOwned(_)));
        assert_eq!(session.pair_name(&PairId::new("4", "1")), "Red & Pikachu");
        assert_eq!(session.pair_name(&PairId::new("0", "0")), "0|0");
    }

    #[test]
    fn test_resolve_traced_reports_tier() {
        let session = loaded_session();

        let (tier, outcome) = session.resolve_traced("Red & Pikachu");
        assert_eq!(tier, Some(ResolverTier::OwnedExact));
        assert!(outcome.is_match());

        let (tier, outcome) = session.resolve_traced("Cynthia & Garchomp");
        assert_eq!(tier, Some(ResolverTier::CatalogExact));
        assert!(matches!(outcome, MatchOutcome::NotOwned(_)));

        let (tier, outcome) = session.resolve_traced("Mystery Guest");
        assert_eq!(tier, None);
        assert_eq!(outcome, MatchOutcome::Unmatched);
    }

    #[test]
    fn test_from_config() {
        let config = PlannerConfig {
            planner: PlannerSettings {
                max_objectives: Some(1),
                ..PlannerSettings::default()
            },
            ..PlannerConfig::default()
        };
        let mut session = PlannerSession::from_config(&config).unwrap();
        session.set_catalog(SyncPairCatalog::from_json_str(CATALOG).unwrap());
        session.load_roster_str(r#"{"4|1": "0", "5|12": "1"}"#).unwrap();
        session.load_payload_str(PAYLOAD).unwrap();

        assert_eq!(
            session.plan(),
            Err(PlanError::TooManyObjectives { count: 2, limit: 1 })
        );

        let broken = PlannerConfig {
            alt_tag_rules_path: Some("/nonexistent/alt_tags.json".into()),
            ..PlannerConfig::default()
        };
        assert!(PlannerSession::from_config(&broken).is_err());
    }
}
