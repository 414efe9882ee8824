// 📌 Manual Override Ledger
// User-asserted label → pair bindings, re-applied on every clear rebuild.
//
// In-memory ledger + SQLite persistence with an append-only event trail
// (every bind/unbind is recorded, the current state lives in `overrides`).

use crate::entities::PairId;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideLedger {
    bindings: BTreeMap<String, PairId>,
}

impl OverrideLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a label; returns the previous binding if any
    pub fn bind(&mut self, label: &str, pair_id: PairId) -> Option<PairId> {
        self.bindings.insert(label.to_string(), pair_id)
    }

    pub fn unbind(&mut self, label: &str) -> Option<PairId> {
        self.bindings.remove(label)
    }

    pub fn unbind_all(&mut self) {
        self.bindings.clear();
    }

    pub fn get(&self, label: &str) -> Option<&PairId> {
        self.bindings.get(label)
    }

    pub fn list(&self) -> &BTreeMap<String, PairId> {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ============================================================================
// EVENTS (audit trail)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    Bind,
    Unbind,
    Clear,
}

impl OverrideAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideAction::Bind => "bind",
            OverrideAction::Unbind => "unbind",
            OverrideAction::Clear => "clear",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "bind" => Some(OverrideAction::Bind),
            "unbind" => Some(OverrideAction::Unbind),
            "clear" => Some(OverrideAction::Clear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: OverrideAction,
    pub label: Option<String>,
    pub pair_id: Option<String>,
}

impl OverrideEvent {
    pub fn new(action: OverrideAction, label: Option<&str>, pair_id: Option<&PairId>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            label: label.map(str::to_string),
            pair_id: pair_id.map(|id| id.to_string()),
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

pub struct OverrideStore {
    conn: Connection,
}

impl OverrideStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open override store: {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_override_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Current bindings; rows with an unparsable pair id are skipped
    pub fn load(&self) -> Result<OverrideLedger> {
        let mut stmt = self
            .conn
            .prepare("SELECT label, pair_id FROM overrides ORDER BY label")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut ledger = OverrideLedger::new();
        for (label, raw_id) in rows {
            match raw_id.parse::<PairId>() {
                Ok(pair_id) => {
                    ledger.bind(&label, pair_id);
                }
                Err(e) => {
                    tracing::warn!(label = %label, pair_id = %raw_id, error = %e, "skipping stored override");
                }
            }
        }

        Ok(ledger)
    }

    pub fn save_binding(&self, label: &str, pair_id: &PairId) -> Result<()> {
        self.conn.execute(
            "INSERT INTO overrides (label, pair_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(label) DO UPDATE SET pair_id = excluded.pair_id,
                                              updated_at = excluded.updated_at",
            params![label, pair_id.to_string(), Utc::now().to_rfc3339()],
        )?;

        self.record(&OverrideEvent::new(
            OverrideAction::Bind,
            Some(label),
            Some(pair_id),
        ))
    }

    /// Returns whether a binding existed
    pub fn remove_binding(&self, label: &str) -> Result<bool> {
        let previous: Option<String> = self
            .conn
            .query_row(
                "SELECT pair_id FROM overrides WHERE label = ?1",
                params![label],
                |row| row.get(0),
            )
            .optional()?;

        let Some(previous) = previous else {
            return Ok(false);
        };

        self.conn
            .execute("DELETE FROM overrides WHERE label = ?1", params![label])?;

        let pair_id = previous.parse::<PairId>().ok();
        self.record(&OverrideEvent::new(
            OverrideAction::Unbind,
            Some(label),
            pair_id.as_ref(),
        ))?;

        Ok(true)
    }

    /// Drop every binding; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM overrides", [])?;
        self.record(&OverrideEvent::new(OverrideAction::Clear, None, None))?;
        Ok(removed)
    }

    fn record(&self, event: &OverrideEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO override_events (event_id, timestamp, action, label, pair_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_id,
                event.timestamp.to_rfc3339(),
                event.action.as_str(),
                event.label,
                event.pair_id,
            ],
        )?;
        Ok(())
    }

    /// Audit trail, newest first (label = None → all events)
    pub fn events(&self, label: Option<&str>) -> Result<Vec<OverrideEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, timestamp, action, label, pair_id
             FROM override_events
             WHERE ?1 IS NULL OR label = ?1
             ORDER BY timestamp DESC, rowid DESC",
        )?;

        let events = stmt
            .query_map(params![label], |row| {
                let timestamp_str: String = row.get(1)?;
                let action_str: String = row.get(2)?;

                Ok(OverrideEvent {
                    event_id: row.get(0)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?
                        .with_timezone(&Utc),
                    action: OverrideAction::parse(&action_str)
                        .ok_or(rusqlite::Error::InvalidQuery)?,
                    label: row.get(3)?,
                    pair_id: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }
}

fn setup_override_tables(conn: &Connection) -> Result<()> {
    // WAL for crash recovery (no-op for in-memory databases)
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS overrides (
            label TEXT PRIMARY KEY,
            pair_id TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS override_events (
            event_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            action TEXT NOT NULL,
            label TEXT,
            pair_id TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_override_events_label ON override_events(label)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
