// 📄 Clears Payload - Spreadsheet extraction output
//
// Two sources produce the same shape:
//   - JSON written by the out-of-core sheet extractor
//   - a raw CSV export of the sheet, with header layout inferred here
//
// Payload rows carry: label ("syncPair"), boss → investment text, optional image.

use crate::error::LoadError;
use crate::normalize::normalize;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Header cells that are never boss columns
pub const IGNORED_HEADERS: &[&str] = &[
    "sync pair",
    "total",
    "number of solos",
    "las in depth infos",
    "las in-depth infos",
    "readme",
];

/// Boss names used to spot the boss header row in a CSV export
pub const DEFAULT_BOSS_HEADER_HINTS: &[&str] = &["tornadus", "terrakion", "raikou"];

/// Only the first rows are scanned for headers
const HEADER_SCAN_ROWS: usize = 5;

// ============================================================================
// PAYLOAD TYPES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearsPayload {
    #[serde(default)]
    pub sheet: Option<String>,

    #[serde(default)]
    pub headers: Vec<String>,

    #[serde(default)]
    pub sync_pair_column: Option<usize>,

    #[serde(default)]
    pub boss_columns: Vec<usize>,

    pub rows: Vec<PayloadRow>,

    /// boss → label → detail
    #[serde(default)]
    pub boss_details: IndexMap<String, IndexMap<String, ClearDetail>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRow {
    #[serde(default)]
    pub row: Option<usize>,

    #[serde(default)]
    pub sync_pair: String,

    #[serde(default)]
    pub image: Option<String>,

    /// boss → investment text, in column order
    #[serde(default)]
    pub bosses: IndexMap<String, String>,
}

/// Per-boss, per-label provenance (move level, grid, videos, notes)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearDetail {
    #[serde(default)]
    pub move_level: String,
    #[serde(default)]
    pub grid: String,
    #[serde(default)]
    pub min_investment: String,
    #[serde(default)]
    pub max_investment: String,
    #[serde(default)]
    pub min_video: Option<String>,
    #[serde(default)]
    pub max_video: Option<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub notes: String,
}

impl ClearsPayload {
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        serde_json::from_str(json).map_err(|source| LoadError::Json {
            what: "clears payload",
            source,
        })
    }

    /// Load `.csv` through layout inference, anything else as JSON
    pub fn from_file<P: AsRef<Path>>(path: P, boss_hints: &[String]) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_csv_reader(file, boss_hints)
        } else {
            let json = LoadError::read_to_string(path)?;
            Self::from_json_str(&json)
        }
    }

    /// Parse a raw sheet export and infer its header layout
    pub fn from_csv_reader<R: Read>(reader: R, boss_hints: &[String]) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut grid: Vec<Vec<String>> = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.iter().any(|cell| !cell.trim().is_empty()) {
                grid.push(cells);
            }
        }

        if grid.is_empty() {
            return Err(LoadError::EmptySheet);
        }

        Ok(Self::from_grid(&grid, boss_hints))
    }

    /// Build a payload from an already-split sheet grid
    pub fn from_grid(grid: &[Vec<String>], boss_hints: &[String]) -> Self {
        let layout = SheetLayout::infer(grid, boss_hints);

        let rows = grid
            .iter()
            .enumerate()
            .skip(layout.data_start)
            .map(|(i, cells)| {
                let label = cells
                    .get(layout.sync_pair_column)
                    .map(|c| c.trim().to_string())
                    .unwrap_or_default();

                let bosses = layout
                    .boss_columns
                    .iter()
                    .filter_map(|&col| {
                        let value = cells.get(col)?.trim();
                        if value.is_empty() {
                            return None;
                        }
                        Some((layout.headers[col].clone(), value.to_string()))
                    })
                    .collect();

                PayloadRow {
                    row: Some(i + 1),
                    sync_pair: label,
                    image: None,
                    bosses,
                }
            })
            .filter(|row| !row.sync_pair.is_empty())
            .collect();

        ClearsPayload {
            sheet: None,
            headers: layout.headers.clone(),
            sync_pair_column: Some(layout.sync_pair_column),
            boss_columns: layout.boss_columns.clone(),
            rows,
            boss_details: IndexMap::new(),
        }
    }

    /// Boss names in first-seen column order
    pub fn boss_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for boss in row.bosses.keys() {
                if !names.contains(boss) {
                    names.push(boss.clone());
                }
            }
        }
        names
    }

    pub fn detail(&self, boss: &str, label: &str) -> Option<&ClearDetail> {
        self.boss_details.get(boss)?.get(label)
    }
}

// ============================================================================
// SHEET LAYOUT INFERENCE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub headers: Vec<String>,
    pub sync_pair_column: usize,
    pub boss_columns: Vec<usize>,
    pub data_start: usize,
}

impl SheetLayout {
    /// Scan the first rows for the "sync pair" header row and the boss header row
    pub fn infer(grid: &[Vec<String>], boss_hints: &[String]) -> Self {
        let hints: Vec<String> = boss_hints.iter().map(|h| normalize(h)).collect();
        let mut sync_header_row = 0;
        let mut boss_header_row = 0;

        for (i, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
            let cells: Vec<String> = row.iter().map(|c| normalize(c)).collect();
            if cells.iter().any(|c| c == "sync pair") {
                sync_header_row = i;
            }
            if cells.iter().any(|c| hints.contains(c)) {
                boss_header_row = i;
            }
        }

        let headers = combine_header_rows(grid, sync_header_row, boss_header_row);

        let sync_pair_column = headers
            .iter()
            .position(|h| normalize(h) == "sync pair")
            .unwrap_or(0);

        let boss_columns = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != sync_pair_column && !h.trim().is_empty() && !is_ignored_header(h))
            .map(|(i, _)| i)
            .collect();

        SheetLayout {
            headers,
            sync_pair_column,
            boss_columns,
            data_start: sync_header_row.max(boss_header_row) + 1,
        }
    }
}

pub fn is_ignored_header(header: &str) -> bool {
    let key = normalize(header);
    // Raw text too: "las in-depth infos" normalizes with a space
    let raw = header.trim().to_lowercase();
    IGNORED_HEADERS
        .iter()
        .any(|ignored| *ignored == key || *ignored == raw)
}

/// Boss row wins, then the label row, then "Column N"
fn combine_header_rows(grid: &[Vec<String>], first: usize, second: usize) -> Vec<String> {
    let empty = Vec::new();
    let a = grid.get(first).unwrap_or(&empty);
    let b = grid.get(second).unwrap_or(&empty);
    let width = a.len().max(b.len());

    (0..width)
        .map(|i| {
            let primary = b.get(i).map(|c| c.trim()).unwrap_or("");
            let fallback = a.get(i).map(|c| c.trim()).unwrap_or("");
            if !primary.is_empty() {
                primary.to_string()
            } else if !fallback.is_empty() {
                fallback.to_string()
            } else {
                format!("Column {}", i + 1)
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        DEFAULT_BOSS_HEADER_HINTS.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_payload_from_json() {
        let payload = ClearsPayload::from_json_str(
            r#"{
                "sheet": "Current LG",
                "headers": ["Sync Pair", "Tornadus"],
                "syncPairColumn": 1,
                "bossColumns": [2],
                "rows": [
                    {"row": 4, "syncPair": "Red & Pikachu", "image": "r4_c1.png",
                     "bosses": {"Tornadus": "EX 20/20", "Raikou": "3/5"}}
                ],
                "bossDetails": {
                    "Tornadus": {"Red & Pikachu": {"moveLevel": "3", "grid": "42",
                        "minInvestment": "EX", "maxInvestment": "EX 20/20",
                        "minVideo": "https://example.com/v", "difficulty": "★", "notes": "slow"}}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(payload.rows.len(), 1);
        assert_eq!(payload.rows[0].sync_pair, "Red & Pikachu");
        assert_eq!(payload.boss_names(), vec!["Tornadus", "Raikou"]);

        let detail = payload.detail("Tornadus", "Red & Pikachu").unwrap();
        assert_eq!(detail.grid, "42");
        assert_eq!(detail.max_video, None);
        assert!(payload.detail("Raikou", "Red & Pikachu").is_none());
    }

    #[test]
    fn test_payload_rejects_malformed_json() {
        let result = ClearsPayload::from_json_str(r#"{"rows": "nope"}"#);
        assert!(matches!(result, Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_csv_layout_two_header_rows() {
        let csv = "\
Legendary Gauntlet,,,,
Sync Pair,,,Total,README
,Tornadus,Raikou,,
Red & Pikachu,EX 20/20,,2,
Lear (SS),,3/5,1,
,,,,
Number of solos,1,1,,
";
        let payload = ClearsPayload::from_csv_reader(csv.as_bytes(), &hints()).unwrap();

        assert_eq!(payload.sync_pair_column, Some(0));
        assert_eq!(payload.headers[0], "Sync Pair");
        assert_eq!(payload.headers[1], "Tornadus");
        assert_eq!(payload.boss_columns, vec![1, 2]);

        // Blank row dropped; "Number of solos" kept for the clear builder to skip
        assert_eq!(payload.rows.len(), 3);
        assert_eq!(payload.rows[0].sync_pair, "Red & Pikachu");
        assert_eq!(payload.rows[0].bosses.get("Tornadus").unwrap(), "EX 20/20");
        assert!(payload.rows[0].bosses.get("Raikou").is_none());
        assert_eq!(payload.rows[1].bosses.get("Raikou").unwrap(), "3/5");
    }

    #[test]
    fn test_csv_layout_falls_back_to_column_names() {
        let csv = "a,,c\nx,1,2\n";
        let payload = ClearsPayload::from_csv_reader(csv.as_bytes(), &hints()).unwrap();

        assert_eq!(payload.headers, vec!["a", "Column 2", "c"]);
        assert_eq!(payload.sync_pair_column, Some(0));
        assert_eq!(payload.boss_columns, vec![1, 2]);
        assert_eq!(payload.rows.len(), 1);
    }

    #[test]
    fn test_csv_empty_sheet() {
        let result = ClearsPayload::from_csv_reader(" , ,\n".as_bytes(), &hints());
        assert!(matches!(result, Err(LoadError::EmptySheet)));
    }

    #[test]
    fn test_ignored_headers() {
        assert!(is_ignored_header("Sync Pair"));
        assert!(is_ignored_header("LAS In-Depth Infos"));
        assert!(is_ignored_header("Number of Solos"));
        assert!(!is_ignored_header("Tornadus"));
    }
}
