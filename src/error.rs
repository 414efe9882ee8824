// ⚠️ Error Types
//
// Resolution never errors (see resolver::MatchOutcome). These cover
// unreadable or unparsable input documents, a user-configured planning
// depth cap, and session misuse.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loading a top-level input document failed; prior state stays untouched
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse CSV sheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheet export contains no rows")]
    EmptySheet,
}

impl LoadError {
    pub(crate) fn read_to_string(path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("{count} objectives exceed the search depth limit of {limit}")]
    TooManyObjectives { count: usize, limit: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("pair not found in catalog: {0}")]
    UnknownPair(String),

    #[error("no clears payload loaded")]
    NoPayload,
}
