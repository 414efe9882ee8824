// Gauntlet Planner - Core Library
// Label resolution + round planning, used by the CLI and tests

pub mod aliases;     // Alias variants per sync pair
pub mod alt_tags;    // Alt-tag rules as data
pub mod clears;      // Sheet rows → per-boss clears + diagnostics
pub mod config;      // Planner configuration
pub mod entities;    // Sync pair catalog + owned roster
pub mod error;       // Typed errors
pub mod index;       // Normalized alias key → candidates
pub mod investment;  // Investment cost proxy
pub mod normalize;   // Label normalizers
pub mod overrides;   // Manual override ledger + SQLite store
pub mod payload;     // Clears payload (JSON / CSV)
pub mod planner;     // Round planner
pub mod resolver;    // Tiered match resolver
pub mod session;     // Planner session (state owner)

// Re-export commonly used types
pub use alt_tags::{AltTagRule, AltTagTable, MatchKind};
pub use clears::{Clear, ClearBuilder, ObjectiveBuckets, ResolutionReport};
pub use config::PlannerConfig;
pub use entities::{PairId, Roster, RosterEntry, RosterSummary, SyncPair, SyncPairCatalog};
pub use error::{LoadError, PlanError, SessionError};
pub use index::{IndexSet, LookupIndex, Strictness};
pub use investment::investment_score;
pub use normalize::{normalize, normalize_loose, strip_digits};
pub use overrides::{OverrideEvent, OverrideLedger, OverrideStore};
pub use payload::{ClearDetail, ClearsPayload, PayloadRow};
pub use planner::{PlannerSettings, Round, RoundPlanner};
pub use resolver::{MatchOutcome, MatchResolver, MatchStatus, ResolverTier};
pub use session::PlannerSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
