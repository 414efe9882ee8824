// Entity Models
// SyncPair: canonical catalog pairing (stable two-part identity)
// Roster:   the user's owned pool built from a tracker export

pub mod roster;
pub mod sync_pair;

pub use roster::{
    parse_export, sync_level_from_export, Roster, RosterEntry, RosterExport, RosterSummary,
    SYNC_LEVEL_MAPPING,
};
pub use sync_pair::{PairId, SyncPair, SyncPairCatalog};
