#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod core;
#[cfg(feature = "std")]
pub mod domain;
#[cfg(feature = "std")]
pub mod identity;
#[cfg(feature = "std")]
mod logging;
pub mod prelude;
#[cfg(feature = "std")]
pub mod store;
#[cfg(feature = "std")]
pub mod sync;

pub use crate::core::*;
#[cfg(feature = "std")]
pub use domain::{
    board_from_entries, board_to_entries, CellEntry, MatchDocument, MatchId, MatchPatch,
    MatchRecord, MatchSummary, PlayerView, RecordError, ScoreEntry, ShipEntry,
};
#[cfg(feature = "std")]
pub use identity::{IdentityError, IdentityService, InMemoryIdentity, PlayerId};
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use store::{in_memory::InMemoryStore, MatchStore, ScoreOrder, ScoreSink, StoreError};
#[cfg(feature = "std")]
pub use sync::{MatchSync, SyncConfig, SyncError};
