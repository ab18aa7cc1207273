//! Commonly used types and utilities for ease of import.

pub use crate::core::{
    Board, Cell, GameConfig, MatchError, MatchState, MatchStatus, Orientation, PlayerStatus,
    Role, ShotOutcome,
};

#[cfg(feature = "std")]
pub use crate::{
    IdentityService, InMemoryIdentity, InMemoryStore, MatchId, MatchStore, MatchSync, PlayerId,
    PlayerView, ScoreSink, SyncConfig, SyncError,
};
