//! Contracts for the shared document store and the score sink.
//!
//! There is no server owning match state: every client reads and writes the
//! same match document through a [`MatchStore`]. Writes carry the version
//! that was read so the store can refuse one that raced another writer.

use crate::core::MatchStatus;
use crate::domain::{MatchDocument, MatchId, MatchPatch, MatchRecord, ScoreEntry};

/// Errors reported by a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused to serve the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("match {0} not found")]
    NotFound(MatchId),
    /// The record changed since it was read.
    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
    /// Stored data failed to decode.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Sort direction for leaderboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreOrder {
    Ascending,
    #[default]
    Descending,
}

impl std::str::FromStr for ScoreOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(ScoreOrder::Ascending),
            "desc" | "descending" => Ok(ScoreOrder::Descending),
            other => Err(format!("unknown score order {other:?}")),
        }
    }
}

#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert a new match and return its id. The record starts at version 1.
    ///
    /// `createdAt` is unique across the store: a value not later than every
    /// earlier match is moved forward.
    async fn create_match(&self, document: MatchDocument) -> Result<MatchId, StoreError>;

    async fn get_match(&self, id: &MatchId) -> Result<MatchRecord, StoreError>;

    /// Merge the fields present in `patch` into the record, provided it is
    /// still at `expected_version`. Either every field is written or none.
    /// Returns the new version.
    async fn update_match_fields(
        &self,
        id: &MatchId,
        expected_version: u64,
        patch: MatchPatch,
    ) -> Result<u64, StoreError>;

    /// Matches where `player` is either side, optionally filtered by status.
    async fn query_matches_for_player(
        &self,
        player: &str,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>, StoreError>;
}

#[async_trait::async_trait]
pub trait ScoreSink: Send + Sync {
    /// Append an entry. Returns `false` when an entry with the same
    /// `(player_name, timestamp)` already exists; nothing is written then.
    async fn append_score(&self, entry: ScoreEntry) -> Result<bool, StoreError>;

    /// At most `limit` entries sorted by score in `order`, earlier
    /// timestamps first among equal scores.
    async fn query_top_scores(
        &self,
        limit: usize,
        order: ScoreOrder,
    ) -> Result<Vec<ScoreEntry>, StoreError>;
}

pub mod in_memory;
