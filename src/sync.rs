#![cfg(feature = "std")]
//! Synchronization layer: runs match transitions as read-modify-write cycles
//! against the shared [`MatchStore`].
//!
//! Every write names only the fields the transition changed and carries the
//! version it read. If another client wrote in between, the store refuses
//! the write and the whole transition is replayed on a fresh read, up to
//! `max_write_retries` times.

use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::core::{
    GameConfig, MatchError, MatchState, MatchStatus, Orientation, PlacementReport, Role,
    ShotReport,
};
use crate::domain::{MatchDocument, MatchId, MatchPatch, MatchSummary, PlayerView, ScoreEntry};
use crate::identity::{IdentityError, IdentityService, PlayerId};
use crate::store::{MatchStore, ScoreOrder, ScoreSink, StoreError};

/// Settings for [`MatchSync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub game: GameConfig,
    /// Extra attempts after a version conflict.
    pub max_write_retries: usize,
    pub leaderboard_limit: usize,
    pub score_order: ScoreOrder,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            max_write_retries: 3,
            leaderboard_limit: 10,
            score_order: ScoreOrder::Descending,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `NAVAL_WRITE_RETRIES`,
    /// `NAVAL_LEADERBOARD_LIMIT` and `NAVAL_SCORE_ORDER` when set and valid.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env::var("NAVAL_WRITE_RETRIES").ok().and_then(|v| v.parse().ok()) {
            config.max_write_retries = n;
        }
        if let Some(n) = env::var("NAVAL_LEADERBOARD_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.leaderboard_limit = n;
        }
        if let Some(order) = env::var("NAVAL_SCORE_ORDER").ok().and_then(|v| v.parse().ok()) {
            config.score_order = order;
        }
        config
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Match(#[from] MatchError),
    /// The store call failed; nothing was written.
    #[error("match store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("match {0} not found")]
    RecordNotFound(MatchId),
    #[error("stored match {id} is corrupt: {reason}")]
    Corrupt { id: MatchId, reason: String },
    /// Every attempt lost a race against another writer.
    #[error("gave up after {attempts} conflicting writes")]
    Contention { attempts: usize },
    /// The winning shot was saved, `report` describes it, but its score
    /// entry was not.
    #[error("match {id} finished but the score was not recorded: {reason}")]
    ScoreNotRecorded {
        id: MatchId,
        report: ShotReport,
        reason: String,
    },
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("a player cannot challenge themselves")]
    SelfChallenge,
    #[error("unknown opponent {0:?}")]
    UnknownOpponent(String),
}

impl SyncError {
    /// Failures that may succeed if the caller simply tries again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::StoreUnavailable(_)
                | SyncError::Contention { .. }
                | SyncError::ScoreNotRecorded { .. }
        )
    }
}

fn store_error(id: &MatchId, err: StoreError) -> SyncError {
    match err {
        StoreError::Unavailable(reason) => SyncError::StoreUnavailable(reason),
        StoreError::NotFound(id) => SyncError::RecordNotFound(id),
        StoreError::Malformed(reason) => SyncError::Corrupt {
            id: id.clone(),
            reason,
        },
        StoreError::VersionConflict { .. } => SyncError::Contention { attempts: 1 },
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Result of a committed transition.
struct Committed<T> {
    value: T,
    state: MatchState,
    created_at: u64,
}

/// Client-side access to matches held in a shared store.
pub struct MatchSync {
    store: Arc<dyn MatchStore>,
    scores: Arc<dyn ScoreSink>,
    identity: Arc<dyn IdentityService>,
    config: SyncConfig,
}

impl MatchSync {
    pub fn new(
        store: Arc<dyn MatchStore>,
        scores: Arc<dyn ScoreSink>,
        identity: Arc<dyn IdentityService>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            scores,
            identity,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    async fn fetch(&self, id: &MatchId) -> Result<(u64, u64, MatchState), SyncError> {
        let record = self
            .store
            .get_match(id)
            .await
            .map_err(|e| store_error(id, e))?;
        let state = record
            .document
            .to_state(&self.config.game)
            .map_err(|e| SyncError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
        Ok((record.version, record.document.created_at, state))
    }

    /// Fetch, apply `transition` for `player`, write the resulting patch at
    /// the version that was read. Replays on version conflicts.
    async fn transact<T, F>(
        &self,
        id: &MatchId,
        player: &str,
        mut transition: F,
    ) -> Result<Committed<T>, SyncError>
    where
        F: FnMut(&mut MatchState, Role) -> Result<(T, MatchPatch), MatchError> + Send,
        T: Send,
    {
        let attempts = self.config.max_write_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let (version, created_at, mut state) = self.fetch(id).await?;
            let role = state.require_role(player)?;
            let (value, patch) = transition(&mut state, role)?;
            match self.store.update_match_fields(id, version, patch).await {
                Ok(new_version) => {
                    debug!("[MatchSync] {} committed at version {}", id, new_version);
                    return Ok(Committed {
                        value,
                        state,
                        created_at,
                    });
                }
                Err(StoreError::VersionConflict { expected, found }) => {
                    warn!(
                        "[MatchSync] {} changed underneath {} (read {}, now {}), attempt {}/{}",
                        id, player, expected, found, attempt, attempts
                    );
                }
                Err(e) => {
                    warn!("[MatchSync] write to {} failed: {}", id, e);
                    return Err(store_error(id, e));
                }
            }
        }
        Err(SyncError::Contention { attempts })
    }

    /// Start a match between the authenticated `challenger` and `opponent`.
    pub async fn challenge(
        &self,
        challenger: &PlayerId,
        opponent: &str,
    ) -> Result<MatchId, SyncError> {
        let me = self.identity.resolve_name(challenger).await?;
        if me == opponent {
            return Err(SyncError::SelfChallenge);
        }
        let others = self.identity.list_other_players(challenger).await?;
        if !others.iter().any(|n| n == opponent) {
            return Err(SyncError::UnknownOpponent(opponent.to_owned()));
        }
        let state = MatchState::new(self.config.game.clone(), me, opponent.to_owned());
        let document = MatchDocument::from_state(&state, now_millis());
        let id = self
            .store
            .create_match(document)
            .await
            .map_err(|e| match e {
                StoreError::Unavailable(reason) => SyncError::StoreUnavailable(reason),
                other => SyncError::StoreUnavailable(other.to_string()),
            })?;
        info!(
            "[MatchSync] {} created: {} vs {}",
            id,
            state.player_name(Role::Player1),
            opponent
        );
        Ok(id)
    }

    /// Players `player` may challenge.
    pub async fn opponents(&self, player: &PlayerId) -> Result<Vec<String>, SyncError> {
        Ok(self.identity.list_other_players(player).await?)
    }

    /// Current state of a match as `player` sees it.
    pub async fn load_view(&self, id: &MatchId, player: &str) -> Result<PlayerView, SyncError> {
        let (version, _, state) = self.fetch(id).await?;
        let role = state.require_role(player)?;
        Ok(PlayerView::new(id.clone(), version, &state, role))
    }

    /// Place one ship of `player`'s fleet.
    pub async fn place_ship(
        &self,
        id: &MatchId,
        player: &str,
        origin: (usize, usize),
        size: usize,
        orientation: Orientation,
    ) -> Result<PlacementReport, SyncError> {
        let committed = self
            .transact(id, player, |state, role| {
                let report = state.place_ship(role, origin, size, orientation)?;
                Ok((report, MatchPatch::after_placement(state, role)))
            })
            .await?;
        let report = committed.value;
        if report.match_started {
            info!("[MatchSync] {} fleets complete, play begins", id);
        } else if report.fleet_complete {
            info!("[MatchSync] {} fleet of {} complete", id, player);
        }
        Ok(report)
    }

    /// `player` fires at (`row`, `col`). A winning shot also records the
    /// score entry.
    pub async fn fire(
        &self,
        id: &MatchId,
        player: &str,
        row: usize,
        col: usize,
    ) -> Result<ShotReport, SyncError> {
        let committed = self
            .transact(id, player, |state, role| {
                let report = state.fire(role, row, col)?;
                Ok((report, MatchPatch::after_shot(state, role)))
            })
            .await?;
        let report = committed.value;
        debug!(
            "[MatchSync] {} {} fired at ({}, {}): {:?}",
            id, player, row, col, report.outcome
        );
        if report.won {
            info!(
                "[MatchSync] {} won by {} at turn {}",
                id, player, report.turn
            );
            self.emit_score(id, &committed.state, committed.created_at)
                .await
                .map_err(|e| SyncError::ScoreNotRecorded {
                    id: id.clone(),
                    report,
                    reason: e.to_string(),
                })?;
        }
        Ok(report)
    }

    async fn emit_score(
        &self,
        id: &MatchId,
        state: &MatchState,
        created_at: u64,
    ) -> Result<bool, StoreError> {
        let Some(winner) = state.winner_name() else {
            return Ok(false);
        };
        let entry = ScoreEntry {
            player_name: winner.to_owned(),
            score: state.turn(),
            timestamp: created_at,
        };
        let appended = self.scores.append_score(entry).await?;
        if appended {
            info!("[MatchSync] {} score {} recorded for {}", id, state.turn(), winner);
        }
        Ok(appended)
    }

    /// Record the score of a finished match. Safe to call any number of
    /// times; returns `true` only when an entry was actually written.
    pub async fn report_completion(&self, id: &MatchId) -> Result<bool, SyncError> {
        let (_, created_at, state) = self.fetch(id).await?;
        if state.status() != MatchStatus::Finished {
            return Ok(false);
        }
        self.emit_score(id, &state, created_at)
            .await
            .map_err(|e| store_error(id, e))
    }

    /// Matches `player` takes part in, newest first.
    pub async fn active_matches(
        &self,
        player: &str,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchSummary>, SyncError> {
        let records = self
            .store
            .query_matches_for_player(player, status)
            .await
            .map_err(|e| match e {
                StoreError::Unavailable(reason) => SyncError::StoreUnavailable(reason),
                other => SyncError::StoreUnavailable(other.to_string()),
            })?;
        let mut summaries: Vec<MatchSummary> = records
            .iter()
            .filter_map(|r| MatchSummary::for_player(r, player))
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }

    /// Leaderboard with the configured limit and order.
    pub async fn leaderboard(&self) -> Result<Vec<ScoreEntry>, SyncError> {
        self.leaderboard_with(self.config.leaderboard_limit, self.config.score_order)
            .await
    }

    pub async fn leaderboard_with(
        &self,
        limit: usize,
        order: ScoreOrder,
    ) -> Result<Vec<ScoreEntry>, SyncError> {
        self.scores
            .query_top_scores(limit, order)
            .await
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))
    }
}
