#![cfg(feature = "std")]
//! Persisted match documents, partial updates, score entries and the
//! per-player views built from them.
//!
//! Boards travel as dense lists of `{row, col, state}` entries. Decoding is
//! strict: unknown states, stray coordinates, duplicates or a wrong cell
//! count are rejected instead of defaulting to `EMPTY`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{
    Board, BoardError, Cell, GameConfig, MatchParts, MatchState, MatchStatus, Orientation,
    PlayerStatus, Role, Ship, StateError,
};

/// Opaque match identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        MatchId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while turning a stored document back into a match.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid board data: {0}")]
    Board(#[from] BoardError),
    #[error("cell ({row}, {col}) listed twice")]
    DuplicateCell { row: usize, col: usize },
    #[error("winner {0:?} is not a player of this match")]
    UnknownWinner(String),
    #[error("inconsistent match: {0}")]
    State(#[from] StateError),
}

/// One board cell on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntry {
    pub row: usize,
    pub col: usize,
    pub state: Cell,
}

/// Dense encoding of a board, row-major.
pub fn board_to_entries(board: &Board) -> Vec<CellEntry> {
    board
        .iter()
        .map(|((row, col), state)| CellEntry { row, col, state })
        .collect()
}

/// Decode a dense board of side `size`. Entry order is irrelevant.
pub fn board_from_entries(size: usize, entries: &[CellEntry]) -> Result<Board, RecordError> {
    if entries.len() != size * size {
        return Err(BoardError::SizeMismatch {
            expected: size * size,
            found: entries.len(),
        }
        .into());
    }
    let mut cells: Vec<Option<Cell>> = vec![None; size * size];
    for e in entries {
        if e.row >= size || e.col >= size {
            return Err(BoardError::OutOfBounds {
                row: e.row,
                col: e.col,
            }
            .into());
        }
        let slot = &mut cells[e.row * size + e.col];
        if slot.is_some() {
            return Err(RecordError::DuplicateCell {
                row: e.row,
                col: e.col,
            });
        }
        *slot = Some(e.state);
    }
    // every slot is filled: count matched and no duplicates
    let cells = cells.into_iter().map(Option::unwrap_or_default).collect();
    Ok(Board::from_cells(size, cells)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

/// A placed ship on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipEntry {
    pub size: usize,
    pub orientation: Orientation,
    pub cells: Vec<Coord>,
}

impl From<&Ship> for ShipEntry {
    fn from(ship: &Ship) -> Self {
        ShipEntry {
            size: ship.size(),
            orientation: ship.orientation(),
            cells: ship
                .cells()
                .iter()
                .map(|&(row, col)| Coord { row, col })
                .collect(),
        }
    }
}

impl ShipEntry {
    fn to_ship(&self, board_size: usize) -> Result<Ship, RecordError> {
        let cells = self.cells.iter().map(|c| (c.row, c.col)).collect();
        let ship = Ship::from_cells(self.orientation, cells, board_size)?;
        if ship.size() != self.size {
            return Err(BoardError::InvalidShipSize { size: self.size }.into());
        }
        Ok(ship)
    }
}

fn ships_to_entries(ships: &[Ship]) -> Vec<ShipEntry> {
    ships.iter().map(ShipEntry::from).collect()
}

/// Every persisted field of a match, minus its id and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDocument {
    pub player1_name: String,
    pub player2_name: String,
    pub status: MatchStatus,
    pub player1_status: PlayerStatus,
    pub player2_status: PlayerStatus,
    pub turn: u32,
    pub board_player1: Vec<CellEntry>,
    pub board_player2: Vec<CellEntry>,
    pub tracking_player1: Vec<CellEntry>,
    pub tracking_player2: Vec<CellEntry>,
    #[serde(default)]
    pub ships_player1: Vec<ShipEntry>,
    #[serde(default)]
    pub ships_player2: Vec<ShipEntry>,
    #[serde(default)]
    pub winner: Option<String>,
    pub created_at: u64,
}

impl MatchDocument {
    /// Snapshot every field of `state`.
    pub fn from_state(state: &MatchState, created_at: u64) -> Self {
        let p1 = Role::Player1;
        let p2 = Role::Player2;
        MatchDocument {
            player1_name: state.player_name(p1).to_owned(),
            player2_name: state.player_name(p2).to_owned(),
            status: state.status(),
            player1_status: state.player_status(p1),
            player2_status: state.player_status(p2),
            turn: state.turn(),
            board_player1: board_to_entries(state.own_board(p1)),
            board_player2: board_to_entries(state.own_board(p2)),
            tracking_player1: board_to_entries(state.tracking_board(p1)),
            tracking_player2: board_to_entries(state.tracking_board(p2)),
            ships_player1: ships_to_entries(state.ships(p1)),
            ships_player2: ships_to_entries(state.ships(p2)),
            winner: state.winner_name().map(str::to_owned),
            created_at,
        }
    }

    /// Rebuild the match under `config`.
    pub fn to_state(&self, config: &GameConfig) -> Result<MatchState, RecordError> {
        let n = config.board_size();
        let winner = match &self.winner {
            None => None,
            Some(name) => Some(
                Role::resolve(&self.player1_name, &self.player2_name, name)
                    .ok_or_else(|| RecordError::UnknownWinner(name.clone()))?,
            ),
        };
        let ships = |entries: &[ShipEntry]| -> Result<Vec<Ship>, RecordError> {
            entries.iter().map(|e| e.to_ship(n)).collect()
        };
        let parts = MatchParts {
            players: [self.player1_name.clone(), self.player2_name.clone()],
            status: self.status,
            player_status: [self.player1_status, self.player2_status],
            turn: self.turn,
            boards: [
                board_from_entries(n, &self.board_player1)?,
                board_from_entries(n, &self.board_player2)?,
            ],
            tracking: [
                board_from_entries(n, &self.tracking_player1)?,
                board_from_entries(n, &self.tracking_player2)?,
            ],
            ships: [ships(&self.ships_player1)?, ships(&self.ships_player2)?],
            winner,
        };
        Ok(MatchState::from_parts(config.clone(), parts)?)
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        Role::resolve(&self.player1_name, &self.player2_name, name)
    }

    pub fn player_status(&self, role: Role) -> PlayerStatus {
        match role {
            Role::Player1 => self.player1_status,
            Role::Player2 => self.player2_status,
        }
    }

    pub fn player_name(&self, role: Role) -> &str {
        match role {
            Role::Player1 => &self.player1_name,
            Role::Player2 => &self.player2_name,
        }
    }
}

/// A stored match: store-assigned id, optimistic version and document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub version: u64,
    #[serde(flatten)]
    pub document: MatchDocument,
}

/// Partial update of a match document. Absent fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player1_status: Option<PlayerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player2_status: Option<PlayerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_player1: Option<Vec<CellEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_player2: Option<Vec<CellEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_player1: Option<Vec<CellEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_player2: Option<Vec<CellEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ships_player1: Option<Vec<ShipEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ships_player2: Option<Vec<ShipEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl MatchPatch {
    fn with_statuses(state: &MatchState) -> Self {
        MatchPatch {
            status: Some(state.status()),
            player1_status: Some(state.player_status(Role::Player1)),
            player2_status: Some(state.player_status(Role::Player2)),
            ..MatchPatch::default()
        }
    }

    /// Fields touched when `role` places a ship: that player's own board and
    /// ships plus the status fields. The opponent's fields are never named.
    pub fn after_placement(state: &MatchState, role: Role) -> Self {
        let mut patch = MatchPatch::with_statuses(state);
        let board = Some(board_to_entries(state.own_board(role)));
        let ships = Some(ships_to_entries(state.ships(role)));
        match role {
            Role::Player1 => {
                patch.board_player1 = board;
                patch.ships_player1 = ships;
            }
            Role::Player2 => {
                patch.board_player2 = board;
                patch.ships_player2 = ships;
            }
        }
        patch
    }

    /// Fields touched by a shot from `shooter`: the opponent's own board,
    /// the shooter's tracking board, statuses, turn and winner.
    pub fn after_shot(state: &MatchState, shooter: Role) -> Self {
        let mut patch = MatchPatch::with_statuses(state);
        patch.turn = Some(state.turn());
        patch.winner = state.winner_name().map(str::to_owned);
        let target = Some(board_to_entries(state.own_board(shooter.opponent())));
        let tracking = Some(board_to_entries(state.tracking_board(shooter)));
        match shooter {
            Role::Player1 => {
                patch.board_player2 = target;
                patch.tracking_player1 = tracking;
            }
            Role::Player2 => {
                patch.board_player1 = target;
                patch.tracking_player2 = tracking;
            }
        }
        patch
    }

    /// Names of the fields this patch writes, as stored.
    pub fn field_names(&self) -> Vec<&'static str> {
        let fields: [(&'static str, bool); 11] = [
            ("status", self.status.is_some()),
            ("player1Status", self.player1_status.is_some()),
            ("player2Status", self.player2_status.is_some()),
            ("turn", self.turn.is_some()),
            ("boardPlayer1", self.board_player1.is_some()),
            ("boardPlayer2", self.board_player2.is_some()),
            ("trackingPlayer1", self.tracking_player1.is_some()),
            ("trackingPlayer2", self.tracking_player2.is_some()),
            ("shipsPlayer1", self.ships_player1.is_some()),
            ("shipsPlayer2", self.ships_player2.is_some()),
            ("winner", self.winner.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

/// Leaderboard line written when a match is won. `(player_name, timestamp)`
/// identifies an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_name: String,
    pub score: u32,
    pub timestamp: u64,
}

impl ScoreEntry {
    pub fn key(&self) -> (&str, u64) {
        (&self.player_name, self.timestamp)
    }
}

/// One line of a player's match list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: MatchId,
    pub opponent: String,
    pub status: MatchStatus,
    pub my_status: PlayerStatus,
    pub created_at: u64,
}

impl MatchSummary {
    /// Summary of `record` from `player`'s side, `None` if they are not in it.
    pub fn for_player(record: &MatchRecord, player: &str) -> Option<Self> {
        let role = record.document.role_of(player)?;
        Some(MatchSummary {
            id: record.id.clone(),
            opponent: record.document.player_name(role.opponent()).to_owned(),
            status: record.document.status,
            my_status: record.document.player_status(role),
            created_at: record.document.created_at,
        })
    }
}

/// Everything one player may see of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub match_id: MatchId,
    pub version: u64,
    pub role: Role,
    pub me: String,
    pub opponent: String,
    pub status: MatchStatus,
    pub my_status: PlayerStatus,
    pub opponent_status: PlayerStatus,
    pub turn: u32,
    pub winner: Option<String>,
    pub own_board: Board,
    pub tracking_board: Board,
    /// Opponent's own board with intact ships hidden.
    pub opponent_board: Board,
    /// Ship sizes still to place, largest first.
    pub remaining_fleet: Vec<usize>,
}

impl PlayerView {
    pub fn new(match_id: MatchId, version: u64, state: &MatchState, role: Role) -> Self {
        PlayerView {
            match_id,
            version,
            role,
            me: state.player_name(role).to_owned(),
            opponent: state.player_name(role.opponent()).to_owned(),
            status: state.status(),
            my_status: state.player_status(role),
            opponent_status: state.player_status(role.opponent()),
            turn: state.turn(),
            winner: state.winner_name().map(str::to_owned),
            own_board: state.own_board(role).clone(),
            tracking_board: state.tracking_board(role).clone(),
            opponent_board: state.opponent_board(role),
            remaining_fleet: state.remaining_fleet(role),
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_status == PlayerStatus::Playing
    }
}
