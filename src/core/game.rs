//! Match state machine: placement phase, turn ownership, shots and the win
//! condition for one two-player match.
//!
//! ```text
//! match:   Waiting (placing) -> Active (playing) -> Finished
//! player:  Placing -> Waiting -> Playing <-> Waiting -> Winner | Looser
//! ```
//!
//! Exactly one player is `Playing` while the match is `Active`. A hit keeps
//! the turn with the shooter; a miss hands it over and bumps the turn
//! counter.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::core::board::Board;
use crate::core::common::{BoardError, Cell, ShotOutcome};
use crate::core::config::GameConfig;
use crate::core::fleet::{is_fleet_fully_placed, remaining_fleet, validate_placement};
use crate::core::ship::{Orientation, Ship};

/// Match-level lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum MatchStatus {
    /// Fleets are still being placed.
    Waiting,
    /// Both fleets placed, shots are being exchanged.
    Active,
    /// One fleet is sunk.
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Active => "active",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-player phase within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum PlayerStatus {
    Placing,
    Waiting,
    Playing,
    Winner,
    Looser,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Placing => "placing",
            PlayerStatus::Waiting => "waiting",
            PlayerStatus::Playing => "playing",
            PlayerStatus::Winner => "winner",
            PlayerStatus::Looser => "looser",
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seat of a player in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum Role {
    Player1,
    Player2,
}

impl Role {
    /// Work out which seat `name` occupies. Every caller that needs to know
    /// "am I player 1 or player 2" goes through here.
    pub fn resolve(player1: &str, player2: &str, name: &str) -> Option<Role> {
        if name == player1 {
            Some(Role::Player1)
        } else if name == player2 {
            Some(Role::Player2)
        } else {
            None
        }
    }

    pub fn opponent(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Role::Player1 => 0,
            Role::Player2 => 1,
        }
    }
}

/// Errors returned by match transitions. A rejected transition leaves the
/// state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Ship would leave the board or overlap another ship.
    PlacementConflict(BoardError),
    /// Acting player does not hold the move.
    NotYourTurn,
    /// Target cell was already fired at.
    AlreadyShot { row: usize, col: usize },
    /// Target cell is outside the board.
    OutOfBounds { row: usize, col: usize },
    /// Name matches neither player of the match.
    UnknownPlayer,
    /// Player already placed their whole fleet.
    PlacementAlreadyFinished,
    /// No ship of this size is left to place.
    ShipNotInFleet { size: usize },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::PlacementConflict(e) => write!(f, "placement conflict: {}", e),
            MatchError::NotYourTurn => write!(f, "not your turn"),
            MatchError::AlreadyShot { row, col } => {
                write!(f, "cell ({}, {}) was already shot", row, col)
            }
            MatchError::OutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is out of bounds", row, col)
            }
            MatchError::UnknownPlayer => write!(f, "player is not part of this match"),
            MatchError::PlacementAlreadyFinished => write!(f, "fleet placement already finished"),
            MatchError::ShipNotInFleet { size } => {
                write!(f, "no ship of size {} left to place", size)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MatchError {}

fn shot_error(err: BoardError) -> MatchError {
    match err {
        BoardError::OutOfBounds { row, col } => MatchError::OutOfBounds { row, col },
        BoardError::AlreadyShot { row, col } | BoardError::Occupied { row, col } => {
            MatchError::AlreadyShot { row, col }
        }
        other => MatchError::PlacementConflict(other),
    }
}

/// Stored parts that do not describe a reachable match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    Board(BoardError),
    /// Player phases do not fit the match status.
    InconsistentStatus {
        status: MatchStatus,
        player_status: [PlayerStatus; 2],
    },
    /// `winner` disagrees with the status fields.
    WinnerMismatch,
}

impl From<BoardError> for StateError {
    fn from(err: BoardError) -> Self {
        StateError::Board(err)
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Board(err) => write!(f, "{}", err),
            StateError::InconsistentStatus {
                status,
                player_status: [p1, p2],
            } => write!(f, "match {} with players {} and {}", status, p1, p2),
            StateError::WinnerMismatch => write!(f, "winner does not match the player statuses"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StateError {}

/// Checks that the phases and winner fit `status`.
fn check_statuses(
    status: MatchStatus,
    player_status: [PlayerStatus; 2],
    winner: Option<Role>,
) -> Result<(), StateError> {
    use PlayerStatus::*;
    let consistent = match (status, player_status) {
        (MatchStatus::Waiting, [Placing, Waiting] | [Waiting, Placing]) => true,
        (MatchStatus::Active, [Playing, Waiting] | [Waiting, Playing]) => true,
        (MatchStatus::Finished, [Winner, Looser] | [Looser, Winner]) => true,
        _ => false,
    };
    if !consistent {
        return Err(StateError::InconsistentStatus {
            status,
            player_status,
        });
    }
    let expected = match player_status {
        [Winner, _] => Some(Role::Player1),
        [_, Winner] => Some(Role::Player2),
        _ => None,
    };
    if winner != expected {
        return Err(StateError::WinnerMismatch);
    }
    Ok(())
}

/// Outcome of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementReport {
    pub ship: Ship,
    /// Sizes still to place, largest first.
    pub remaining: Vec<usize>,
    /// This player's fleet is now complete.
    pub fleet_complete: bool,
    /// Both fleets are complete and the first shot may be fired.
    pub match_started: bool,
}

/// Outcome of a successful shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub row: usize,
    pub col: usize,
    pub outcome: ShotOutcome,
    /// The shot sank the last ship.
    pub won: bool,
    /// Turn counter after the shot.
    pub turn: u32,
    /// Who moves next; `None` once the match is over.
    pub next: Option<Role>,
}

/// Raw fields of a match, used to rebuild a [`MatchState`] from storage.
#[derive(Debug, Clone)]
pub struct MatchParts {
    pub players: [String; 2],
    pub status: MatchStatus,
    pub player_status: [PlayerStatus; 2],
    pub turn: u32,
    pub boards: [Board; 2],
    pub tracking: [Board; 2],
    pub ships: [Vec<Ship>; 2],
    pub winner: Option<Role>,
}

/// Authoritative model of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    config: GameConfig,
    players: [String; 2],
    status: MatchStatus,
    player_status: [PlayerStatus; 2],
    turn: u32,
    boards: [Board; 2],
    tracking: [Board; 2],
    ships: [Vec<Ship>; 2],
    winner: Option<Role>,
}

impl MatchState {
    /// Fresh match: empty boards, player 1 placing, player 2 waiting.
    pub fn new(config: GameConfig, player1: String, player2: String) -> Self {
        let n = config.board_size();
        Self {
            players: [player1, player2],
            status: MatchStatus::Waiting,
            player_status: [PlayerStatus::Placing, PlayerStatus::Waiting],
            turn: 0,
            boards: [Board::new(n), Board::new(n)],
            tracking: [Board::new(n), Board::new(n)],
            ships: [Vec::new(), Vec::new()],
            winner: None,
            config,
        }
    }

    /// Rebuild a match from stored parts. Every board must match the
    /// configured size, every ship must sit on its owner's board and the
    /// player phases must fit the match status.
    pub fn from_parts(config: GameConfig, parts: MatchParts) -> Result<Self, StateError> {
        check_statuses(parts.status, parts.player_status, parts.winner)?;
        let n = config.board_size();
        for board in parts.boards.iter().chain(parts.tracking.iter()) {
            if board.size() != n {
                return Err(BoardError::SizeMismatch {
                    expected: n * n,
                    found: board.size() * board.size(),
                }
                .into());
            }
        }
        for (board, ships) in parts.boards.iter().zip(parts.ships.iter()) {
            for ship in ships {
                for &(r, c) in ship.cells() {
                    if !matches!(board.get(r, c)?, Cell::Ship | Cell::Hit) {
                        return Err(BoardError::Occupied { row: r, col: c }.into());
                    }
                }
            }
        }
        Ok(Self {
            config,
            players: parts.players,
            status: parts.status,
            player_status: parts.player_status,
            turn: parts.turn,
            boards: parts.boards,
            tracking: parts.tracking,
            ships: parts.ships,
            winner: parts.winner,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        Role::resolve(&self.players[0], &self.players[1], name)
    }

    /// Like [`MatchState::role_of`], failing with `UnknownPlayer`.
    pub fn require_role(&self, name: &str) -> Result<Role, MatchError> {
        self.role_of(name).ok_or(MatchError::UnknownPlayer)
    }

    pub fn player_name(&self, role: Role) -> &str {
        &self.players[role.index()]
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn player_status(&self, role: Role) -> PlayerStatus {
        self.player_status[role.index()]
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn winner(&self) -> Option<Role> {
        self.winner
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner.map(|r| self.player_name(r))
    }

    /// Player currently holding the move, if any.
    pub fn whose_turn(&self) -> Option<Role> {
        [Role::Player1, Role::Player2]
            .into_iter()
            .find(|&r| self.player_status(r) == PlayerStatus::Playing)
    }

    /// Ships and damage sustained by `role`.
    pub fn own_board(&self, role: Role) -> &Board {
        &self.boards[role.index()]
    }

    /// Shots fired by `role`.
    pub fn tracking_board(&self, role: Role) -> &Board {
        &self.tracking[role.index()]
    }

    /// The opponent's board as `role` may see it: hits and misses only.
    pub fn opponent_board(&self, role: Role) -> Board {
        self.boards[role.opponent().index()].masked()
    }

    pub fn ships(&self, role: Role) -> &[Ship] {
        &self.ships[role.index()]
    }

    fn placed_sizes(&self, role: Role) -> Vec<usize> {
        self.ships[role.index()].iter().map(Ship::size).collect()
    }

    pub fn fleet_complete(&self, role: Role) -> bool {
        is_fleet_fully_placed(&self.placed_sizes(role), self.config.fleet())
    }

    /// Ship sizes `role` still has to place, largest first.
    pub fn remaining_fleet(&self, role: Role) -> Vec<usize> {
        remaining_fleet(&self.placed_sizes(role), self.config.fleet())
    }

    /// Place one ship for `role`.
    pub fn place_ship(
        &mut self,
        role: Role,
        origin: (usize, usize),
        size: usize,
        orientation: Orientation,
    ) -> Result<PlacementReport, MatchError> {
        let me = role.index();
        if self.player_status[me] != PlayerStatus::Placing {
            return Err(if self.fleet_complete(role) {
                MatchError::PlacementAlreadyFinished
            } else {
                MatchError::NotYourTurn
            });
        }
        if !self.remaining_fleet(role).contains(&size) {
            return Err(MatchError::ShipNotInFleet { size });
        }
        let ship = validate_placement(&self.boards[me], origin, size, orientation)
            .map_err(MatchError::PlacementConflict)?;
        self.boards[me]
            .place_ship_cells(ship.cells())
            .map_err(MatchError::PlacementConflict)?;
        self.ships[me].push(ship.clone());

        let fleet_complete = self.fleet_complete(role);
        let mut match_started = false;
        if fleet_complete {
            let other = role.opponent();
            if self.fleet_complete(other) {
                self.player_status = [PlayerStatus::Playing, PlayerStatus::Waiting];
                self.status = MatchStatus::Active;
                match_started = true;
            } else {
                self.player_status[me] = PlayerStatus::Waiting;
                self.player_status[other.index()] = PlayerStatus::Placing;
            }
        }
        Ok(PlacementReport {
            ship,
            remaining: self.remaining_fleet(role),
            fleet_complete,
            match_started,
        })
    }

    /// `role` fires at (`row`, `col`) on the opponent's board.
    pub fn fire(&mut self, role: Role, row: usize, col: usize) -> Result<ShotReport, MatchError> {
        let me = role.index();
        let them = role.opponent().index();
        if self.player_status[me] != PlayerStatus::Playing {
            return Err(MatchError::NotYourTurn);
        }
        // both boards are checked before either is written
        if self.boards[them].get(row, col).map_err(shot_error)?.is_resolved()
            || self.tracking[me].get(row, col).map_err(shot_error)? != Cell::Empty
        {
            return Err(MatchError::AlreadyShot { row, col });
        }
        let outcome = self.boards[them].resolve_shot(row, col).map_err(shot_error)?;
        self.tracking[me]
            .record_shot(row, col, outcome)
            .map_err(shot_error)?;

        let won = self.boards[them].all_ships_sunk();
        let next = if won {
            self.status = MatchStatus::Finished;
            self.player_status[me] = PlayerStatus::Winner;
            self.player_status[them] = PlayerStatus::Looser;
            self.winner = Some(role);
            None
        } else if outcome == ShotOutcome::Miss {
            self.player_status[me] = PlayerStatus::Waiting;
            self.player_status[them] = PlayerStatus::Playing;
            self.turn += 1;
            Some(role.opponent())
        } else {
            Some(role)
        };
        Ok(ShotReport {
            row,
            col,
            outcome,
            won,
            turn: self.turn,
            next,
        })
    }
}
