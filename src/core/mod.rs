//! Core match engine (no_std compatible)
//!
//! Pure game rules with no I/O: boards, ship geometry, placement rules and
//! the per-match state machine. Needs only `alloc` and `rand`.

pub mod board;
pub mod common;
pub mod config;
pub mod fleet;
pub mod game;
pub mod ship;

pub use board::Board;
pub use common::{BoardError, Cell, ShotOutcome};
pub use config::{ConfigError, GameConfig, BOARD_SIZE, FLEET, MAX_BOARD_SIZE};
pub use fleet::{
    is_fleet_fully_placed, random_fleet, random_placement, remaining_fleet, validate_placement,
};
pub use game::{
    MatchError, MatchParts, MatchState, MatchStatus, PlacementReport, PlayerStatus, Role,
    ShotReport, StateError,
};
pub use ship::{Orientation, Ship};
