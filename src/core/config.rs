//! Board size and fleet composition.
//!
//! A match is always played under exactly one [`GameConfig`]. The default is
//! the 8×8 board with a seven-ship fleet.

use alloc::vec::Vec;
use core::fmt;

/// Side length of the canonical board.
pub const BOARD_SIZE: usize = 8;

/// Ship sizes of the canonical fleet, largest first.
pub const FLEET: [usize; 7] = [4, 3, 2, 2, 1, 1, 1];

/// Largest supported board side.
pub const MAX_BOARD_SIZE: usize = 26;

/// Errors returned when building a [`GameConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Board side is zero or larger than [`MAX_BOARD_SIZE`].
    InvalidBoardSize(usize),
    /// Fleet has no ships.
    EmptyFleet,
    /// A ship is empty or longer than the board side.
    InvalidShipSize(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBoardSize(n) => {
                write!(f, "board size {} must be within 1..={}", n, MAX_BOARD_SIZE)
            }
            ConfigError::EmptyFleet => write!(f, "fleet must contain at least one ship"),
            ConfigError::InvalidShipSize(s) => write!(f, "ship size {} does not fit the board", s),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Board side length and the multiset of ship sizes each player must place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(try_from = "RawGameConfig"))]
pub struct GameConfig {
    board_size: usize,
    fleet: Vec<usize>,
}

impl GameConfig {
    /// Validate and build a configuration.
    pub fn new(board_size: usize, fleet: Vec<usize>) -> Result<Self, ConfigError> {
        if board_size == 0 || board_size > MAX_BOARD_SIZE {
            return Err(ConfigError::InvalidBoardSize(board_size));
        }
        if fleet.is_empty() {
            return Err(ConfigError::EmptyFleet);
        }
        if let Some(&bad) = fleet.iter().find(|&&s| s == 0 || s > board_size) {
            return Err(ConfigError::InvalidShipSize(bad));
        }
        Ok(Self { board_size, fleet })
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn fleet(&self) -> &[usize] {
        &self.fleet
    }

    /// Total number of ship cells one fleet occupies.
    pub fn total_ship_cells(&self) -> usize {
        self.fleet.iter().sum()
    }
}

#[cfg(feature = "std")]
#[derive(serde::Deserialize)]
struct RawGameConfig {
    board_size: usize,
    fleet: Vec<usize>,
}

#[cfg(feature = "std")]
impl TryFrom<RawGameConfig> for GameConfig {
    type Error = ConfigError;

    fn try_from(raw: RawGameConfig) -> Result<Self, Self::Error> {
        GameConfig::new(raw.board_size, raw.fleet)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            fleet: FLEET.to_vec(),
        }
    }
}
