//! Common types for the board: cell states, shot outcomes and board errors.

use core::fmt;

/// State of a single grid cell.
///
/// Cells only ever move `Empty -> Ship` during placement and
/// `Ship -> Hit` / `Empty -> Miss` when shot at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "UPPERCASE"))]
pub enum Cell {
    #[default]
    Empty,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// Literal name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Cell::Empty => "EMPTY",
            Cell::Ship => "SHIP",
            Cell::Hit => "HIT",
            Cell::Miss => "MISS",
        }
    }

    /// `true` once the cell has been fired at.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Cell::Hit | Cell::Miss)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "UPPERCASE"))]
pub enum ShotOutcome {
    Hit,
    Miss,
}

impl From<ShotOutcome> for Cell {
    fn from(outcome: ShotOutcome) -> Self {
        match outcome {
            ShotOutcome::Hit => Cell::Hit,
            ShotOutcome::Miss => Cell::Miss,
        }
    }
}

/// Errors returned by board and placement operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate lies outside the grid.
    OutOfBounds { row: usize, col: usize },
    /// Cell already holds a ship or has been shot.
    Occupied { row: usize, col: usize },
    /// Cell has already been fired at.
    AlreadyShot { row: usize, col: usize },
    /// Ship size is zero or larger than the board.
    InvalidShipSize { size: usize },
    /// Grid data does not describe an N×N board.
    SizeMismatch { expected: usize, found: usize },
    /// No legal position was found for a ship.
    UnableToPlaceShip { size: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::OutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is out of bounds", row, col)
            }
            BoardError::Occupied { row, col } => write!(f, "cell ({}, {}) is occupied", row, col),
            BoardError::AlreadyShot { row, col } => {
                write!(f, "cell ({}, {}) was already shot", row, col)
            }
            BoardError::InvalidShipSize { size } => write!(f, "invalid ship size {}", size),
            BoardError::SizeMismatch { expected, found } => {
                write!(f, "expected {} cells, found {}", expected, found)
            }
            BoardError::UnableToPlaceShip { size } => {
                write!(f, "unable to place ship of size {}", size)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}
