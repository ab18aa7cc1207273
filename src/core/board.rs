//! Square grid of [`Cell`]s: ship placement and shot resolution on one board.

use alloc::vec::Vec;
use core::iter;

use crate::core::common::{BoardError, Cell, ShotOutcome};

/// An N×N grid stored row-major.
///
/// The same type backs both a player's own board (ships and damage taken)
/// and their tracking board (shots fired, `Hit`/`Miss` only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Create a board with every cell `Empty`.
    pub fn new(size: usize) -> Self {
        Board {
            size,
            cells: iter::repeat(Cell::Empty).take(size * size).collect(),
        }
    }

    /// Rebuild a board from row-major cells.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self, BoardError> {
        if cells.len() != size * size {
            return Err(BoardError::SizeMismatch {
                expected: size * size,
                found: cells.len(),
            });
        }
        Ok(Board { size, cells })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if row >= self.size || col >= self.size {
            return Err(BoardError::OutOfBounds { row, col });
        }
        Ok(row * self.size + col)
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Cell, BoardError> {
        Ok(self.cells[self.index(row, col)?])
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Mark `cells` as `Ship`. Every cell must be in bounds, `Empty` and
    /// listed once; otherwise nothing is written.
    pub fn place_ship_cells(&mut self, cells: &[(usize, usize)]) -> Result<(), BoardError> {
        let mut indices = Vec::with_capacity(cells.len());
        for &(row, col) in cells {
            let idx = self.index(row, col)?;
            if self.cells[idx] != Cell::Empty || indices.contains(&idx) {
                return Err(BoardError::Occupied { row, col });
            }
            indices.push(idx);
        }
        for idx in indices {
            self.cells[idx] = Cell::Ship;
        }
        Ok(())
    }

    /// Fire at (`row`, `col`). A second shot at the same cell is rejected
    /// and leaves the board untouched.
    pub fn resolve_shot(&mut self, row: usize, col: usize) -> Result<ShotOutcome, BoardError> {
        let idx = self.index(row, col)?;
        let outcome = match self.cells[idx] {
            Cell::Ship => ShotOutcome::Hit,
            Cell::Empty => ShotOutcome::Miss,
            Cell::Hit | Cell::Miss => return Err(BoardError::AlreadyShot { row, col }),
        };
        self.cells[idx] = outcome.into();
        Ok(outcome)
    }

    /// Record the outcome of a shot fired at the opponent on a tracking board.
    pub fn record_shot(
        &mut self,
        row: usize,
        col: usize,
        outcome: ShotOutcome,
    ) -> Result<(), BoardError> {
        let idx = self.index(row, col)?;
        if self.cells[idx] != Cell::Empty {
            return Err(BoardError::AlreadyShot { row, col });
        }
        self.cells[idx] = outcome.into();
        Ok(())
    }

    /// Returns `true` when no `Ship` cell is left standing.
    pub fn all_ships_sunk(&self) -> bool {
        !self.cells.contains(&Cell::Ship)
    }

    /// Number of cells in `state`.
    pub fn count(&self, state: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// Copy with intact ship cells hidden, as seen by the opponent.
    pub fn masked(&self) -> Board {
        Board {
            size: self.size,
            cells: self
                .cells
                .iter()
                .map(|&c| if c == Cell::Ship { Cell::Empty } else { c })
                .collect(),
        }
    }

    /// Every cell with its coordinate, row-major.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| ((i / size, i % size), c))
    }
}
