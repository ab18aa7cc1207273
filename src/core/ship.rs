//! Ship geometry: orientation and the cells a ship covers.

use alloc::vec::Vec;

use crate::core::common::BoardError;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "UPPERCASE"))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Coordinate `offset` cells from `(row, col)` along this axis.
    fn step(self, row: usize, col: usize, offset: usize) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (row, col + offset),
            Orientation::Vertical => (row + offset, col),
        }
    }
}

/// A ship laid out on an N×N board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    size: usize,
    orientation: Orientation,
    cells: Vec<(usize, usize)>,
}

impl Ship {
    /// Lay out a ship of `size` at (`row`, `col`) with `orientation` on a
    /// board of side `board_size`. Only geometry is checked here; overlap
    /// with other ships is the board's concern.
    pub fn new(
        size: usize,
        orientation: Orientation,
        row: usize,
        col: usize,
        board_size: usize,
    ) -> Result<Self, BoardError> {
        if size == 0 || size > board_size {
            return Err(BoardError::InvalidShipSize { size });
        }
        if row >= board_size || col >= board_size {
            return Err(BoardError::OutOfBounds { row, col });
        }
        let cells: Vec<(usize, usize)> = (0..size)
            .map(|i| orientation.step(row, col, i))
            .collect();
        // first cell past the edge, if any
        if let Some(&(r, c)) = cells.iter().find(|&&(r, c)| r >= board_size || c >= board_size) {
            return Err(BoardError::OutOfBounds { row: r, col: c });
        }
        Ok(Ship {
            size,
            orientation,
            cells,
        })
    }

    /// Rebuild a ship from stored cells, checking that they are contiguous
    /// and axis-aligned.
    pub fn from_cells(
        orientation: Orientation,
        cells: Vec<(usize, usize)>,
        board_size: usize,
    ) -> Result<Self, BoardError> {
        let &(row, col) = cells
            .first()
            .ok_or(BoardError::InvalidShipSize { size: 0 })?;
        let expected = Ship::new(cells.len(), orientation, row, col, board_size)?;
        if expected.cells != cells {
            return Err(BoardError::InvalidShipSize { size: cells.len() });
        }
        Ok(expected)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Origin of the ship (row, col).
    pub fn origin(&self) -> (usize, usize) {
        self.cells[0]
    }

    /// Occupied cells, origin first.
    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.contains(&(row, col))
    }
}
