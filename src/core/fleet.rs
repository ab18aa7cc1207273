//! Placement rules: where a ship may go and when a fleet is complete.

use alloc::vec::Vec;
use rand::Rng;

use crate::core::board::Board;
use crate::core::common::{BoardError, Cell};
use crate::core::ship::{Orientation, Ship};

const RANDOM_ATTEMPTS: usize = 100;

/// Compute the cells a ship of `size` would occupy from `origin` and check
/// they are all in bounds and `Empty` on `board`. Nothing is written.
pub fn validate_placement(
    board: &Board,
    origin: (usize, usize),
    size: usize,
    orientation: Orientation,
) -> Result<Ship, BoardError> {
    let (row, col) = origin;
    let ship = Ship::new(size, orientation, row, col, board.size())?;
    for &(r, c) in ship.cells() {
        if board.get(r, c)? != Cell::Empty {
            return Err(BoardError::Occupied { row: r, col: c });
        }
    }
    Ok(ship)
}

fn sorted(sizes: &[usize]) -> Vec<usize> {
    let mut v = sizes.to_vec();
    v.sort_unstable();
    v
}

/// Multiset equality between placed ship sizes and the required fleet.
pub fn is_fleet_fully_placed(placed: &[usize], required: &[usize]) -> bool {
    sorted(placed) == sorted(required)
}

/// Sizes from `required` not yet matched by `placed`, largest first.
pub fn remaining_fleet(placed: &[usize], required: &[usize]) -> Vec<usize> {
    let mut remaining = sorted(required);
    for size in placed {
        if let Some(pos) = remaining.iter().position(|s| s == size) {
            remaining.remove(pos);
        }
    }
    remaining.reverse();
    remaining
}

/// Returns a random legal (origin, orientation) for a ship of `size`.
///
/// Tries random positions first, then falls back to scanning the board so a
/// legal spot is always found when one exists.
pub fn random_placement<R: Rng>(
    board: &Board,
    size: usize,
    rng: &mut R,
) -> Result<((usize, usize), Orientation), BoardError> {
    let n = board.size();
    if size == 0 || size > n {
        return Err(BoardError::InvalidShipSize { size });
    }
    for _ in 0..RANDOM_ATTEMPTS {
        let orient = if rng.random() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (max_r, max_c) = match orient {
            Orientation::Horizontal => (n - 1, n - size),
            Orientation::Vertical => (n - size, n - 1),
        };
        let origin = (rng.random_range(0..=max_r), rng.random_range(0..=max_c));
        if validate_placement(board, origin, size, orient).is_ok() {
            return Ok((origin, orient));
        }
    }
    for orient in [Orientation::Horizontal, Orientation::Vertical] {
        for r in 0..n {
            for c in 0..n {
                if validate_placement(board, (r, c), size, orient).is_ok() {
                    return Ok(((r, c), orient));
                }
            }
        }
    }
    Err(BoardError::UnableToPlaceShip { size })
}

/// Place every ship of `fleet` at random on `board`.
pub fn random_fleet<R: Rng>(
    board: &mut Board,
    fleet: &[usize],
    rng: &mut R,
) -> Result<Vec<Ship>, BoardError> {
    let mut ships = Vec::with_capacity(fleet.len());
    for &size in fleet {
        let (origin, orient) = random_placement(board, size, rng)?;
        let ship = validate_placement(board, origin, size, orient)?;
        board.place_ship_cells(ship.cells())?;
        ships.push(ship);
    }
    Ok(ships)
}
