use naval_battle::{BoardError, Orientation, Ship};

#[test]
fn test_new_horizontal_and_vertical() -> Result<(), BoardError> {
    let ship = Ship::new(3, Orientation::Horizontal, 2, 1, 8)?;
    assert_eq!(ship.cells(), &[(2, 1), (2, 2), (2, 3)]);
    assert_eq!(ship.origin(), (2, 1));
    assert_eq!(ship.size(), 3);

    let ship = Ship::new(4, Orientation::Vertical, 0, 0, 8)?;
    assert_eq!(ship.cells(), &[(0, 0), (1, 0), (2, 0), (3, 0)]);
    assert!(ship.contains(3, 0));
    assert!(!ship.contains(4, 0));
    Ok(())
}

#[test]
fn test_new_rejects_overhang() {
    assert_eq!(
        Ship::new(3, Orientation::Horizontal, 0, 6, 8).unwrap_err(),
        BoardError::OutOfBounds { row: 0, col: 8 }
    );
    assert_eq!(
        Ship::new(2, Orientation::Vertical, 7, 0, 8).unwrap_err(),
        BoardError::OutOfBounds { row: 8, col: 0 }
    );
    assert_eq!(
        Ship::new(1, Orientation::Vertical, 9, 0, 8).unwrap_err(),
        BoardError::OutOfBounds { row: 9, col: 0 }
    );
}

#[test]
fn test_new_rejects_bad_sizes() {
    assert_eq!(
        Ship::new(0, Orientation::Horizontal, 0, 0, 8).unwrap_err(),
        BoardError::InvalidShipSize { size: 0 }
    );
    assert_eq!(
        Ship::new(9, Orientation::Horizontal, 0, 0, 8).unwrap_err(),
        BoardError::InvalidShipSize { size: 9 }
    );
}

#[test]
fn test_from_cells_requires_contiguous_line() -> Result<(), BoardError> {
    let ship = Ship::from_cells(Orientation::Vertical, vec![(1, 5), (2, 5)], 8)?;
    assert_eq!(ship.orientation(), Orientation::Vertical);

    // gap
    assert!(Ship::from_cells(Orientation::Horizontal, vec![(0, 0), (0, 2)], 8).is_err());
    // cells do not follow the stated orientation
    assert!(Ship::from_cells(Orientation::Horizontal, vec![(0, 0), (1, 0)], 8).is_err());
    assert!(Ship::from_cells(Orientation::Horizontal, vec![], 8).is_err());
    Ok(())
}
