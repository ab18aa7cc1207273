use naval_battle::{
    is_fleet_fully_placed, random_fleet, random_placement, remaining_fleet, validate_placement,
    Board, BoardError, Cell, Orientation, FLEET,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn test_validate_placement_edge_of_board() {
    let board = Board::new(8);
    assert_eq!(
        validate_placement(&board, (0, 6), 3, Orientation::Horizontal).unwrap_err(),
        BoardError::OutOfBounds { row: 0, col: 8 }
    );
    let ship = validate_placement(&board, (0, 5), 3, Orientation::Horizontal).unwrap();
    assert_eq!(ship.cells(), &[(0, 5), (0, 6), (0, 7)]);
    // nothing written
    assert_eq!(board.count(Cell::Ship), 0);
}

#[test]
fn test_validate_placement_overlap() {
    let mut board = Board::new(8);
    board.place_ship_cells(&[(2, 4), (3, 4)]).unwrap();
    assert_eq!(
        validate_placement(&board, (3, 2), 3, Orientation::Horizontal).unwrap_err(),
        BoardError::Occupied { row: 3, col: 4 }
    );
    assert!(validate_placement(&board, (4, 2), 3, Orientation::Horizontal).is_ok());
}

#[test]
fn test_fleet_completeness_is_multiset_equality() {
    assert!(is_fleet_fully_placed(&[1, 4, 1, 3, 2], &[1, 1, 2, 3, 4]));
    assert!(!is_fleet_fully_placed(&[1, 4, 3, 2], &[1, 1, 2, 3, 4]));
    assert!(!is_fleet_fully_placed(&[1, 1, 1, 3, 4], &[1, 1, 2, 3, 4]));
    assert!(!is_fleet_fully_placed(&[1, 1, 2, 3, 4, 1], &[1, 1, 2, 3, 4]));
    assert!(is_fleet_fully_placed(&[], &[]));
}

#[test]
fn test_remaining_fleet_largest_first() {
    assert_eq!(remaining_fleet(&[], &FLEET), vec![4, 3, 2, 2, 1, 1, 1]);
    assert_eq!(remaining_fleet(&[2, 1, 4], &FLEET), vec![3, 2, 1, 1]);
    assert!(remaining_fleet(&FLEET, &FLEET).is_empty());
}

#[test]
fn test_random_placement_is_legal() {
    let mut rng = SmallRng::seed_from_u64(42);
    let board = Board::new(8);
    let (origin, orient) = random_placement(&board, 4, &mut rng).unwrap();
    assert!(validate_placement(&board, origin, 4, orient).is_ok());
}

#[test]
fn test_random_fleet_places_every_ship_without_overlap() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut board = Board::new(8);
    let ships = random_fleet(&mut board, &FLEET, &mut rng).unwrap();
    assert_eq!(ships.len(), FLEET.len());
    assert_eq!(board.count(Cell::Ship), FLEET.iter().sum::<usize>());
}

#[test]
fn test_random_placement_finds_last_free_spot() {
    let mut board = Board::new(3);
    let mut cells = Vec::new();
    for r in 0..3 {
        for c in 0..3 {
            if (r, c) != (2, 2) {
                cells.push((r, c));
            }
        }
    }
    board.place_ship_cells(&cells).unwrap();
    let mut rng = SmallRng::seed_from_u64(1);
    let (origin, _) = random_placement(&board, 1, &mut rng).unwrap();
    assert_eq!(origin, (2, 2));
    assert_eq!(
        random_placement(&board, 2, &mut rng).unwrap_err(),
        BoardError::UnableToPlaceShip { size: 2 }
    );
}
