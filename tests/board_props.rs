use naval_battle::{random_fleet, Board, BoardError, Cell, FLEET};
use proptest::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_board(seed: u64) -> Board {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut board = Board::new(8);
    random_fleet(&mut board, &FLEET, &mut rng).unwrap();
    let shots = rng.random_range(0..16);
    for _ in 0..shots {
        let _ = board.resolve_shot(rng.random_range(0..8), rng.random_range(0..8));
    }
    board
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fleet_sinks_exactly_when_every_ship_cell_is_hit(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::new(8);
        let ships = random_fleet(&mut board, &FLEET, &mut rng).unwrap();
        let cells: Vec<(usize, usize)> = ships.iter().flat_map(|s| s.cells().to_vec()).collect();
        let (last, rest) = cells.split_last().unwrap();
        for &(r, c) in rest {
            board.resolve_shot(r, c).unwrap();
            prop_assert!(!board.all_ships_sunk());
        }
        board.resolve_shot(last.0, last.1).unwrap();
        prop_assert!(board.all_ships_sunk());
    }

    #[test]
    fn repeated_shot_is_rejected_without_change(seed in any::<u64>(), row in 0..8usize, col in 0..8usize) {
        let mut board = random_board(seed);
        let first = board.resolve_shot(row, col);
        if let Err(e) = &first {
            prop_assert_eq!(e, &BoardError::AlreadyShot { row, col });
        }
        let after_first = board.clone();
        prop_assert!(board.get(row, col).unwrap().is_resolved());
        let err = board.resolve_shot(row, col).unwrap_err();
        prop_assert_eq!(err, BoardError::AlreadyShot { row, col });
        prop_assert_eq!(&board, &after_first);
    }

    #[test]
    fn misses_never_touch_ship_cells(seed in any::<u64>()) {
        let board = random_board(seed);
        let ships_left = board.count(Cell::Ship);
        let hits = board.count(Cell::Hit);
        prop_assert_eq!(ships_left + hits, FLEET.iter().sum::<usize>());
    }
}
