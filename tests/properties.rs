//! Property tests for grid and piece invariants over generated positions
//! and random play.

use proptest::prelude::*;

use blocktris::config::GameConfig;
use blocktris::game::{Command, Game, GameEvent};
use blocktris::grid::{CellState, Grid, GRID_HEIGHT, GRID_WIDTH};
use blocktris::piece::{ActivePiece, Position, TetrominoType};

#[derive(Debug, Clone)]
enum Step {
    Tick,
    Command(Command),
}

fn kind() -> impl Strategy<Value = TetrominoType> {
    prop::sample::select(TetrominoType::ALL.to_vec())
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Tick),
        1 => prop::sample::select(vec![
            Command::MoveLeft,
            Command::MoveRight,
            Command::RotateCw,
            Command::RotateCcw,
            Command::SoftDrop,
        ])
        .prop_map(Step::Command),
    ]
}

/// One row pattern per row; each row is forced to have a hole at the given column
fn gapped_rows() -> impl Strategy<Value = Vec<(Vec<bool>, usize)>> {
    prop::collection::vec(
        (prop::collection::vec(any::<bool>(), GRID_WIDTH), 0..GRID_WIDTH),
        GRID_HEIGHT,
    )
}

fn build_grid(rows: &[Vec<bool>], skip_top: usize) -> Grid {
    let mut grid = Grid::default();
    for (y, row) in rows.iter().enumerate().skip(skip_top) {
        let cells: Vec<Position> = row
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(|(x, _)| Position::new(x as i16, y as i16))
            .collect();
        grid.place(&cells, TetrominoType::L);
    }
    grid
}

fn with_holes(rows: Vec<(Vec<bool>, usize)>) -> Vec<Vec<bool>> {
    rows.into_iter()
        .map(|(mut row, gap)| {
            row[gap] = false;
            row
        })
        .collect()
}

fn assert_piece_valid(game: &Game) -> Result<(), TestCaseError> {
    for cell in game.current_piece().cells() {
        prop_assert!(cell.x >= 0 && (cell.x as usize) < GRID_WIDTH, "{cell:?} outside walls");
        prop_assert!(!game.grid().is_occupied(cell), "{cell:?} overlaps the stack");
    }
    Ok(())
}

proptest! {
    #[test]
    fn piece_never_overlaps_stack(seed in any::<u64>(), steps in prop::collection::vec(step(), 0..400)) {
        let mut game = Game::with_config(GameConfig::new().with_seed(seed)).unwrap();
        assert_piece_valid(&game)?;

        for step in steps {
            match step {
                Step::Tick => game.on_tick(),
                Step::Command(command) => {
                    game.on_command(command);
                }
            }
            if game.is_game_over() {
                break;
            }
            assert_piece_valid(&game)?;
        }
    }

    #[test]
    fn clearing_is_a_noop_without_full_rows(rows in gapped_rows()) {
        let mut grid = build_grid(&with_holes(rows), 0);
        let before = grid.clone();

        prop_assert_eq!(grid.clear_completed_rows(), 0);
        prop_assert_eq!(grid, before);
    }

    #[test]
    fn clearing_k_rows_removes_k_times_width_cells(
        rows in gapped_rows(),
        full in prop::collection::vec(any::<bool>(), GRID_HEIGHT),
    ) {
        let pattern: Vec<Vec<bool>> = with_holes(rows)
            .into_iter()
            .zip(&full)
            .map(|(row, &full)| if full { vec![true; GRID_WIDTH] } else { row })
            .collect();
        let mut grid = build_grid(&pattern, 0);
        let k = full.iter().filter(|&&f| f).count();
        let before = grid.total_filled_cells();

        let survivors: Vec<Vec<CellState>> = grid
            .rows()
            .iter()
            .zip(&full)
            .filter(|(_, &full)| !full)
            .map(|(row, _)| row.clone())
            .collect();

        prop_assert_eq!(grid.clear_completed_rows() as usize, k);
        prop_assert_eq!(grid.total_filled_cells(), before - k * GRID_WIDTH);

        let mut expected = vec![vec![CellState::Empty; GRID_WIDTH]; k];
        expected.extend(survivors);
        prop_assert_eq!(grid.rows(), expected.as_slice());
    }

    #[test]
    fn four_rotations_are_identity(
        kind in kind(),
        x in 0..=(GRID_WIDTH as i16 - 4),
        y in 0..=(GRID_HEIGHT as i16 - 4),
    ) {
        let grid = Grid::default();
        let mut piece = ActivePiece::new_at(kind, x, y);
        let mut start = piece.cells();
        start.sort_by_key(|p| (p.y, p.x));

        for _ in 0..4 {
            prop_assert!(piece.try_rotate_clockwise(&grid));
        }

        let mut end = piece.cells();
        end.sort_by_key(|p| (p.y, p.x));
        prop_assert_eq!(start, end);
        prop_assert_eq!(piece.rotation(), 0);
    }

    #[test]
    fn spawned_piece_locks_within_height_ticks(kind in kind(), rows in gapped_rows()) {
        // Leave the spawn area clear
        let grid = build_grid(&with_holes(rows), 4);
        let mut game = Game::with_grid(grid, ActivePiece::spawn(kind, 3));
        prop_assume!(game.current_piece().fits(game.grid()));

        let mut locked = false;
        for _ in 0..GRID_HEIGHT {
            game.on_tick();
            if game.take_events().contains(&GameEvent::PieceLocked) {
                locked = true;
                break;
            }
        }
        prop_assert!(locked);
    }
}
