use crate::piece::{Position, TetrominoType};

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    Filled(TetrominoType),
}

impl CellState {
    pub fn is_filled(&self) -> bool {
        matches!(self, CellState::Filled(_))
    }
}

/// The settled blocks, stored row by row from the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    rows: Vec<Vec<CellState>>,
    width: usize,
    overflow_row: usize,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            rows: vec![vec![CellState::Empty; width]; height],
            width,
            overflow_row: 0,
        }
    }

    /// Set the row at or above which any settled cell means game over
    pub fn with_overflow_row(mut self, row: usize) -> Self {
        self.overflow_row = row;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn overflow_row(&self) -> usize {
        self.overflow_row
    }

    pub fn rows(&self) -> &[Vec<CellState>] {
        &self.rows
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && (pos.x as usize) < self.width && pos.y >= 0 && (pos.y as usize) < self.height()
    }

    pub fn cell(&self, pos: Position) -> Option<CellState> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.rows[pos.y as usize][pos.x as usize])
    }

    /// Collision query used by the falling piece.
    ///
    /// Walls and floor count as occupied. Rows above the field are free so a
    /// piece may poke out of the top.
    pub fn is_occupied(&self, pos: Position) -> bool {
        if pos.x < 0 || pos.x as usize >= self.width {
            return true;
        }
        if pos.y < 0 {
            return false;
        }
        self.cell(pos).map_or(true, |cell| cell.is_filled())
    }

    /// Settle blocks into the grid.
    ///
    /// The cells must be free and inside the field; the falling piece's
    /// collision checks guarantee this.
    pub fn place(&mut self, cells: &[Position], kind: TetrominoType) {
        for &pos in cells {
            debug_assert!(self.in_bounds(pos), "placing out of bounds at {pos:?}");
            debug_assert!(!self.is_occupied(pos), "placing onto occupied cell {pos:?}");
            if self.in_bounds(pos) {
                self.rows[pos.y as usize][pos.x as usize] = CellState::Filled(kind);
            }
        }
    }

    /// Removes every complete row at once and returns how many went.
    /// Rows above fall by the number of removed rows beneath them.
    pub fn clear_completed_rows(&mut self) -> u32 {
        let height = self.height();
        self.rows
            .retain(|row| !row.iter().all(|cell| cell.is_filled()));

        let cleared = height - self.rows.len();
        for _ in 0..cleared {
            self.rows.insert(0, vec![CellState::Empty; self.width]);
        }
        cleared as u32
    }

    pub fn is_overflowing(&self) -> bool {
        self.rows
            .iter()
            .take(self.overflow_row + 1)
            .any(|row| row.iter().any(|cell| cell.is_filled()))
    }

    /// Settled cells with their kind, top row first
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Position, TetrominoType)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter().enumerate().filter_map(move |(x, cell)| match cell {
                CellState::Filled(kind) => Some((Position::new(x as i16, y as i16), *kind)),
                CellState::Empty => None,
            })
        })
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.rows[y].iter().all(|cell| cell.is_filled())
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|cell| cell.is_filled()).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| cell.is_filled()).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub fn empty_grid() -> Grid {
        Grid::default()
    }

    pub fn fill_row(grid: &mut Grid, y: usize) {
        let width = grid.width();
        fill_columns(grid, y, 0..width);
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        let width = grid.width();
        fill_columns(grid, y, (0..width).filter(|&x| x != gap_x));
    }

    pub fn fill_columns(grid: &mut Grid, y: usize, columns: impl IntoIterator<Item = usize>) {
        let cells: Vec<Position> = columns
            .into_iter()
            .map(|x| Position::new(x as i16, y as i16))
            .collect();
        grid.place(&cells, TetrominoType::T);
    }
}
