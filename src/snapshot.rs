use crate::game::GameState;
use crate::grid::CellState;
use crate::piece::{Position, TetrominoType};

/// A cell to draw and the kind that colours it
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ColoredCell {
    pub position: Position,
    pub kind: TetrominoType,
}

/// Everything a presenter needs to draw one frame.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub settled: Vec<ColoredCell>,
    pub active: [ColoredCell; 4],
    pub next: Vec<TetrominoType>,
    pub score: u32,
    pub state: GameState,
}

impl Snapshot {
    /// The field with the falling piece overlaid. Cells above the top row are dropped.
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let mut visual_grid = vec![vec![CellState::Empty; self.width]; self.height];

        for cell in self.settled.iter().chain(self.active.iter()) {
            let Position { x, y } = cell.position;
            if x >= 0 && (x as usize) < self.width && y >= 0 && (y as usize) < self.height {
                visual_grid[y as usize][x as usize] = CellState::Filled(cell.kind);
            }
        }

        visual_grid
    }

    pub fn is_playable(&self) -> bool {
        self.state == GameState::Running
    }
}
