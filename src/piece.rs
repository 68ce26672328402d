use rand::Rng;

use crate::grid::Grid;

// ============================================================================
// Types
// ============================================================================

/// A cell coordinate. `x` is the column, `y` the row; row 0 is the top of the field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i16, dy: i16) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TetrominoType {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

pub const ROTATION_COUNT: usize = 4;

type Shape = [(i16, i16); 4];

/// Offsets from the pivot, indexed by kind then orientation.
/// Successive orientations are clockwise quarter turns.
const SHAPES: [[Shape; ROTATION_COUNT]; 7] = [
    // I
    [
        [(0, 0), (1, 0), (2, 0), (3, 0)],
        [(0, 0), (0, 1), (0, 2), (0, 3)],
        [(0, 0), (1, 0), (2, 0), (3, 0)],
        [(0, 0), (0, 1), (0, 2), (0, 3)],
    ],
    // O
    [
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
    ],
    // T
    [
        [(1, 0), (0, 1), (1, 1), (2, 1)],
        [(0, 0), (0, 1), (1, 1), (0, 2)],
        [(0, 0), (1, 0), (2, 0), (1, 1)],
        [(1, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // S
    [
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(1, 0), (2, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
    ],
    // Z
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ],
    // J
    [
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(0, 0), (1, 0), (0, 1), (0, 2)],
        [(0, 0), (1, 0), (2, 0), (2, 1)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ],
    // L
    [
        [(2, 0), (0, 1), (1, 1), (2, 1)],
        [(0, 0), (0, 1), (0, 2), (1, 2)],
        [(0, 0), (1, 0), (2, 0), (0, 1)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
    ],
];

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::S,
        TetrominoType::Z,
        TetrominoType::J,
        TetrominoType::L,
    ];

    /// Pivot-relative offsets of the four blocks in the given orientation
    pub fn offsets(self, rotation: usize) -> &'static [(i16, i16); 4] {
        &SHAPES[self as usize][rotation % ROTATION_COUNT]
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

// ============================================================================
// Active Piece
// ============================================================================

/// The falling piece.
///
/// Every mutating method validates the candidate placement against the grid
/// first and leaves the piece untouched when it collides.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    kind: TetrominoType,
    pivot: Position,
    rotation: usize,
}

impl ActivePiece {
    /// A piece in its initial orientation with the pivot on the top row
    pub fn spawn(kind: TetrominoType, column: i16) -> Self {
        Self::new_at(kind, column, 0)
    }

    pub fn new_at(kind: TetrominoType, x: i16, y: i16) -> Self {
        Self {
            kind,
            pivot: Position { x, y },
            rotation: 0,
        }
    }

    pub fn kind(&self) -> TetrominoType {
        self.kind
    }

    pub fn pivot(&self) -> Position {
        self.pivot
    }

    pub fn rotation(&self) -> usize {
        self.rotation
    }

    pub fn cells(&self) -> [Position; 4] {
        self.cells_at(self.pivot, self.rotation)
    }

    fn cells_at(&self, pivot: Position, rotation: usize) -> [Position; 4] {
        let offsets = *self.kind.offsets(rotation);
        offsets.map(|(dx, dy)| pivot.offset(dx, dy))
    }

    fn fits_at(&self, grid: &Grid, pivot: Position, rotation: usize) -> bool {
        self.cells_at(pivot, rotation)
            .iter()
            .all(|&cell| !grid.is_occupied(cell))
    }

    /// Whether the piece's current cells are all free
    pub fn fits(&self, grid: &Grid) -> bool {
        self.fits_at(grid, self.pivot, self.rotation)
    }

    pub fn try_move(&mut self, dx: i16, dy: i16, grid: &Grid) -> bool {
        let candidate = self.pivot.offset(dx, dy);
        if !self.fits_at(grid, candidate, self.rotation) {
            return false;
        }
        self.pivot = candidate;
        true
    }

    /// Rotates in place around the pivot. There are no wall kicks.
    pub fn try_rotate_clockwise(&mut self, grid: &Grid) -> bool {
        self.try_rotate(1, grid)
    }

    pub fn try_rotate_counter_clockwise(&mut self, grid: &Grid) -> bool {
        self.try_rotate(ROTATION_COUNT - 1, grid)
    }

    fn try_rotate(&mut self, quarter_turns: usize, grid: &Grid) -> bool {
        let rotation = (self.rotation + quarter_turns) % ROTATION_COUNT;
        if !self.fits_at(grid, self.pivot, rotation) {
            return false;
        }
        self.rotation = rotation;
        true
    }

    pub fn soft_drop_step(&mut self, grid: &Grid) -> bool {
        self.try_move(0, 1, grid)
    }

    /// Drops until blocked and returns the number of rows travelled
    pub fn hard_drop(&mut self, grid: &Grid) -> u32 {
        let mut rows = 0;
        while self.soft_drop_step(grid) {
            rows += 1;
        }
        rows
    }
}
