use thiserror::Error;

/// Result type alias for game construction
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised while configuring a game.
///
/// Gameplay itself never fails: blocked moves are plain `false` results and
/// game over is a state, not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Field too small to hold a piece
    #[error("Invalid grid dimensions {width}x{height}: both must be at least {min}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        min: usize,
    },

    /// Field too large for `i16` cell coordinates
    #[error("Invalid grid dimensions {width}x{height}: neither may exceed {max}")]
    DimensionsTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    /// Spawned pieces would stick out of the field
    #[error("Spawn column {column} leaves no room for a 4-wide piece in a {width}-wide grid")]
    SpawnOutOfBounds { column: usize, width: usize },

    /// Game-over row lies below the field
    #[error("Overflow row {row} is outside a grid of height {height}")]
    OverflowRowOutOfBounds { row: usize, height: usize },

    /// Gravity would never fire
    #[error("Tick interval must be greater than zero")]
    InvalidTickInterval,

    #[error("Unknown drop mode: {0} (expected \"hard\" or \"soft\")")]
    UnknownDropMode(String),
}
