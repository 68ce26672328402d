//! Configuration for a game instance

use std::{str::FromStr, time::Duration};

use crate::error::{GameError, Result};
use crate::grid::{GRID_HEIGHT, GRID_WIDTH};

/// Smallest accepted field side; every tetromino fits in a 4x4 box.
pub const MIN_GRID_SIDE: usize = 4;

/// Largest accepted field side. Cell coordinates are `i16` and pieces reach
/// a few cells past the pivot, so this stays well clear of `i16::MAX`.
pub const MAX_GRID_SIDE: usize = 4096;

/// Gravity interval in milliseconds. Fixed for the whole game.
pub const TICK_MS: u64 = 800;

pub const PREVIEW_COUNT: usize = 1;

/// What the drop command does to the falling piece
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DropMode {
    /// Fall as far as possible; the piece locks on the next tick
    #[default]
    Hard,
    /// Fall a single row
    Soft,
}

impl FromStr for DropMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hard" => Ok(DropMode::Hard),
            "soft" => Ok(DropMode::Soft),
            _ => Err(GameError::UnknownDropMode(s.to_string())),
        }
    }
}

/// Main configuration for a game
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GameConfig {
    /// Number of columns
    pub width: usize,

    /// Number of rows; row 0 is the top
    pub height: usize,

    /// Pivot column of newly spawned pieces (spawn row is always 0)
    pub spawn_column: usize,

    /// The game ends once a settled cell sits at or above this row
    pub overflow_row: usize,

    /// Length of the next-piece lookahead queue
    pub preview_count: usize,

    /// Gravity interval in milliseconds
    pub tick_ms: u64,

    pub drop_mode: DropMode,

    /// Seed for the random piece provider (entropy when None)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            spawn_column: default_spawn_column(GRID_WIDTH),
            overflow_row: 0,
            preview_count: PREVIEW_COUNT,
            tick_ms: TICK_MS,
            drop_mode: DropMode::default(),
            seed: None,
        }
    }
}

fn default_spawn_column(width: usize) -> usize {
    width.saturating_sub(4) / 2
}

impl GameConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field size. The spawn column is re-centred.
    pub fn with_dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self.spawn_column = default_spawn_column(width);
        self
    }

    pub fn with_spawn_column(mut self, column: usize) -> Self {
        self.spawn_column = column;
        self
    }

    pub fn with_overflow_row(mut self, row: usize) -> Self {
        self.overflow_row = row;
        self
    }

    pub fn with_preview_count(mut self, count: usize) -> Self {
        self.preview_count = count;
        self
    }

    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub fn with_drop_mode(mut self, mode: DropMode) -> Self {
        self.drop_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Check that a game can be built from this configuration
    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_GRID_SIDE || self.height < MIN_GRID_SIDE {
            return Err(GameError::InvalidDimensions {
                width: self.width,
                height: self.height,
                min: MIN_GRID_SIDE,
            });
        }
        if self.width > MAX_GRID_SIDE || self.height > MAX_GRID_SIDE {
            return Err(GameError::DimensionsTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_GRID_SIDE,
            });
        }
        if self.spawn_column + 4 > self.width {
            return Err(GameError::SpawnOutOfBounds {
                column: self.spawn_column,
                width: self.width,
            });
        }
        if self.overflow_row >= self.height {
            return Err(GameError::OverflowRowOutOfBounds {
                row: self.overflow_row,
                height: self.height,
            });
        }
        if self.tick_ms == 0 {
            return Err(GameError::InvalidTickInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.spawn_column, 3);
        assert_eq!(config.tick_interval(), Duration::from_millis(TICK_MS));
    }

    #[test]
    fn dimensions_recentre_spawn_column() {
        let config = GameConfig::new().with_dimensions(16, 30);
        assert_eq!(config.spawn_column, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_tiny_grid() {
        let err = GameConfig::new().with_dimensions(3, 20).validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidDimensions { width: 3, .. }));
    }

    #[test]
    fn rejects_grid_beyond_coordinate_range() {
        let err = GameConfig::new().with_dimensions(10, 33_000).validate().unwrap_err();
        assert_eq!(
            err,
            GameError::DimensionsTooLarge { width: 10, height: 33_000, max: MAX_GRID_SIDE }
        );

        let err = GameConfig::new().with_dimensions(70_000, 20).validate().unwrap_err();
        assert!(matches!(err, GameError::DimensionsTooLarge { width: 70_000, .. }));
    }

    #[test]
    fn accepts_largest_grid() {
        let config = GameConfig::new().with_dimensions(MAX_GRID_SIDE, MAX_GRID_SIDE);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_spawn_column_near_right_wall() {
        let err = GameConfig::new().with_spawn_column(7).validate().unwrap_err();
        assert_eq!(err, GameError::SpawnOutOfBounds { column: 7, width: 10 });
    }

    #[test]
    fn rejects_overflow_row_below_field() {
        let err = GameConfig::new().with_overflow_row(20).validate().unwrap_err();
        assert_eq!(err, GameError::OverflowRowOutOfBounds { row: 20, height: 20 });
    }

    #[test]
    fn rejects_zero_tick() {
        let err = GameConfig::new().with_tick_ms(0).validate().unwrap_err();
        assert_eq!(err, GameError::InvalidTickInterval);
    }

    #[test]
    fn drop_mode_parses_case_insensitively() {
        assert_eq!("HARD".parse::<DropMode>(), Ok(DropMode::Hard));
        assert_eq!("soft".parse::<DropMode>(), Ok(DropMode::Soft));
        assert_eq!(
            "sonic".parse::<DropMode>(),
            Err(GameError::UnknownDropMode("sonic".to_string()))
        );
    }
}
