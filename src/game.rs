use std::collections::VecDeque;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{DropMode, GameConfig};
use crate::error::Result;
use crate::grid::Grid;
use crate::piece::{ActivePiece, TetrominoType};
use crate::snapshot::{ColoredCell, Snapshot};

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Running,
    Paused,
    GameOver,
}

/// Player input understood by the game
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    TogglePause,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceDropped(u32),
    PieceLocked,
    LinesCleared(u32),
    Paused,
    Resumed,
    GameRestarted,
    GameOver,
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform choice over the seven kinds
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::random(&mut self.rng)
    }
}

/// Cycles through a fixed list of kinds
pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    /// # Panics
    ///
    /// Panics if `pieces` is empty.
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Game
// ============================================================================

/// Owns the grid and the falling piece and drives them from ticks and commands.
pub struct Game {
    grid: Grid,
    current_piece: ActivePiece,
    preview_queue: VecDeque<TetrominoType>,
    score: u32,
    state: GameState,
    config: GameConfig,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    /// A default-sized game fed by the given provider
    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        Self::from_parts(GameConfig::default(), provider)
    }

    pub fn with_config(config: GameConfig) -> Result<Self> {
        let provider = match config.seed {
            Some(seed) => RandomPieceProvider::seeded(seed),
            None => RandomPieceProvider::new(),
        };
        Self::with_config_and_provider(config, Box::new(provider))
    }

    pub fn with_config_and_provider(
        config: GameConfig,
        provider: Box<dyn PieceProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, provider))
    }

    fn from_parts(config: GameConfig, provider: Box<dyn PieceProvider>) -> Self {
        let grid = Grid::new(config.width, config.height).with_overflow_row(config.overflow_row);
        let mut game = Self {
            grid,
            current_piece: ActivePiece::spawn(TetrominoType::I, config.spawn_column as i16),
            preview_queue: VecDeque::new(),
            score: 0,
            state: GameState::Running,
            config,
            piece_provider: provider,
            events: Vec::new(),
        };
        game.current_piece = game.fresh_piece();
        game.refill_preview();
        debug!(kind = ?game.current_piece.kind(), "game started");
        game
    }

    /// Resume from an arbitrary position. The pieces after `current_piece`
    /// are random.
    pub fn with_grid(grid: Grid, current_piece: ActivePiece) -> Self {
        let config = GameConfig::new()
            .with_dimensions(grid.width(), grid.height())
            .with_overflow_row(grid.overflow_row());
        let mut game = Self {
            grid,
            current_piece,
            preview_queue: VecDeque::new(),
            score: 0,
            state: GameState::Running,
            config,
            piece_provider: Box::new(RandomPieceProvider::new()),
            events: Vec::new(),
        };
        game.refill_preview();
        game
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_piece(&self) -> &ActivePiece {
        &self.current_piece
    }

    pub fn preview(&self) -> impl Iterator<Item = TetrominoType> + '_ {
        self.preview_queue.iter().copied()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    /// Gravity: move the piece down a row, or lock it when it cannot descend
    pub fn on_tick(&mut self) {
        if self.state != GameState::Running {
            return;
        }

        if self.current_piece.soft_drop_step(&self.grid) {
            self.events.push(GameEvent::PieceMoved);
        } else {
            self.lock_and_spawn();
        }
    }

    /// Apply a player command. Returns whether anything changed.
    pub fn on_command(&mut self, command: Command) -> bool {
        match (self.state, command) {
            (GameState::GameOver, _) => {
                warn!(?command, "command ignored after game over");
                false
            }
            (_, Command::TogglePause) => {
                self.toggle_pause();
                true
            }
            (GameState::Paused, _) => false,
            (GameState::Running, Command::MoveLeft) => self.move_piece(-1),
            (GameState::Running, Command::MoveRight) => self.move_piece(1),
            (GameState::Running, Command::RotateCw) => self.rotate_piece(true),
            (GameState::Running, Command::RotateCcw) => self.rotate_piece(false),
            (GameState::Running, Command::SoftDrop) => self.drop_piece(),
        }
    }

    /// Start over with an empty grid and a zero score
    pub fn reset(&mut self) {
        self.grid = Grid::new(self.config.width, self.config.height)
            .with_overflow_row(self.config.overflow_row);
        self.score = 0;
        self.state = GameState::Running;
        self.events.clear();

        self.preview_queue.clear();
        self.current_piece = self.fresh_piece();
        self.refill_preview();

        self.events.push(GameEvent::GameRestarted);
        info!("game restarted");
    }

    /// Read-only view for drawing
    pub fn snapshot(&self) -> Snapshot {
        let kind = self.current_piece.kind();
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            settled: self
                .grid
                .occupied_cells()
                .map(|(position, kind)| ColoredCell { position, kind })
                .collect(),
            active: self
                .current_piece
                .cells()
                .map(|position| ColoredCell { position, kind }),
            next: self.preview_queue.iter().copied().collect(),
            score: self.score,
            state: self.state,
        }
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn move_piece(&mut self, dx: i16) -> bool {
        let moved = self.current_piece.try_move(dx, 0, &self.grid);
        if moved {
            self.events.push(GameEvent::PieceMoved);
        }
        moved
    }

    fn rotate_piece(&mut self, clockwise: bool) -> bool {
        let rotated = if clockwise {
            self.current_piece.try_rotate_clockwise(&self.grid)
        } else {
            self.current_piece.try_rotate_counter_clockwise(&self.grid)
        };
        if rotated {
            self.events.push(GameEvent::PieceRotated);
        }
        rotated
    }

    // The piece is never locked here; the next tick finds it blocked and locks it.
    fn drop_piece(&mut self) -> bool {
        match self.config.drop_mode {
            DropMode::Hard => {
                let rows = self.current_piece.hard_drop(&self.grid);
                if rows > 0 {
                    self.events.push(GameEvent::PieceDropped(rows));
                }
                rows > 0
            }
            DropMode::Soft => {
                let moved = self.current_piece.soft_drop_step(&self.grid);
                if moved {
                    self.events.push(GameEvent::PieceMoved);
                }
                moved
            }
        }
    }

    fn toggle_pause(&mut self) {
        match self.state {
            GameState::Running => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
                info!("paused");
            }
            GameState::Paused => {
                self.state = GameState::Running;
                self.events.push(GameEvent::Resumed);
                info!("resumed");
            }
            GameState::GameOver => {}
        }
    }

    fn lock_and_spawn(&mut self) {
        let kind = self.current_piece.kind();
        self.grid.place(&self.current_piece.cells(), kind);
        self.events.push(GameEvent::PieceLocked);
        debug!(?kind, pivot = ?self.current_piece.pivot(), "piece locked");

        let cleared = self.grid.clear_completed_rows();
        if cleared > 0 {
            self.score += cleared;
            self.events.push(GameEvent::LinesCleared(cleared));
            info!(cleared, score = self.score, "rows cleared");
        }

        self.spawn_next_piece();
    }

    fn spawn_next_piece(&mut self) {
        self.current_piece = self.fresh_piece();
        self.refill_preview();
        debug!(kind = ?self.current_piece.kind(), "piece spawned");

        if !self.current_piece.fits(&self.grid) || self.grid.is_overflowing() {
            self.state = GameState::GameOver;
            self.events.push(GameEvent::GameOver);
            info!(score = self.score, "game over");
        }
    }

    fn fresh_piece(&mut self) -> ActivePiece {
        let kind = match self.preview_queue.pop_front() {
            Some(kind) => kind,
            None => self.piece_provider.next_piece(),
        };
        ActivePiece::spawn(kind, self.config.spawn_column as i16)
    }

    fn refill_preview(&mut self) {
        while self.preview_queue.len() < self.config.preview_count {
            self.preview_queue.push_back(self.piece_provider.next_piece());
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
