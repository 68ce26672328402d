use std::{
    fs::File,
    io::{self, stdout, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::Instant,
};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::Level;

use blocktris::{
    config::{DropMode, GameConfig, PREVIEW_COUNT, TICK_MS},
    game::Game,
    grid::{GRID_HEIGHT, GRID_WIDTH},
    ui::{setup_or_restore, Action, Presenter, TerminalPresenter},
};

/// blocktris - falling block puzzle in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Field width in cells
    #[arg(long, default_value_t = GRID_WIDTH)]
    width: usize,

    /// Field height in cells
    #[arg(long, default_value_t = GRID_HEIGHT)]
    height: usize,

    /// Gravity interval in milliseconds
    #[arg(long, default_value_t = TICK_MS)]
    tick_ms: u64,

    /// What the down key does: "hard" or "soft"
    #[arg(long, default_value = "hard")]
    drop_mode: DropMode,

    /// Number of upcoming pieces to show
    #[arg(long, default_value_t = PREVIEW_COUNT)]
    preview: usize,

    /// Seed for reproducible piece sequences
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Maximum log level
    #[arg(long, default_value = "info")]
    log_level: Level,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::new()
            .with_dimensions(self.width, self.height)
            .with_tick_ms(self.tick_ms)
            .with_drop_mode(self.drop_mode)
            .with_preview_count(self.preview);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

// The game owns the terminal, so logs only ever go to a file.
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();
    Ok(())
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(presenter: &mut TerminalPresenter<CrosstermBackend<Stdout>>, game: &mut Game) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        presenter.render(&game.snapshot())?;

        let tick_duration = game.tick_interval();
        let timeout = tick_duration.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match presenter.dispatch(key) {
                    Some(Action::Quit) => break,
                    Some(Action::Reset) => game.reset(),
                    Some(Action::Command(command)) => {
                        game.on_command(command);
                    }
                    None => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_duration {
            game.on_tick();
            last_tick = Instant::now();
        }

        for event in game.take_events() {
            tracing::trace!(?event, "game event");
        }
    }

    Ok(())
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut game = Game::with_config(args.game_config()).context("Invalid game configuration")?;
    tracing::info!(config = ?game.config(), "starting");

    let terminal = setup_or_restore(
        || {
            enable_raw_mode()?;
            stdout().execute(EnterAlternateScreen)?;
            Terminal::new(CrosstermBackend::new(stdout()))
        },
        restore_terminal,
    )
    .context("Failed to set up terminal")?;
    let mut presenter = TerminalPresenter::new(terminal);

    let result = run(&mut presenter, &mut game);

    restore_terminal()?;
    presenter.terminal_mut().show_cursor()?;

    result.context("Game loop failed")?;
    tracing::info!(score = game.score(), "exiting");
    Ok(())
}
