//! Terminal presentation: draws snapshots and turns key presses into actions.
//!
//! The game core never sees a terminal type; everything it needs to know
//! about input arrives as a [`Command`].

use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::game::{Command, GameState};
use crate::grid::CellState;
use crate::piece::TetrominoType;
use crate::snapshot::Snapshot;

// ============================================================================
// Presenter Trait
// ============================================================================

/// What the input side of a presenter asks the driver loop to do
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Command(Command),
    Reset,
    Quit,
}

pub trait Presenter {
    type Input;
    type Error;

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), Self::Error>;

    fn dispatch(&self, input: Self::Input) -> Option<Action>;
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

fn tetromino_color(t: TetrominoType) -> Color {
    match t {
        TetrominoType::I => Color::Cyan,
        TetrominoType::O => Color::Yellow,
        TetrominoType::T => Color::Magenta,
        TetrominoType::S => Color::Green,
        TetrominoType::Z => Color::Red,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0),
    }
}

// ============================================================================
// Terminal Presenter
// ============================================================================

pub struct TerminalPresenter<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalPresenter<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }
}

/// Run terminal `setup`; if it fails part way, run `restore` before
/// returning the setup error so the shell is not left in raw mode.
pub fn setup_or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce() -> io::Result<()>,
) -> io::Result<T> {
    setup().or_else(|err| {
        if let Err(restore_err) = restore() {
            tracing::warn!(%restore_err, "terminal restore after failed setup");
        }
        Err(err)
    })
}

impl<B: Backend> Presenter for TerminalPresenter<B> {
    type Input = KeyEvent;
    type Error = io::Error;

    fn render(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, snapshot))?;
        Ok(())
    }

    fn dispatch(&self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => Action::Reset,
            KeyCode::Left => Action::Command(Command::MoveLeft),
            KeyCode::Right => Action::Command(Command::MoveRight),
            KeyCode::Up => Action::Command(Command::RotateCw),
            KeyCode::Char('z') | KeyCode::Char('Z') => Action::Command(Command::RotateCcw),
            KeyCode::Down => Action::Command(Command::SoftDrop),
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                Action::Command(Command::TogglePause)
            }
            _ => return None,
        };
        Some(action)
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, snapshot: &Snapshot) {
    let area = frame.size();

    render_game(frame, snapshot, area);
    match snapshot.state {
        GameState::Running => {}
        GameState::Paused => render_popup(
            frame,
            area,
            "Paused",
            vec![
                Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
                hint("Space to continue"),
            ],
        ),
        GameState::GameOver => render_popup(
            frame,
            area,
            "Game Over",
            vec![
                Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
                Line::from(format!("Score: {}", snapshot.score)),
                hint("R: restart  ESC: quit"),
            ],
        ),
    }
}

fn render_game(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let grid_display_width = (snapshot.width as u16 * CELL_WIDTH) + 2;
    let grid_display_height = snapshot.height as u16 + 2;
    let side_width = 12;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // [Grid][Next / Score]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Length(8), Constraint::Length(5)]).split(horizontal[1]);

    render_grid(frame, snapshot, horizontal[0]);
    render_preview(frame, snapshot, side[0]);
    render_score(frame, snapshot, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→: Move | ↑/Z: Rotate | ↓: Drop | Space/P: Pause | R: Restart | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetris ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = snapshot
        .render_grid()
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|cell| match cell {
                    CellState::Empty => Span::raw(EMPTY_CHAR),
                    CellState::Filled(kind) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(tetromino_color(kind)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();

    for (i, &kind) in snapshot.next.iter().enumerate() {
        if i > 0 {
            lines.push(Line::from(""));
        }

        let shape = kind.offsets(0);
        let color = tetromino_color(kind);
        let max_y = shape.iter().map(|(_, y)| *y).max().unwrap_or(0);

        for y in 0i16..=max_y {
            let mut spans: Vec<Span> = vec![Span::raw(" ")];
            for x in 0i16..4i16 {
                if shape.contains(&(x, y)) {
                    spans.push(Span::styled(BLOCK_CHAR, Style::default().fg(color)));
                } else {
                    spans.push(Span::raw(EMPTY_CHAR));
                }
            }
            lines.push(Line::from(spans));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_score(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let lines = vec![
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", snapshot.score)),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Bordered, centred box over the field; one line of content per entry
fn render_popup(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
    let height = lines.len() as u16 + 2;
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} "))
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(paragraph, centered_rect(24, height, area));
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, SequencePieceProvider};
    use crossterm::event::{KeyEventState, KeyModifiers};
    use ratatui::backend::TestBackend;

    fn presenter() -> TerminalPresenter<TestBackend> {
        TerminalPresenter::new(Terminal::new(TestBackend::new(80, 30)).unwrap())
    }

    fn screen_text(presenter: &TerminalPresenter<TestBackend>) -> String {
        presenter
            .terminal()
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn failed_setup_restores_terminal() {
        let restored = std::cell::Cell::new(false);
        let result: io::Result<()> = setup_or_restore(
            || Err(io::Error::new(io::ErrorKind::Other, "no tty")),
            || {
                restored.set(true);
                Ok(())
            },
        );

        assert_eq!(result.unwrap_err().to_string(), "no tty");
        assert!(restored.get());
    }

    #[test]
    fn successful_setup_leaves_terminal_alone() {
        let restored = std::cell::Cell::new(false);
        let result = setup_or_restore(
            || Ok(7),
            || {
                restored.set(true);
                Ok(())
            },
        );

        assert_eq!(result.unwrap(), 7);
        assert!(!restored.get());
    }

    #[test]
    fn failed_restore_keeps_setup_error() {
        let result: io::Result<()> = setup_or_restore(
            || Err(io::Error::new(io::ErrorKind::Other, "no tty")),
            || Err(io::Error::new(io::ErrorKind::Other, "still raw")),
        );

        assert_eq!(result.unwrap_err().to_string(), "no tty");
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrow_keys_map_to_commands() {
        let p = presenter();
        assert_eq!(p.dispatch(press(KeyCode::Left)), Some(Action::Command(Command::MoveLeft)));
        assert_eq!(p.dispatch(press(KeyCode::Right)), Some(Action::Command(Command::MoveRight)));
        assert_eq!(p.dispatch(press(KeyCode::Up)), Some(Action::Command(Command::RotateCw)));
        assert_eq!(p.dispatch(press(KeyCode::Down)), Some(Action::Command(Command::SoftDrop)));
    }

    #[test]
    fn space_toggles_pause() {
        let p = presenter();
        assert_eq!(
            p.dispatch(press(KeyCode::Char(' '))),
            Some(Action::Command(Command::TogglePause))
        );
    }

    #[test]
    fn control_keys() {
        let p = presenter();
        assert_eq!(p.dispatch(press(KeyCode::Char('z'))), Some(Action::Command(Command::RotateCcw)));
        assert_eq!(p.dispatch(press(KeyCode::Char('r'))), Some(Action::Reset));
        assert_eq!(p.dispatch(press(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(p.dispatch(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(p.dispatch(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let p = presenter();
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Left,
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(p.dispatch(release), None);
    }

    #[test]
    fn renders_score_and_field() {
        let game = Game::with_provider(Box::new(SequencePieceProvider::new(vec![TetrominoType::O])));
        let mut p = presenter();
        p.render(&game.snapshot()).unwrap();

        let text = screen_text(&p);
        assert!(text.contains("Tetris"));
        assert!(text.contains("Score"));
        assert!(text.contains(BLOCK_CHAR));
    }

    #[test]
    fn renders_pause_overlay() {
        let mut game = Game::new();
        game.on_command(Command::TogglePause);
        let mut p = presenter();
        p.render(&game.snapshot()).unwrap();

        assert!(screen_text(&p).contains("PAUSED"));
    }

    #[test]
    fn renders_game_over_overlay_with_score() {
        let mut game = Game::with_provider(Box::new(SequencePieceProvider::new(vec![TetrominoType::O])));
        while !game.is_game_over() {
            game.on_tick();
        }
        let mut p = presenter();
        p.render(&game.snapshot()).unwrap();

        let text = screen_text(&p);
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("Score: 0"));
        assert!(text.contains("R: restart"));
    }
}
