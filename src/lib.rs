pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod piece;
pub mod snapshot;
pub mod ui;
