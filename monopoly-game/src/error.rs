//! Error types for configuration loading and turn resolution.

use thiserror::Error;

/// Errors raised when game or training configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: i64,
        value: i64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} position {position} lies outside a board of {board_size} squares")]
    PositionOutOfBoard {
        field: &'static str,
        position: usize,
        board_size: usize,
    },
    #[error("square {position} is defined more than once")]
    DuplicateSquare { position: usize },
    #[error("square {position} must be a {expected} square")]
    SquareKindMismatch {
        position: usize,
        expected: &'static str,
    },
    #[error("{deck} deck has no cards")]
    EmptyDeck { deck: &'static str },
    #[error("invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Fatal caller errors surfaced by the turn engine.
///
/// Game failures (an unaffordable purchase, a failed jail escape, bankruptcy)
/// are ordinary turn outcomes and never appear here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("action value {value} is neither pass (0) nor buy (1)")]
    InvalidAction { value: u8 },
    #[error("player {player} does not exist ({players} players seated)")]
    PlayerOutOfRange { player: usize, players: usize },
    #[error("player {player} acted out of turn (expected player {expected})")]
    OutOfTurn { player: usize, expected: usize },
    #[error("square {position} is outside a board of {board_size} squares")]
    SquareOutOfRange { position: usize, board_size: usize },
}
