//! Monopoly Monte Carlo Engine
//!
//! Platform-agnostic core for a simplified Monopoly economy: the board model,
//! the turn-resolution state machine with its event decks and insolvency
//! resolver, an epsilon-greedy buy/pass agent, and a first-visit Monte Carlo
//! learner. Output surfaces (log files, reports) live in the trainer crate.

pub mod agent;
pub mod board;
pub mod cards;
pub mod config;
pub mod engine;
pub mod error;
pub mod insolvency;
pub mod learner;
pub mod numbers;
pub mod record;
pub mod rng;
pub mod state;

// Re-export commonly used types
pub use agent::{CompressedState, DecisionAgent, StateCompressor, ValueEntry, ValueTable};
pub use board::{Board, ColorGroup, HOTEL_LEVEL, Square, SquareKind, SquareState};
pub use cards::{Card, CardEffect, DeckKind, EffectContext, EffectOutcome, apply_effect};
pub use config::{GameConfig, RunConfig, TrainingConfig};
pub use engine::{Action, TurnEngine, TurnOutcome, TurnPhase, roll_dice};
pub use error::{ConfigError, EngineError};
pub use insolvency::{InsolvencyReport, Liquidation, resolve_insolvency};
pub use learner::{
    EpisodeStep, EpisodeSummary, EvaluationReport, MonteCarloLearner, NullSink, TurnSink,
    first_visit_update,
};
pub use record::{OwnedSquare, OwnedSquares, PurchaseOutcome, TURN_RECORD_COLUMNS, TurnRecord};
pub use rng::{CountingRng, RunRng, derive_stream_seed};
pub use state::{GameState, Observation, PlayerState};
