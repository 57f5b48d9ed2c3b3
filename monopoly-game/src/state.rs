//! Mutable game state for one episode.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, SquareKind};
use crate::config::GameConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: usize,
    /// Negative cash signals insolvency.
    pub cash: i64,
    pub jailed: bool,
    /// Consecutive turns spent in jail.
    pub jail_turns: u8,
}

impl PlayerState {
    #[must_use]
    pub const fn new(start_cash: i64) -> Self {
        Self {
            position: 0,
            cash: start_cash,
            jailed: false,
            jail_turns: 0,
        }
    }
}

/// What the acting player sees before choosing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub player: usize,
    pub position: usize,
    pub cash: i64,
    pub jailed: bool,
    /// Owner of the square the player occupies.
    pub square_owner: Option<usize>,
    pub step: u32,
}

/// Board plus players for one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub players: Vec<PlayerState>,
    /// Index of the player whose turn it is.
    pub current: usize,
    pub step: u32,
    pub episode_id: u32,
    pub done: bool,
    /// Observation handed out by the turn that ended the episode.
    pub final_observation: Option<Observation>,
}

impl GameState {
    /// Fresh state: every player at GO with starting cash, nothing owned.
    #[must_use]
    pub fn new(cfg: &GameConfig, episode_id: u32) -> Self {
        Self {
            board: Board::from_config(cfg),
            players: vec![PlayerState::new(cfg.start_cash); cfg.num_players],
            current: 0,
            step: 0,
            episode_id,
            done: false,
            final_observation: None,
        }
    }

    /// Return to the starting position, keeping the board layout.
    pub fn reset(&mut self, start_cash: i64, episode_id: u32) {
        self.board.reset();
        for player in &mut self.players {
            *player = PlayerState::new(start_cash);
        }
        self.current = 0;
        self.step = 0;
        self.episode_id = episode_id;
        self.done = false;
        self.final_observation = None;
    }

    /// Observation for `player`, `None` when the index is not seated.
    #[must_use]
    pub fn observe(&self, player: usize) -> Option<Observation> {
        let state = self.players.get(player)?;
        Some(Observation {
            player,
            position: state.position,
            cash: state.cash,
            jailed: state.jailed,
            square_owner: self.board.owner_of(state.position),
            step: self.step,
        })
    }
}

fn owner_glyph(kind: &SquareKind, owner: Option<usize>, level: u8) -> String {
    match (kind, owner) {
        (_, Some(player)) if level > 0 => format!("{player}+{level}"),
        (_, Some(player)) => format!("P{player}"),
        (SquareKind::Property { .. }, None) => String::from("--"),
        (SquareKind::Go, None) => String::from("GO"),
        (SquareKind::Jail, None) => String::from("JL"),
        (SquareKind::GoToJail, None) => String::from("GJ"),
        (SquareKind::Fee { .. }, None) => String::from("$$"),
        (SquareKind::Chance, None) => String::from("??"),
        (SquareKind::Chest, None) => String::from("CC"),
        (SquareKind::Idle, None) => String::from(".."),
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "episode {} step {}{}",
            self.episode_id,
            self.step,
            if self.done { " (done)" } else { "" }
        )?;
        for (idx, player) in self.players.iter().enumerate() {
            let marker = if idx == self.current { '>' } else { ' ' };
            let jail = if player.jailed { " [jailed]" } else { "" };
            writeln!(
                f,
                "{marker} player {idx}: square {:>2} cash {:>6}{jail}",
                player.position, player.cash
            )?;
        }
        for (row_idx, row) in self.board.squares().chunks(10).enumerate() {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(offset, square)| {
                    let pos = row_idx * 10 + offset;
                    format!(
                        "{:>4}",
                        owner_glyph(&square.kind, self.board.owner_of(pos), self.board.level_of(pos))
                    )
                })
                .collect();
            writeln!(f, "{:>2}|{}", row_idx * 10, cells.join(""))?;
        }
        Ok(())
    }
}
