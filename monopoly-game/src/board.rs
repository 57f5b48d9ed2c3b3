//! Board model: static square metadata plus per-run ownership state.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::EngineError;

/// Improvement level that marks a hotel.
pub const HOTEL_LEVEL: u8 = 5;

/// Colour or transport group a property belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorGroup {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
    Railroad,
    Utility,
}

impl ColorGroup {
    /// Whether houses and hotels may be built in this group.
    #[must_use]
    pub const fn is_improvable(self) -> bool {
        !matches!(self, Self::Railroad | Self::Utility)
    }
}

/// What happens when a player comes to rest on a square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SquareKind {
    Go,
    Jail,
    GoToJail,
    Fee {
        amount: i64,
    },
    Chance,
    Chest,
    Property {
        price: i64,
        rent: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        improvement_cost: Option<i64>,
        group: ColorGroup,
    },
    Idle,
}

/// Immutable description of one board square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    pub position: usize,
    pub name: String,
    #[serde(flatten)]
    pub kind: SquareKind,
}

impl Square {
    /// Plain square with no effect.
    #[must_use]
    pub fn idle(position: usize) -> Self {
        Self {
            position,
            name: format!("Square {position}"),
            kind: SquareKind::Idle,
        }
    }

    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(self.kind, SquareKind::Property { .. })
    }

    /// Purchase price, `None` for squares that cannot be bought.
    #[must_use]
    pub const fn price(&self) -> Option<i64> {
        match self.kind {
            SquareKind::Property { price, .. } => Some(price),
            _ => None,
        }
    }

    #[must_use]
    pub const fn base_rent(&self) -> i64 {
        match self.kind {
            SquareKind::Property { rent, .. } => rent,
            _ => 0,
        }
    }

    #[must_use]
    pub const fn group(&self) -> Option<ColorGroup> {
        match self.kind {
            SquareKind::Property { group, .. } => Some(group),
            _ => None,
        }
    }

    /// Cost of one improvement level, `None` when the square cannot be improved.
    #[must_use]
    pub const fn improvement_cost(&self) -> Option<i64> {
        match self.kind {
            SquareKind::Property {
                improvement_cost: Some(cost),
                group,
                ..
            } if group.is_improvable() => Some(cost),
            _ => None,
        }
    }

    /// Short label for the square category.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.kind {
            SquareKind::Go => "go",
            SquareKind::Jail => "jail",
            SquareKind::GoToJail => "go_to_jail",
            SquareKind::Fee { .. } => "fee",
            SquareKind::Chance => "chance",
            SquareKind::Chest => "chest",
            SquareKind::Property { .. } => "property",
            SquareKind::Idle => "idle",
        }
    }
}

/// Mutable ownership state of a square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareState {
    pub owner: Option<usize>,
    /// 0 = bare, 1..=4 houses, 5 = hotel.
    pub level: u8,
}

/// The board for one run. Square metadata never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: Vec<Square>,
    states: Vec<SquareState>,
    hotel_multiplier: i64,
}

impl Board {
    /// Lay out the board described by a validated configuration.
    ///
    /// Positions the configuration leaves out become idle squares; the jail
    /// and go-to-jail positions always carry their kinds.
    #[must_use]
    pub fn from_config(cfg: &GameConfig) -> Self {
        let mut squares: Vec<Square> = (0..cfg.board_size).map(Square::idle).collect();
        for square in &cfg.squares {
            if let Some(slot) = squares.get_mut(square.position) {
                *slot = square.clone();
            }
        }
        if let Some(jail) = squares.get_mut(cfg.jail_position)
            && jail.kind == SquareKind::Idle
        {
            jail.kind = SquareKind::Jail;
            jail.name = String::from("Jail");
        }
        if let Some(gtj) = squares.get_mut(cfg.go_to_jail_position)
            && gtj.kind == SquareKind::Idle
        {
            gtj.kind = SquareKind::GoToJail;
            gtj.name = String::from("Go To Jail");
        }
        let states = vec![SquareState::default(); squares.len()];
        Self {
            squares,
            states,
            hotel_multiplier: cfg.hotel_rent_multiplier,
        }
    }

    /// Number of squares.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.squares.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// All squares in board order.
    #[must_use]
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Look up a square's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn get_square(&self, pos: usize) -> Result<&Square, EngineError> {
        self.squares.get(pos).ok_or(EngineError::SquareOutOfRange {
            position: pos,
            board_size: self.squares.len(),
        })
    }

    /// Look up a square's ownership state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn state(&self, pos: usize) -> Result<&SquareState, EngineError> {
        self.states.get(pos).ok_or(EngineError::SquareOutOfRange {
            position: pos,
            board_size: self.states.len(),
        })
    }

    fn state_mut(&mut self, pos: usize) -> Result<&mut SquareState, EngineError> {
        let board_size = self.states.len();
        self.states.get_mut(pos).ok_or(EngineError::SquareOutOfRange {
            position: pos,
            board_size,
        })
    }

    /// Owner of a square, `None` when unowned or off the board.
    #[must_use]
    pub fn owner_of(&self, pos: usize) -> Option<usize> {
        self.states.get(pos).and_then(|state| state.owner)
    }

    /// Improvement level of a square, 0 when off the board.
    #[must_use]
    pub fn level_of(&self, pos: usize) -> u8 {
        self.states.get(pos).map_or(0, |state| state.level)
    }

    /// Transfer a square to `player`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn set_owner(&mut self, pos: usize, player: usize) -> Result<(), EngineError> {
        self.state_mut(pos)?.owner = Some(player);
        Ok(())
    }

    /// Raise the improvement level by one, saturating at a hotel. Returns the
    /// new level.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn add_improvement(&mut self, pos: usize) -> Result<u8, EngineError> {
        let state = self.state_mut(pos)?;
        state.level = state.level.saturating_add(1).min(HOTEL_LEVEL);
        Ok(state.level)
    }

    /// Strip every improvement from a square, returning how many levels were removed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn clear_improvements(&mut self, pos: usize) -> Result<u8, EngineError> {
        let state = self.state_mut(pos)?;
        let removed = state.level;
        state.level = 0;
        Ok(removed)
    }

    /// Return a square to the bank with its improvements cleared.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn clear_ownership(&mut self, pos: usize) -> Result<(), EngineError> {
        *self.state_mut(pos)? = SquareState::default();
        Ok(())
    }

    /// Whether `player` holds every square of `group`.
    #[must_use]
    pub fn owns_group(&self, player: usize, group: ColorGroup) -> bool {
        let mut members = self
            .squares
            .iter()
            .zip(&self.states)
            .filter(|(square, _)| square.group() == Some(group))
            .peekable();
        members.peek().is_some() && members.all(|(_, state)| state.owner == Some(player))
    }

    /// Whether `player` may buy one more improvement on `pos` with `cash` in hand.
    #[must_use]
    pub fn can_improve(&self, pos: usize, player: usize, cash: i64) -> bool {
        let (Some(square), Some(state)) = (self.squares.get(pos), self.states.get(pos)) else {
            return false;
        };
        let (Some(cost), Some(group)) = (square.improvement_cost(), square.group()) else {
            return false;
        };
        state.owner == Some(player)
            && state.level < HOTEL_LEVEL
            && cash >= cost
            && self.owns_group(player, group)
    }

    /// Whether an unowned property at `pos` can be bought with `cash`.
    #[must_use]
    pub fn is_purchasable(&self, pos: usize, cash: i64) -> bool {
        let (Some(square), Some(state)) = (self.squares.get(pos), self.states.get(pos)) else {
            return false;
        };
        state.owner.is_none() && square.price().is_some_and(|price| cash >= price)
    }

    /// Rent owed for landing on `pos` at its current improvement level.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SquareOutOfRange`] when `pos` is not on the board.
    pub fn rent_for(&self, pos: usize) -> Result<i64, EngineError> {
        let base = self.get_square(pos)?.base_rent();
        let level = self.state(pos)?.level;
        Ok(match level {
            0 => base,
            HOTEL_LEVEL.. => base.saturating_mul(self.hotel_multiplier),
            houses => base.saturating_mul(1 + i64::from(houses)),
        })
    }

    /// Positions owned by `player` in board order.
    #[must_use]
    pub fn owned_by(&self, player: usize) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.owner == Some(player))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Return every square owned by `player` to the bank. Returns the number released.
    pub fn release_all(&mut self, player: usize) -> usize {
        let mut released = 0;
        for state in &mut self.states {
            if state.owner == Some(player) {
                *state = SquareState::default();
                released += 1;
            }
        }
        released
    }

    /// Clear all ownership for a fresh episode.
    pub fn reset(&mut self) {
        self.states.fill(SquareState::default());
    }
}
