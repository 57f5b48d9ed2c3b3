//! Epsilon-greedy buy/pass agent over a tabular value function.

use std::collections::HashMap;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::GameConfig;
use crate::engine::Action;
use crate::numbers::mean;
use crate::state::Observation;

/// Reduced observation the value table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompressedState {
    pub position: usize,
    pub cash_bucket: i64,
    pub square_owner: Option<usize>,
    pub jailed: bool,
}

/// Maps observations onto [`CompressedState`] keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateCompressor {
    cash_ceiling: i64,
    bucket_width: i64,
}

impl StateCompressor {
    /// Cash is clamped to ten times the starting cash before bucketing.
    #[must_use]
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            cash_ceiling: cfg.start_cash.saturating_mul(10),
            bucket_width: cfg.cash_bucket_width.max(1),
        }
    }

    #[must_use]
    pub fn compress(&self, obs: &Observation) -> CompressedState {
        CompressedState {
            position: obs.position,
            cash_bucket: obs.cash.clamp(0, self.cash_ceiling) / self.bucket_width,
            square_owner: obs.square_owner,
            jailed: obs.jailed,
        }
    }
}

/// Exported row of the value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    #[serde(flatten)]
    pub state: CompressedState,
    pub action: Action,
    pub value: f64,
    pub visits: usize,
}

type Key = (CompressedState, Action);

/// Lifetime running averages of observed returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    values: HashMap<Key, f64>,
    returns: HashMap<Key, Vec<f64>>,
}

impl ValueTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Learned value, 0.0 for pairs never observed.
    #[must_use]
    pub fn value(&self, state: &CompressedState, action: Action) -> f64 {
        self.values.get(&(*state, action)).copied().unwrap_or(0.0)
    }

    /// Every return recorded for the pair, oldest first.
    #[must_use]
    pub fn returns(&self, state: &CompressedState, action: Action) -> &[f64] {
        self.returns
            .get(&(*state, action))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a return and refresh the pair's mean. Returns the new value.
    pub fn record_return(&mut self, state: CompressedState, action: Action, ret: f64) -> f64 {
        let key = (state, action);
        let history = self.returns.entry(key).or_default();
        history.push(ret);
        let value = mean(history);
        self.values.insert(key, value);
        value
    }

    /// Number of (state, action) pairs with a value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distinct compressed states seen.
    #[must_use]
    pub fn state_count(&self) -> usize {
        let mut states: Vec<&CompressedState> = self.values.keys().map(|(state, _)| state).collect();
        states.sort_unstable();
        states.dedup();
        states.len()
    }

    /// Total returns recorded across all pairs.
    #[must_use]
    pub fn total_returns(&self) -> usize {
        self.returns.values().map(Vec::len).sum()
    }

    /// Entries sorted by state then action.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ValueEntry> {
        let mut entries: Vec<ValueEntry> = self
            .values
            .iter()
            .map(|(&(state, action), &value)| ValueEntry {
                state,
                action,
                value,
                visits: self.returns.get(&(state, action)).map_or(0, Vec::len),
            })
            .collect();
        entries.sort_by(|a, b| (a.state, a.action).cmp(&(b.state, b.action)));
        entries
    }
}

/// Epsilon-greedy agent owning the learned value table.
#[derive(Debug, Clone)]
pub struct DecisionAgent {
    table: ValueTable,
    epsilon: f64,
    compressor: StateCompressor,
}

impl DecisionAgent {
    #[must_use]
    pub fn new(cfg: &GameConfig, epsilon: f64) -> Self {
        Self {
            table: ValueTable::new(),
            epsilon: epsilon.clamp(0.0, 1.0),
            compressor: StateCompressor::from_config(cfg),
        }
    }

    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    #[must_use]
    pub const fn table(&self) -> &ValueTable {
        &self.table
    }

    pub const fn table_mut(&mut self) -> &mut ValueTable {
        &mut self.table
    }

    #[must_use]
    pub fn compress(&self, obs: &Observation) -> CompressedState {
        self.compressor.compress(obs)
    }

    /// Pick an action for the compressed `state`.
    ///
    /// Squares that cannot be bought right now always yield [`Action::Pass`]
    /// without consulting the table or the RNG.
    pub fn choose(
        &self,
        state: &CompressedState,
        obs: &Observation,
        board: &Board,
        rng: &mut dyn RngCore,
    ) -> Action {
        if !board.is_purchasable(obs.position, obs.cash) {
            return Action::Pass;
        }
        if rng.gen_bool(self.epsilon) {
            return coin_flip(rng);
        }
        let pass = self.table.value(state, Action::Pass);
        let buy = self.table.value(state, Action::Buy);
        if buy > pass {
            Action::Buy
        } else if pass > buy {
            Action::Pass
        } else {
            coin_flip(rng)
        }
    }
}

fn coin_flip(rng: &mut dyn RngCore) -> Action {
    if rng.gen_bool(0.5) {
        Action::Buy
    } else {
        Action::Pass
    }
}
