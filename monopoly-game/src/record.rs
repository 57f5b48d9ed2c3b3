//! Structured per-turn records streamed to log sinks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::engine::Action;

/// Column order of the tabular turn log.
pub const TURN_RECORD_COLUMNS: [&str; 18] = [
    "episode_id",
    "step",
    "player",
    "position_before",
    "dice_roll",
    "landed_on_position",
    "position_after",
    "money_before",
    "money_after",
    "reward",
    "done",
    "in_jail",
    "fee_paid",
    "agent_action",
    "action_desc",
    "owned_properties",
    "card",
    "card_specific_desc",
];

/// How the turn's purchase opportunity played out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// No purchase opportunity arose.
    #[default]
    None,
    Bought,
    Declined,
    Unaffordable,
    Improved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedSquare {
    pub position: usize,
    pub name: String,
    pub level: u8,
}

pub type OwnedSquares = SmallVec<[OwnedSquare; 8]>;

/// Immutable snapshot of one resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub episode_id: u32,
    pub step: u32,
    pub player: usize,
    pub position_before: usize,
    pub dice_roll: u8,
    /// Square reached by the dice, before any card relocation.
    pub landed_on_position: usize,
    pub position_after: usize,
    pub money_before: i64,
    pub money_after: i64,
    pub reward: i64,
    pub done: bool,
    pub in_jail: bool,
    pub fee_paid: i64,
    pub agent_action: Action,
    pub action_desc: String,
    pub owned_properties: OwnedSquares,
    pub card: Option<String>,
    pub card_specific_desc: Option<String>,
    #[serde(default)]
    pub purchase: PurchaseOutcome,
}

impl TurnRecord {
    /// Owned squares rendered as `name (level)` joined by `; `.
    #[must_use]
    pub fn owned_properties_text(&self) -> String {
        self.owned_properties
            .iter()
            .map(|owned| format!("{} ({})", owned.name, owned.level))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Field values in [`TURN_RECORD_COLUMNS`] order.
    #[must_use]
    pub fn to_row(&self) -> [String; 18] {
        [
            self.episode_id.to_string(),
            self.step.to_string(),
            self.player.to_string(),
            self.position_before.to_string(),
            self.dice_roll.to_string(),
            self.landed_on_position.to_string(),
            self.position_after.to_string(),
            self.money_before.to_string(),
            self.money_after.to_string(),
            self.reward.to_string(),
            self.done.to_string(),
            self.in_jail.to_string(),
            self.fee_paid.to_string(),
            u8::from(self.agent_action).to_string(),
            self.action_desc.clone(),
            self.owned_properties_text(),
            self.card.clone().unwrap_or_default(),
            self.card_specific_desc.clone().unwrap_or_default(),
        ]
    }
}
