//! Chance and community chest decks.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::state::PlayerState;

/// Which deck a card square draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckKind {
    Chance,
    Chest,
}

impl DeckKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chance => "Chance",
            Self::Chest => "Community Chest",
        }
    }
}

/// What a drawn card does to the player who drew it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardEffect {
    AdvanceToGo,
    SendToJail,
    AdjustCash { amount: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub effect: CardEffect,
}

/// Board constants a card effect needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectContext {
    pub go_bonus: i64,
    pub jail_position: usize,
}

/// Player state after a card effect plus the cash it moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectOutcome {
    pub player: PlayerState,
    pub cash_delta: i64,
    pub sent_to_jail: bool,
    pub description: String,
}

/// Draw one card uniformly from a deck. Decks are never depleted.
pub fn draw<'a, R: RngCore>(deck: &'a [Card], rng: &mut R) -> Option<&'a Card> {
    deck.choose(rng)
}

/// Apply a card effect to a copy of the player.
///
/// Advancing to GO from anywhere but GO itself pays the GO bonus.
#[must_use]
pub fn apply_effect(effect: CardEffect, player: &PlayerState, ctx: EffectContext) -> EffectOutcome {
    let mut next = player.clone();
    match effect {
        CardEffect::AdvanceToGo => {
            let bonus = if player.position > 0 { ctx.go_bonus } else { 0 };
            next.position = 0;
            next.cash = next.cash.saturating_add(bonus);
            EffectOutcome {
                player: next,
                cash_delta: bonus,
                sent_to_jail: false,
                description: format!("Advanced to GO, collected {bonus}"),
            }
        }
        CardEffect::SendToJail => {
            next.position = ctx.jail_position;
            next.jailed = true;
            next.jail_turns = 0;
            EffectOutcome {
                player: next,
                cash_delta: 0,
                sent_to_jail: true,
                description: String::from("Sent to jail"),
            }
        }
        CardEffect::AdjustCash { amount } => {
            next.cash = next.cash.saturating_add(amount);
            let description = if amount >= 0 {
                format!("Collected {amount}")
            } else {
                format!("Paid {}", amount.unsigned_abs())
            };
            EffectOutcome {
                player: next,
                cash_delta: amount,
                sent_to_jail: false,
                description,
            }
        }
    }
}
