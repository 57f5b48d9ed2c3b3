//! Liquidation of a player's holdings after their cash goes negative.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::EngineError;
use crate::state::PlayerState;

/// One liquidation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Liquidation {
    Improvements { position: usize, levels: u8, proceeds: i64 },
    Property { position: usize, proceeds: i64 },
}

impl Liquidation {
    #[must_use]
    pub const fn proceeds(&self) -> i64 {
        match *self {
            Self::Improvements { proceeds, .. } | Self::Property { proceeds, .. } => proceeds,
        }
    }
}

/// What the resolver sold and whether it was enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsolvencyReport {
    pub sales: Vec<Liquidation>,
    /// Cash still owed when liquidation ran out of holdings; 0 when solvent.
    pub deficit: i64,
}

impl InsolvencyReport {
    #[must_use]
    pub const fn is_solvent(&self) -> bool {
        self.deficit == 0
    }

    #[must_use]
    pub fn proceeds(&self) -> i64 {
        self.sales.iter().map(Liquidation::proceeds).sum()
    }

    /// Human-readable summary for the turn log.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .sales
            .iter()
            .map(|sale| match *sale {
                Liquidation::Improvements {
                    position,
                    levels,
                    proceeds,
                } => format!("sold {levels} improvement(s) on {position} for {proceeds}"),
                Liquidation::Property { position, proceeds } => {
                    format!("sold square {position} for {proceeds}")
                }
            })
            .collect();
        if !self.is_solvent() {
            parts.push(format!("bankrupt with deficit {}", self.deficit));
        }
        parts.join("; ")
    }
}

/// Sell holdings until `player` is solvent or has nothing left.
///
/// Improvements go first, square by square in board order at half their
/// cost per level; bare properties follow in board order at half their
/// price. Solvency is rechecked after every square. A player still in debt
/// after selling everything has any remaining holdings returned to the bank
/// and the report carries the deficit.
///
/// # Errors
///
/// Propagates [`EngineError::SquareOutOfRange`] from board lookups.
pub fn resolve_insolvency(
    board: &mut Board,
    player_idx: usize,
    player: &mut PlayerState,
) -> Result<InsolvencyReport, EngineError> {
    let mut report = InsolvencyReport::default();
    if player.cash >= 0 {
        return Ok(report);
    }

    for pos in board.owned_by(player_idx) {
        if player.cash >= 0 {
            break;
        }
        if board.level_of(pos) == 0 {
            continue;
        }
        let unit = board.get_square(pos)?.improvement_cost().unwrap_or(0) / 2;
        let levels = board.clear_improvements(pos)?;
        let proceeds = unit.saturating_mul(i64::from(levels));
        player.cash = player.cash.saturating_add(proceeds);
        report.sales.push(Liquidation::Improvements {
            position: pos,
            levels,
            proceeds,
        });
    }

    for pos in board.owned_by(player_idx) {
        if player.cash >= 0 {
            break;
        }
        let proceeds = board.get_square(pos)?.price().unwrap_or(0) / 2;
        board.clear_ownership(pos)?;
        player.cash = player.cash.saturating_add(proceeds);
        report.sales.push(Liquidation::Property {
            position: pos,
            proceeds,
        });
    }

    if player.cash < 0 {
        board.release_all(player_idx);
        report.deficit = -player.cash;
    }
    Ok(report)
}
