//! Game and training configuration.
//!
//! The standard 40-square board ships as an embedded JSON document. Custom
//! boards use the same schema; any field a document omits falls back to the
//! standard value.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::board::{Square, SquareKind};
use crate::cards::Card;
use crate::error::ConfigError;

/// Immutable rules and board layout for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_board_size")]
    pub board_size: usize,
    #[serde(default = "GameConfig::default_num_players")]
    pub num_players: usize,
    #[serde(default = "GameConfig::default_start_cash")]
    pub start_cash: i64,
    #[serde(default = "GameConfig::default_go_bonus")]
    pub go_bonus: i64,
    #[serde(default = "GameConfig::default_jail_position")]
    pub jail_position: usize,
    #[serde(default = "GameConfig::default_go_to_jail_position")]
    pub go_to_jail_position: usize,
    #[serde(default = "GameConfig::default_jail_turn_limit")]
    pub jail_turn_limit: u8,
    #[serde(default = "GameConfig::default_jail_fee")]
    pub jail_fee: i64,
    #[serde(default = "GameConfig::default_bankruptcy_penalty")]
    pub bankruptcy_penalty: i64,
    #[serde(default = "GameConfig::default_hotel_rent_multiplier")]
    pub hotel_rent_multiplier: i64,
    #[serde(default = "GameConfig::default_cash_bucket_width")]
    pub cash_bucket_width: i64,
    /// Let players buy houses on their own completed groups.
    #[serde(default)]
    pub allow_improvements: bool,
    #[serde(default = "GameConfig::default_squares")]
    pub squares: Vec<Square>,
    #[serde(default = "GameConfig::default_chance_deck")]
    pub chance_deck: Vec<Card>,
    #[serde(default = "GameConfig::default_chest_deck")]
    pub chest_deck: Vec<Card>,
}

fn standard_board() -> &'static GameConfig {
    static BOARD: OnceLock<GameConfig> = OnceLock::new();
    BOARD.get_or_init(|| {
        serde_json::from_str(include_str!("../data/board.json")).expect("valid standard board")
    })
}

impl GameConfig {
    const fn default_board_size() -> usize {
        40
    }

    const fn default_num_players() -> usize {
        2
    }

    const fn default_start_cash() -> i64 {
        1500
    }

    const fn default_go_bonus() -> i64 {
        200
    }

    const fn default_jail_position() -> usize {
        10
    }

    const fn default_go_to_jail_position() -> usize {
        30
    }

    const fn default_jail_turn_limit() -> u8 {
        3
    }

    const fn default_jail_fee() -> i64 {
        50
    }

    const fn default_bankruptcy_penalty() -> i64 {
        1000
    }

    const fn default_hotel_rent_multiplier() -> i64 {
        8
    }

    const fn default_cash_bucket_width() -> i64 {
        100
    }

    fn default_squares() -> Vec<Square> {
        standard_board().squares.clone()
    }

    fn default_chance_deck() -> Vec<Card> {
        standard_board().chance_deck.clone()
    }

    fn default_chest_deck() -> Vec<Card> {
        standard_board().chest_deck.clone()
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// violation when the parsed configuration is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Fee charged on each fee square, in board order.
    #[must_use]
    pub fn fee_table(&self) -> Vec<(usize, i64)> {
        let mut fees: Vec<(usize, i64)> = self
            .squares
            .iter()
            .filter_map(|square| match square.kind {
                SquareKind::Fee { amount } => Some((square.position, amount)),
                _ => None,
            })
            .collect();
        fees.sort_unstable();
        fees
    }

    /// Positions that draw from the chance deck.
    #[must_use]
    pub fn chance_positions(&self) -> Vec<usize> {
        self.positions_of(&SquareKind::Chance)
    }

    /// Positions that draw from the community chest deck.
    #[must_use]
    pub fn chest_positions(&self) -> Vec<usize> {
        self.positions_of(&SquareKind::Chest)
    }

    fn positions_of(&self, kind: &SquareKind) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .squares
            .iter()
            .filter(|square| &square.kind == kind)
            .map(|square| square.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scalars()?;
        self.validate_layout()?;
        if self.chance_deck.is_empty() && !self.chance_positions().is_empty() {
            return Err(ConfigError::EmptyDeck { deck: "chance" });
        }
        if self.chest_deck.is_empty() && !self.chest_positions().is_empty() {
            return Err(ConfigError::EmptyDeck { deck: "chest" });
        }
        Ok(())
    }

    fn validate_scalars(&self) -> Result<(), ConfigError> {
        let minimums: [(&'static str, i64, i64); 8] = [
            ("board_size", 2, count(self.board_size)),
            ("num_players", 1, count(self.num_players)),
            ("start_cash", 1, self.start_cash),
            ("go_bonus", 0, self.go_bonus),
            ("jail_turn_limit", 1, i64::from(self.jail_turn_limit)),
            ("jail_fee", 0, self.jail_fee),
            ("bankruptcy_penalty", 0, self.bankruptcy_penalty),
            ("cash_bucket_width", 1, self.cash_bucket_width),
        ];
        for (field, min, value) in minimums {
            if value < min {
                return Err(ConfigError::MinViolation { field, min, value });
            }
        }
        if self.hotel_rent_multiplier < 6 {
            return Err(ConfigError::MinViolation {
                field: "hotel_rent_multiplier",
                min: 6,
                value: self.hotel_rent_multiplier,
            });
        }
        Ok(())
    }

    fn validate_layout(&self) -> Result<(), ConfigError> {
        for (field, position) in [
            ("jail_position", self.jail_position),
            ("go_to_jail_position", self.go_to_jail_position),
        ] {
            if position >= self.board_size {
                return Err(ConfigError::PositionOutOfBoard {
                    field,
                    position,
                    board_size: self.board_size,
                });
            }
        }

        let mut seen = HashSet::new();
        for square in &self.squares {
            if square.position >= self.board_size {
                return Err(ConfigError::PositionOutOfBoard {
                    field: "squares",
                    position: square.position,
                    board_size: self.board_size,
                });
            }
            if !seen.insert(square.position) {
                return Err(ConfigError::DuplicateSquare {
                    position: square.position,
                });
            }
            let negative = match square.kind {
                SquareKind::Property { price, rent, .. } if price < 0 || rent < 0 => {
                    Some(("squares.price", price.min(rent)))
                }
                SquareKind::Property {
                    improvement_cost: Some(cost),
                    ..
                } if cost < 0 => Some(("squares.improvement_cost", cost)),
                SquareKind::Fee { amount } if amount < 0 => Some(("squares.fee", amount)),
                _ => None,
            };
            if let Some((field, value)) = negative {
                return Err(ConfigError::MinViolation { field, min: 0, value });
            }
            let jail_mismatch = square.position == self.jail_position
                && !matches!(square.kind, SquareKind::Jail | SquareKind::Idle);
            if jail_mismatch {
                return Err(ConfigError::SquareKindMismatch {
                    position: square.position,
                    expected: "jail",
                });
            }
            let gtj_mismatch = square.position == self.go_to_jail_position
                && !matches!(square.kind, SquareKind::GoToJail | SquareKind::Idle);
            if gtj_mismatch {
                return Err(ConfigError::SquareKindMismatch {
                    position: square.position,
                    expected: "go_to_jail",
                });
            }
        }
        Ok(())
    }
}

fn count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Default for GameConfig {
    fn default() -> Self {
        standard_board().clone()
    }
}

/// Parameters of the learning loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "TrainingConfig::default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "TrainingConfig::default_episodes")]
    pub episodes: u32,
    #[serde(default = "TrainingConfig::default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "TrainingConfig::default_seed")]
    pub seed: u64,
    /// Episodes between progress log lines.
    #[serde(default = "TrainingConfig::default_progress_interval")]
    pub progress_interval: u32,
}

impl TrainingConfig {
    const fn default_epsilon() -> f64 {
        0.1
    }

    const fn default_episodes() -> u32 {
        10_000
    }

    const fn default_max_steps() -> u32 {
        500
    }

    const fn default_seed() -> u64 {
        1337
    }

    const fn default_progress_interval() -> u32 {
        1000
    }

    /// Check training parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RangeViolation`] for an epsilon outside `[0, 1]`
    /// and [`ConfigError::MinViolation`] for a zero step ceiling.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::RangeViolation {
                field: "epsilon",
                min: 0.0,
                max: 1.0,
                value: self.epsilon,
            });
        }
        if self.max_steps == 0 {
            return Err(ConfigError::MinViolation {
                field: "max_steps",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::default_epsilon(),
            episodes: Self::default_episodes(),
            max_steps: Self::default_max_steps(),
            seed: Self::default_seed(),
            progress_interval: Self::default_progress_interval(),
        }
    }
}

/// Top-level document accepted by `--config` style loaders: both halves optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl RunConfig {
    /// Parse and validate a combined document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or violated invariants.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate both halves.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_board_matches_classic_constants() {
        let cfg = GameConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.board_size, 40);
        assert_eq!(cfg.start_cash, 1500);
        assert_eq!(cfg.go_bonus, 200);
        assert_eq!(cfg.fee_table(), vec![(4, 200), (12, 150), (28, 150), (38, 100)]);
        assert_eq!(cfg.chance_positions(), vec![7, 22, 36]);
        assert_eq!(cfg.chest_positions(), vec![2, 17, 33]);
        assert_eq!(cfg.chance_deck.len(), 4);
        assert_eq!(cfg.chest_deck.len(), 4);
        assert!(!cfg.allow_improvements);
    }

    #[test]
    fn omitted_fields_fall_back_to_standard_values() {
        let cfg = GameConfig::from_json(r#"{ "start_cash": 2000, "num_players": 4 }"#).unwrap();
        assert_eq!(cfg.start_cash, 2000);
        assert_eq!(cfg.num_players, 4);
        assert_eq!(cfg.squares.len(), 40);
        assert_eq!(cfg.jail_fee, 50);
    }

    #[test]
    fn validate_rejects_bad_scalars() {
        let cfg = GameConfig {
            num_players: 0,
            ..GameConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "num_players",
                min: 1,
                value: 0
            })
        );

        let cfg = GameConfig {
            hotel_rent_multiplier: 5,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "hotel_rent_multiplier",
                ..
            })
        ));
    }

    #[test]
    fn validate_rejects_bad_layout() {
        let mut cfg = GameConfig {
            board_size: 20,
            ..GameConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::PositionOutOfBoard { .. })
        ));

        cfg = GameConfig::default();
        cfg.squares.push(Square::idle(3));
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateSquare { position: 3 })
        );

        cfg = GameConfig::default();
        cfg.jail_position = 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SquareKindMismatch {
                position: 1,
                expected: "jail"
            })
        );
    }

    #[test]
    fn negative_fee_and_improvement_cost_are_rejected() {
        let mut cfg = GameConfig::default();
        if let Some(square) = cfg.squares.iter_mut().find(|s| s.position == 12) {
            square.kind = SquareKind::Fee { amount: -150 };
        }
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "squares.fee",
                min: 0,
                value: -150
            })
        );

        cfg = GameConfig::default();
        if let Some(SquareKind::Property {
            improvement_cost, ..
        }) = cfg
            .squares
            .iter_mut()
            .find(|s| s.position == 39)
            .map(|s| &mut s.kind)
        {
            *improvement_cost = Some(-200);
        }
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "squares.improvement_cost",
                min: 0,
                value: -200
            })
        );
    }

    #[test]
    fn empty_deck_with_card_squares_is_rejected() {
        let cfg = GameConfig {
            chance_deck: Vec::new(),
            ..GameConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyDeck { deck: "chance" }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            GameConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn training_defaults_and_validation() {
        let cfg = TrainingConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_steps, 500);
        let bad = TrainingConfig {
            epsilon: 1.2,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::RangeViolation {
                field: "epsilon",
                ..
            })
        ));
        let bad = TrainingConfig {
            max_steps: 0,
            ..TrainingConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn run_config_layers_both_halves() {
        let cfg =
            RunConfig::from_json(r#"{ "training": { "episodes": 25, "epsilon": 0.3 } }"#).unwrap();
        assert_eq!(cfg.training.episodes, 25);
        assert!((cfg.training.epsilon - 0.3).abs() < f64::EPSILON);
        assert_eq!(cfg.game, GameConfig::default());
    }
}
