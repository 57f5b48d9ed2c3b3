//! Turn resolution state machine.
//!
//! [`TurnEngine`] owns the [`GameState`] and is the only code that mutates
//! it. Each call to [`TurnEngine::resolve_turn`] walks one player's turn
//! through the [`TurnPhase`] sequence and returns the reward earned by the
//! acting player along with a [`TurnRecord`] for the log.

use std::sync::Arc;

use log::{debug, trace, warn};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::board::SquareKind;
use crate::cards::{self, DeckKind, EffectContext};
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::insolvency::resolve_insolvency;
use crate::record::{OwnedSquare, OwnedSquares, PurchaseOutcome, TurnRecord};
use crate::state::{GameState, Observation, PlayerState};

/// Decision supplied for the acting player's turn.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Pass,
    Buy,
}

impl Action {
    pub const ALL: [Self; 2] = [Self::Pass, Self::Buy];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Buy => "buy",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pass),
            1 => Ok(Self::Buy),
            _ => Err(EngineError::InvalidAction { value }),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> Self {
        match action {
            Action::Pass => 0,
            Action::Buy => 1,
        }
    }
}

/// Stages a turn moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    InJail,
    RollingDice,
    Landed,
    CardResolution,
    SquareResolution,
    SolvencyCheck,
    InsolvencyResolution,
    TurnComplete,
}

/// Result of resolving (or skipping) one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// View for whoever acts next, or for the acting player once the episode ends.
    pub observation: Observation,
    pub reward: i64,
    pub done: bool,
    /// `None` when the episode had already ended.
    pub record: Option<TurnRecord>,
}

/// Roll two six-sided dice.
pub fn roll_dice<R: RngCore>(rng: &mut R) -> (u8, u8) {
    let first: u8 = rng.gen_range(1..=6);
    let second: u8 = rng.gen_range(1..=6);
    trace!("rolled {first} + {second}");
    (first, second)
}

/// Working copy of the acting player's turn.
#[derive(Debug)]
struct TurnContext {
    idx: usize,
    action: Action,
    player: PlayerState,
    position_before: usize,
    money_before: i64,
    dice: u8,
    landed_on: usize,
    reward: i64,
    fees: i64,
    card: Option<String>,
    card_desc: Option<String>,
    jailed_by_card: bool,
    purchase: PurchaseOutcome,
    notes: Vec<String>,
}

impl TurnContext {
    fn new(idx: usize, action: Action, player: PlayerState) -> Self {
        Self {
            idx,
            action,
            position_before: player.position,
            money_before: player.cash,
            landed_on: player.position,
            player,
            dice: 0,
            reward: 0,
            fees: 0,
            card: None,
            card_desc: None,
            jailed_by_card: false,
            purchase: PurchaseOutcome::None,
            notes: Vec::new(),
        }
    }

    fn charge(&mut self, amount: i64) {
        self.player.cash = self.player.cash.saturating_sub(amount);
        self.reward = self.reward.saturating_sub(amount);
        self.fees = self.fees.saturating_add(amount);
    }
}

/// Drives turns against a shared, immutable [`GameConfig`].
#[derive(Debug, Clone)]
pub struct TurnEngine {
    cfg: Arc<GameConfig>,
    state: GameState,
}

impl TurnEngine {
    #[must_use]
    pub fn new(cfg: Arc<GameConfig>) -> Self {
        let state = GameState::new(&cfg, 0);
        Self { cfg, state }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Borrow the mutable game state, for staging scenarios.
    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.state.done
    }

    /// Observation for the player whose turn it is.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlayerOutOfRange`] if the current pointer is invalid.
    pub fn observation(&self) -> Result<Observation, EngineError> {
        self.observe(self.state.current)
    }

    fn observe(&self, player: usize) -> Result<Observation, EngineError> {
        self.state
            .observe(player)
            .ok_or(EngineError::PlayerOutOfRange {
                player,
                players: self.state.players.len(),
            })
    }

    /// Start a new episode and return the first player's observation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlayerOutOfRange`] when no players are seated.
    pub fn reset(&mut self, episode_id: u32) -> Result<Observation, EngineError> {
        self.state.reset(self.cfg.start_cash, episode_id);
        self.observation()
    }

    /// Resolve the current player's turn.
    ///
    /// # Errors
    ///
    /// See [`TurnEngine::resolve_turn`].
    pub fn step<R: RngCore>(
        &mut self,
        action: Action,
        rng: &mut R,
    ) -> Result<TurnOutcome, EngineError> {
        self.resolve_turn(self.state.current, action, rng)
    }

    /// Resolve the current player's turn from a raw action code (0 pass, 1 buy).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAction`] for any other code.
    pub fn step_raw<R: RngCore>(
        &mut self,
        action: u8,
        rng: &mut R,
    ) -> Result<TurnOutcome, EngineError> {
        let action = Action::try_from(action)?;
        self.step(action, rng)
    }

    /// Resolve one full turn for `player`.
    ///
    /// Once the episode has ended this is a no-op returning zero reward,
    /// `done = true`, no record and the observation from the final turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlayerOutOfRange`] for an unseated player,
    /// [`EngineError::OutOfTurn`] when `player` is not the current player and
    /// [`EngineError::SquareOutOfRange`] if a position ever leaves the board.
    pub fn resolve_turn<R: RngCore>(
        &mut self,
        player: usize,
        action: Action,
        rng: &mut R,
    ) -> Result<TurnOutcome, EngineError> {
        let snapshot = self
            .state
            .players
            .get(player)
            .cloned()
            .ok_or(EngineError::PlayerOutOfRange {
                player,
                players: self.state.players.len(),
            })?;
        if self.state.done {
            let observation = match self.state.final_observation {
                Some(observation) => observation,
                None => self.observe(player)?,
            };
            return Ok(TurnOutcome {
                observation,
                reward: 0,
                done: true,
                record: None,
            });
        }
        if player != self.state.current {
            return Err(EngineError::OutOfTurn {
                player,
                expected: self.state.current,
            });
        }

        let mut ctx = TurnContext::new(player, action, snapshot);
        let mut phase = if ctx.player.jailed {
            TurnPhase::InJail
        } else {
            TurnPhase::RollingDice
        };
        while phase != TurnPhase::TurnComplete {
            phase = match phase {
                TurnPhase::InJail => self.jail_phase(&mut ctx, rng),
                TurnPhase::RollingDice => self.roll_phase(&mut ctx, rng),
                TurnPhase::Landed => self.landed_phase(&ctx)?,
                TurnPhase::CardResolution => self.card_phase(&mut ctx, rng)?,
                TurnPhase::SquareResolution => self.square_phase(&mut ctx)?,
                TurnPhase::SolvencyCheck => {
                    if ctx.player.cash < 0 {
                        TurnPhase::InsolvencyResolution
                    } else {
                        TurnPhase::TurnComplete
                    }
                }
                TurnPhase::InsolvencyResolution => self.insolvency_phase(&mut ctx)?,
                TurnPhase::TurnComplete => TurnPhase::TurnComplete,
            };
        }
        self.complete_turn(ctx)
    }

    fn jail_phase<R: RngCore>(&self, ctx: &mut TurnContext, rng: &mut R) -> TurnPhase {
        ctx.player.jail_turns = ctx.player.jail_turns.saturating_add(1);
        let (first, second) = roll_dice(rng);
        if first == second {
            ctx.player.jailed = false;
            ctx.player.jail_turns = 0;
            ctx.notes
                .push(format!("Rolled doubles ({first}, {second}) and left jail"));
            return TurnPhase::RollingDice;
        }
        if ctx.player.jail_turns >= self.cfg.jail_turn_limit {
            ctx.charge(self.cfg.jail_fee);
            ctx.player.jailed = false;
            ctx.player.jail_turns = 0;
            ctx.notes
                .push(format!("Paid jail fee {} and left jail", self.cfg.jail_fee));
            return TurnPhase::RollingDice;
        }
        ctx.notes.push(format!(
            "Failed to roll doubles ({first}, {second}), jail turn {} of {}",
            ctx.player.jail_turns, self.cfg.jail_turn_limit
        ));
        TurnPhase::TurnComplete
    }

    fn roll_phase<R: RngCore>(&self, ctx: &mut TurnContext, rng: &mut R) -> TurnPhase {
        let (first, second) = roll_dice(rng);
        let total = first + second;
        let old = ctx.player.position;
        let new = (old + usize::from(total)) % self.cfg.board_size;
        if new < old {
            ctx.player.cash = ctx.player.cash.saturating_add(self.cfg.go_bonus);
            ctx.reward = ctx.reward.saturating_add(self.cfg.go_bonus);
            ctx.notes
                .push(format!("Passed GO, collected {}", self.cfg.go_bonus));
        }
        ctx.dice = total;
        ctx.player.position = new;
        ctx.landed_on = new;
        TurnPhase::Landed
    }

    fn landed_phase(&self, ctx: &TurnContext) -> Result<TurnPhase, EngineError> {
        let square = self.state.board.get_square(ctx.player.position)?;
        Ok(match square.kind {
            SquareKind::Chance | SquareKind::Chest => TurnPhase::CardResolution,
            _ => TurnPhase::SquareResolution,
        })
    }

    fn card_phase<R: RngCore>(
        &self,
        ctx: &mut TurnContext,
        rng: &mut R,
    ) -> Result<TurnPhase, EngineError> {
        let kind = match self.state.board.get_square(ctx.player.position)?.kind {
            SquareKind::Chance => DeckKind::Chance,
            _ => DeckKind::Chest,
        };
        let deck = match kind {
            DeckKind::Chance => &self.cfg.chance_deck,
            DeckKind::Chest => &self.cfg.chest_deck,
        };
        if let Some(card) = cards::draw(deck, rng) {
            let outcome = cards::apply_effect(
                card.effect,
                &ctx.player,
                EffectContext {
                    go_bonus: self.cfg.go_bonus,
                    jail_position: self.cfg.jail_position,
                },
            );
            ctx.player = outcome.player;
            ctx.reward = ctx.reward.saturating_add(outcome.cash_delta);
            ctx.jailed_by_card = outcome.sent_to_jail;
            ctx.notes
                .push(format!("Drew {}: {}", kind.label(), card.name));
            ctx.card = Some(card.name.clone());
            ctx.card_desc = Some(outcome.description);
        }
        Ok(TurnPhase::SquareResolution)
    }

    fn square_phase(&mut self, ctx: &mut TurnContext) -> Result<TurnPhase, EngineError> {
        let pos = ctx.player.position;
        let square = self.state.board.get_square(pos)?.clone();
        match square.kind {
            SquareKind::GoToJail if !ctx.jailed_by_card => {
                ctx.player.position = self.cfg.jail_position;
                ctx.player.jailed = true;
                ctx.player.jail_turns = 0;
                ctx.notes.push(String::from("Sent to jail"));
            }
            SquareKind::Fee { amount } => {
                ctx.charge(amount);
                ctx.notes.push(format!("Paid {} {amount}", square.name));
            }
            SquareKind::Property { price, .. } => match self.state.board.owner_of(pos) {
                None if ctx.player.cash < price => {
                    ctx.purchase = PurchaseOutcome::Unaffordable;
                    ctx.notes
                        .push(format!("Could not afford {} ({price})", square.name));
                }
                None if ctx.action == Action::Buy => {
                    self.state.board.set_owner(pos, ctx.idx)?;
                    ctx.charge(price);
                    ctx.purchase = PurchaseOutcome::Bought;
                    ctx.notes.push(format!("Bought {} for {price}", square.name));
                }
                None => {
                    ctx.purchase = PurchaseOutcome::Declined;
                    ctx.notes.push(format!("Declined {} ({price})", square.name));
                }
                Some(owner) if owner != ctx.idx => {
                    let rent = self.state.board.rent_for(pos)?;
                    let payment = rent.min(ctx.player.cash.max(0));
                    ctx.charge(payment);
                    if let Some(landlord) = self.state.players.get_mut(owner) {
                        landlord.cash = landlord.cash.saturating_add(payment);
                    }
                    ctx.notes.push(format!(
                        "Paid rent {payment} of {rent} to player {owner} for {}",
                        square.name
                    ));
                }
                Some(_) => self.try_improve(ctx, pos, &square.name)?,
            },
            _ => {}
        }
        Ok(TurnPhase::SolvencyCheck)
    }

    fn try_improve(
        &mut self,
        ctx: &mut TurnContext,
        pos: usize,
        name: &str,
    ) -> Result<(), EngineError> {
        if !self.cfg.allow_improvements || ctx.action != Action::Buy {
            return Ok(());
        }
        if !self.state.board.can_improve(pos, ctx.idx, ctx.player.cash) {
            return Ok(());
        }
        let cost = self
            .state
            .board
            .get_square(pos)?
            .improvement_cost()
            .unwrap_or(0);
        let level = self.state.board.add_improvement(pos)?;
        ctx.player.cash = ctx.player.cash.saturating_sub(cost);
        ctx.fees = ctx.fees.saturating_add(cost);
        ctx.purchase = PurchaseOutcome::Improved;
        ctx.notes
            .push(format!("Improved {name} to level {level} for {cost}"));
        Ok(())
    }

    fn insolvency_phase(&mut self, ctx: &mut TurnContext) -> Result<TurnPhase, EngineError> {
        let report = resolve_insolvency(&mut self.state.board, ctx.idx, &mut ctx.player)?;
        if !report.sales.is_empty() || !report.is_solvent() {
            ctx.notes.push(report.describe());
        }
        if !report.is_solvent() {
            self.state.done = true;
            ctx.reward = ctx.reward.saturating_sub(self.cfg.bankruptcy_penalty);
            warn!(
                "episode {} step {}: player {} bankrupt with deficit {}",
                self.state.episode_id, self.state.step, ctx.idx, report.deficit
            );
        }
        Ok(TurnPhase::TurnComplete)
    }

    fn complete_turn(&mut self, ctx: TurnContext) -> Result<TurnOutcome, EngineError> {
        let owned_properties = self.owned_squares(ctx.idx)?;
        let step = self.state.step;
        let record = TurnRecord {
            episode_id: self.state.episode_id,
            step,
            player: ctx.idx,
            position_before: ctx.position_before,
            dice_roll: ctx.dice,
            landed_on_position: ctx.landed_on,
            position_after: ctx.player.position,
            money_before: ctx.money_before,
            money_after: ctx.player.cash,
            reward: ctx.reward,
            done: self.state.done,
            in_jail: ctx.player.jailed,
            fee_paid: ctx.fees,
            agent_action: ctx.action,
            action_desc: if ctx.notes.is_empty() {
                String::from("No action")
            } else {
                ctx.notes.join("; ")
            },
            owned_properties,
            card: ctx.card,
            card_specific_desc: ctx.card_desc,
            purchase: ctx.purchase,
        };
        debug!(
            "episode {} step {step}: player {} {} -> {} cash {} -> {} reward {}",
            record.episode_id,
            record.player,
            record.position_before,
            record.position_after,
            record.money_before,
            record.money_after,
            record.reward
        );

        if let Some(slot) = self.state.players.get_mut(ctx.idx) {
            *slot = ctx.player;
        }
        self.state.step = step.saturating_add(1);
        let observation = if self.state.done {
            let observation = self.observe(ctx.idx)?;
            self.state.final_observation = Some(observation);
            observation
        } else {
            self.state.current = (self.state.current + 1) % self.state.players.len();
            self.observation()?
        };
        Ok(TurnOutcome {
            observation,
            reward: record.reward,
            done: self.state.done,
            record: Some(record),
        })
    }

    fn owned_squares(&self, player: usize) -> Result<OwnedSquares, EngineError> {
        self.state
            .board
            .owned_by(player)
            .into_iter()
            .map(|pos| {
                Ok(OwnedSquare {
                    position: pos,
                    name: self.state.board.get_square(pos)?.name.clone(),
                    level: self.state.board.level_of(pos),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RunRng;

    fn engine() -> TurnEngine {
        TurnEngine::new(Arc::new(GameConfig::default()))
    }

    /// Dice total the next roll from `rng` will produce, without consuming it.
    fn peek_total(rng: &RunRng) -> usize {
        let mut peek = rng.clone();
        let (a, b) = roll_dice(&mut peek);
        usize::from(a + b)
    }

    /// Place the current player so the next roll lands on `target`.
    fn aim(engine: &mut TurnEngine, rng: &RunRng, target: usize) {
        let total = peek_total(rng);
        let current = engine.state().current;
        engine.state_mut().players[current].position = (target + 40 - total) % 40;
    }

    #[test]
    fn action_codes_round_trip() {
        assert_eq!(Action::try_from(0), Ok(Action::Pass));
        assert_eq!(Action::try_from(1), Ok(Action::Buy));
        assert_eq!(
            Action::try_from(2),
            Err(EngineError::InvalidAction { value: 2 })
        );
        assert_eq!(u8::from(Action::Buy), 1);
    }

    #[test]
    fn invalid_callers_are_rejected() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(1);
        assert_eq!(
            engine.resolve_turn(5, Action::Pass, &mut rng),
            Err(EngineError::PlayerOutOfRange {
                player: 5,
                players: 2
            })
        );
        assert_eq!(
            engine.resolve_turn(1, Action::Pass, &mut rng),
            Err(EngineError::OutOfTurn {
                player: 1,
                expected: 0
            })
        );
        assert!(matches!(
            engine.step_raw(7, &mut rng),
            Err(EngineError::InvalidAction { value: 7 })
        ));
    }

    #[test]
    fn turn_advances_pointer_and_step() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(2);
        aim(&mut engine, &rng, 20);
        let outcome = engine.step(Action::Pass, &mut rng).unwrap();
        let record = outcome.record.unwrap();
        assert_eq!(record.position_after, 20);
        assert_eq!(record.step, 0);
        assert_eq!(engine.state().current, 1);
        assert_eq!(engine.state().step, 1);
        assert_eq!(outcome.observation.player, 1);
    }

    #[test]
    fn fee_square_charges_and_counts_fee() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(3);
        aim(&mut engine, &rng, 38);
        let outcome = engine.step(Action::Pass, &mut rng).unwrap();
        let record = outcome.record.unwrap();
        assert_eq!(record.money_after, record.money_before - 100);
        assert_eq!(record.fee_paid, 100);
        assert_eq!(outcome.reward, -100);
    }

    #[test]
    fn go_to_jail_square_jails_player() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(4);
        aim(&mut engine, &rng, 30);
        let record = engine.step(Action::Pass, &mut rng).unwrap().record.unwrap();
        assert_eq!(record.landed_on_position, 30);
        assert_eq!(record.position_after, 10);
        assert!(record.in_jail);
        assert!(engine.state().players[0].jailed);
    }

    #[test]
    fn jail_fee_is_charged_on_final_attempt() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(5);
        // Find a seed offset where the first jail roll is not a double.
        loop {
            let mut peek = rng.clone();
            let (a, b) = roll_dice(&mut peek);
            if a != b {
                break;
            }
            let _ = roll_dice(&mut rng);
        }
        {
            let player = &mut engine.state_mut().players[0];
            player.position = 10;
            player.jailed = true;
            player.jail_turns = 2;
        }
        let record = engine.step(Action::Pass, &mut rng).unwrap().record.unwrap();
        assert_ne!(record.dice_roll, 0);
        assert!(record.fee_paid >= 50);
        assert!(record.reward <= -50 + 200);
        assert!(record.action_desc.contains("Paid jail fee 50"));
    }

    #[test]
    fn failed_jail_attempt_records_zero_dice() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(6);
        loop {
            let mut peek = rng.clone();
            let (a, b) = roll_dice(&mut peek);
            if a != b {
                break;
            }
            let _ = roll_dice(&mut rng);
        }
        {
            let player = &mut engine.state_mut().players[0];
            player.position = 10;
            player.jailed = true;
        }
        let record = engine.step(Action::Buy, &mut rng).unwrap().record.unwrap();
        assert_eq!(record.dice_roll, 0);
        assert_eq!(record.position_after, 10);
        assert!(record.in_jail);
        assert_eq!(record.reward, 0);
        assert_eq!(engine.state().players[0].jail_turns, 1);
    }

    #[test]
    fn leaving_jail_on_doubles_moves_the_same_turn() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(11);
        // Doubles first, then a movement roll that lands on a plain square.
        let total = loop {
            let mut peek = rng.clone();
            let (a, b) = roll_dice(&mut peek);
            let total = peek_total(&peek);
            if a == b && ![12, 17, 22].contains(&(10 + total)) {
                break total;
            }
            let _ = roll_dice(&mut rng);
        };
        {
            let player = &mut engine.state_mut().players[0];
            player.position = 10;
            player.jailed = true;
            player.jail_turns = 1;
        }
        let record = engine.step(Action::Pass, &mut rng).unwrap().record.unwrap();
        assert!(!record.in_jail);
        assert_eq!(usize::from(record.dice_roll), total);
        assert_eq!(record.landed_on_position, 10 + total);
        assert_eq!(record.position_after, 10 + total);
        assert_eq!(record.fee_paid, 0);
        assert_eq!(record.money_after, record.money_before);
        assert!(record.action_desc.starts_with("Rolled doubles"));
        assert!(!engine.state().players[0].jailed);
        assert_eq!(engine.state().players[0].jail_turns, 0);
    }

    #[test]
    fn rent_moves_cash_to_owner_without_rewarding_owner() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(7);
        engine.state_mut().board.set_owner(39, 1).unwrap();
        aim(&mut engine, &rng, 39);
        let outcome = engine.step(Action::Pass, &mut rng).unwrap();
        assert_eq!(outcome.reward, -50);
        assert_eq!(engine.state().players[1].cash, 1550);
    }

    #[test]
    fn improvements_are_opt_in() {
        let cfg = GameConfig {
            allow_improvements: true,
            ..GameConfig::default()
        };
        let mut improving = with_dark_blue(TurnEngine::new(Arc::new(cfg)));
        let mut rng = RunRng::from_user_seed(8);
        aim(&mut improving, &rng, 39);
        let outcome = improving.step(Action::Buy, &mut rng).unwrap();
        let record = outcome.record.unwrap();
        assert_eq!(record.purchase, PurchaseOutcome::Improved);
        assert_eq!(improving.state().board.level_of(39), 1);
        assert_eq!(record.money_after, record.money_before - 200);
        assert_eq!(record.fee_paid, 200);
        assert_eq!(outcome.reward, 0);

        let mut plain = with_dark_blue(engine());
        let mut rng = RunRng::from_user_seed(8);
        aim(&mut plain, &rng, 39);
        let record = plain.step(Action::Buy, &mut rng).unwrap().record.unwrap();
        assert_eq!(record.purchase, PurchaseOutcome::None);
        assert_eq!(plain.state().board.level_of(39), 0);
        assert_eq!(record.money_after, record.money_before);
    }

    fn with_dark_blue(mut engine: TurnEngine) -> TurnEngine {
        engine.state_mut().board.set_owner(37, 0).unwrap();
        engine.state_mut().board.set_owner(39, 0).unwrap();
        engine
    }

    #[test]
    fn bankruptcy_ends_episode_and_later_calls_are_noops() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(9);
        engine.state_mut().players[0].cash = 20;
        aim(&mut engine, &rng, 38);
        let outcome = engine.step(Action::Pass, &mut rng).unwrap();
        assert!(outcome.done);
        let final_observation = outcome.observation;
        assert_eq!(final_observation.player, 0);
        let record = outcome.record.unwrap();
        assert!(record.done);
        assert_eq!(record.money_after, -80);
        assert_eq!(outcome.reward, -100 - 1000);
        assert!(record.action_desc.contains("bankrupt with deficit 80"));
        assert_eq!(engine.state().current, 0);

        let draws = rng.draws();
        let again = engine.resolve_turn(1, Action::Buy, &mut rng).unwrap();
        assert!(again.done);
        assert_eq!(again.reward, 0);
        assert!(again.record.is_none());
        assert_eq!(again.observation, final_observation);
        assert_eq!(rng.draws(), draws);
    }

    #[test]
    fn reset_starts_a_fresh_episode() {
        let mut engine = engine();
        let mut rng = RunRng::from_user_seed(10);
        engine.step(Action::Buy, &mut rng).unwrap();
        let obs = engine.reset(3).unwrap();
        assert_eq!(obs.player, 0);
        assert_eq!(obs.cash, 1500);
        assert_eq!(engine.state().episode_id, 3);
        assert_eq!(engine.state().step, 0);
    }
}
