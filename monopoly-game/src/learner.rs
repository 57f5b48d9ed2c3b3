//! First-visit Monte Carlo control over the shared value table.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::agent::{CompressedState, DecisionAgent, ValueTable};
use crate::config::{GameConfig, TrainingConfig};
use crate::engine::{Action, TurnEngine};
use crate::error::{ConfigError, EngineError};
use crate::numbers::{i64_to_f64, mean};
use crate::record::{PurchaseOutcome, TurnRecord};
use crate::rng::RunRng;

/// Consumer of turn records as they are produced.
pub trait TurnSink {
    fn record(&mut self, record: &TurnRecord);
}

impl TurnSink for Vec<TurnRecord> {
    fn record(&mut self, record: &TurnRecord) {
        self.push(record.clone());
    }
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TurnSink for NullSink {
    fn record(&mut self, _record: &TurnRecord) {}
}

/// One decision in an episode trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeStep {
    pub state: CompressedState,
    pub action: Action,
    pub reward: i64,
}

/// Per-episode totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode_id: u32,
    pub steps: u32,
    pub total_reward: i64,
    pub final_cash: Vec<i64>,
    /// Hit the step ceiling before anyone went bankrupt.
    pub truncated: bool,
    pub bankrupt_player: Option<usize>,
    pub purchases: u32,
    pub declines: u32,
}

impl EpisodeSummary {
    /// Share of affordable purchase offers that were accepted.
    #[must_use]
    pub fn buy_rate(&self) -> Option<f64> {
        let offers = self.purchases + self.declines;
        (offers > 0).then(|| f64::from(self.purchases) / f64::from(offers))
    }
}

/// Aggregate of a greedy evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub episodes: u32,
    pub average_final_cash: f64,
    pub average_steps: f64,
    pub truncated: u32,
    pub bankruptcies: u32,
}

/// Replay `steps` in reverse and record one return per (state, action) pair:
/// the undiscounted return from the pair's first occurrence to the end.
/// Returns the number of returns recorded.
pub fn first_visit_update(table: &mut ValueTable, steps: &[EpisodeStep]) -> usize {
    let mut returns = vec![0.0; steps.len()];
    let mut g = 0.0;
    for (idx, step) in steps.iter().enumerate().rev() {
        g += i64_to_f64(step.reward);
        returns[idx] = g;
    }

    let mut seen = HashSet::new();
    let mut recorded = 0;
    for (step, ret) in steps.iter().zip(returns) {
        if seen.insert((step.state, step.action)) {
            table.record_return(step.state, step.action, ret);
            recorded += 1;
        }
    }
    recorded
}

/// Episode driver binding an engine, an agent and the run RNG.
#[derive(Debug, Clone)]
pub struct MonteCarloLearner {
    engine: TurnEngine,
    agent: DecisionAgent,
    training: TrainingConfig,
    rng: RunRng,
    episodes_run: u32,
}

impl MonteCarloLearner {
    /// Validate both configurations and seed the run RNG from `training.seed`.
    ///
    /// # Errors
    ///
    /// Returns the first violated configuration invariant.
    pub fn new(game: GameConfig, training: TrainingConfig) -> Result<Self, ConfigError> {
        game.validate()?;
        training.validate()?;
        let agent = DecisionAgent::new(&game, training.epsilon);
        let rng = RunRng::from_user_seed(training.seed);
        Ok(Self {
            engine: TurnEngine::new(Arc::new(game)),
            agent,
            training,
            rng,
            episodes_run: 0,
        })
    }

    #[must_use]
    pub const fn agent(&self) -> &DecisionAgent {
        &self.agent
    }

    #[must_use]
    pub const fn table(&self) -> &ValueTable {
        self.agent.table()
    }

    #[must_use]
    pub const fn engine(&self) -> &TurnEngine {
        &self.engine
    }

    #[must_use]
    pub const fn training(&self) -> &TrainingConfig {
        &self.training
    }

    /// Random draws consumed so far.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub const fn episodes_run(&self) -> u32 {
        self.episodes_run
    }

    #[must_use]
    pub fn into_agent(self) -> DecisionAgent {
        self.agent
    }

    /// Play one episode without touching the value table.
    ///
    /// The episode ends on bankruptcy or after `max_steps` turns.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError`] from the turn engine.
    pub fn run_episode(
        &mut self,
        sink: &mut dyn TurnSink,
    ) -> Result<(Vec<EpisodeStep>, EpisodeSummary), EngineError> {
        let episode_id = self.episodes_run;
        self.episodes_run = self.episodes_run.saturating_add(1);
        let mut obs = self.engine.reset(episode_id)?;
        let mut steps = Vec::new();
        let mut summary = EpisodeSummary {
            episode_id,
            steps: 0,
            total_reward: 0,
            final_cash: Vec::new(),
            truncated: false,
            bankrupt_player: None,
            purchases: 0,
            declines: 0,
        };

        while !self.engine.is_done() {
            if summary.steps >= self.training.max_steps {
                summary.truncated = true;
                debug!("episode {episode_id} truncated at {} steps", summary.steps);
                break;
            }
            let state = self.agent.compress(&obs);
            let action = self
                .agent
                .choose(&state, &obs, &self.engine.state().board, &mut self.rng);
            let outcome = self.engine.step(action, &mut self.rng)?;
            if let Some(record) = &outcome.record {
                sink.record(record);
                match record.purchase {
                    PurchaseOutcome::Bought => summary.purchases += 1,
                    PurchaseOutcome::Declined => summary.declines += 1,
                    _ => {}
                }
                if record.done {
                    summary.bankrupt_player = Some(record.player);
                }
            }
            steps.push(EpisodeStep {
                state,
                action,
                reward: outcome.reward,
            });
            summary.steps += 1;
            summary.total_reward = summary.total_reward.saturating_add(outcome.reward);
            obs = outcome.observation;
        }

        summary.final_cash = self
            .engine
            .state()
            .players
            .iter()
            .map(|player| player.cash)
            .collect();
        Ok((steps, summary))
    }

    /// Run `training.episodes` episodes, updating the table after each.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError`] from the turn engine.
    pub fn train(&mut self, sink: &mut dyn TurnSink) -> Result<Vec<EpisodeSummary>, EngineError> {
        let total = self.training.episodes;
        let interval = self.training.progress_interval.max(1);
        let mut summaries = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
        let mut truncated = 0u32;
        for n in 1..=total {
            let (steps, summary) = self.run_episode(sink)?;
            first_visit_update(self.agent.table_mut(), &steps);
            truncated += u32::from(summary.truncated);
            summaries.push(summary);
            if n % interval == 0 || n == total {
                info!(
                    "episode {n}/{total}: {} value pairs over {} states, {truncated} truncated",
                    self.agent.table().len(),
                    self.agent.table().state_count()
                );
            }
        }
        Ok(summaries)
    }

    /// Play `episodes` greedy episodes (no exploration) without learning.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError`] from the turn engine.
    pub fn evaluate(
        &mut self,
        episodes: u32,
        sink: &mut dyn TurnSink,
    ) -> Result<EvaluationReport, EngineError> {
        let epsilon = self.agent.epsilon();
        self.agent.set_epsilon(0.0);
        let result = self.play_greedy(episodes, sink);
        self.agent.set_epsilon(epsilon);
        let report = result?;
        info!(
            "greedy evaluation over {episodes} episodes: mean cash {:.1}, {} truncated, {} bankrupt",
            report.average_final_cash, report.truncated, report.bankruptcies
        );
        Ok(report)
    }

    fn play_greedy(
        &mut self,
        episodes: u32,
        sink: &mut dyn TurnSink,
    ) -> Result<EvaluationReport, EngineError> {
        let mut cash = Vec::new();
        let mut steps = Vec::new();
        let mut truncated = 0;
        let mut bankruptcies = 0;
        for _ in 0..episodes {
            let (_, summary) = self.run_episode(sink)?;
            cash.extend(summary.final_cash.iter().copied().map(i64_to_f64));
            steps.push(f64::from(summary.steps));
            truncated += u32::from(summary.truncated);
            bankruptcies += u32::from(summary.bankrupt_player.is_some());
        }
        Ok(EvaluationReport {
            episodes,
            average_final_cash: mean(&cash),
            average_steps: mean(&steps),
            truncated,
            bankruptcies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(position: usize) -> CompressedState {
        CompressedState {
            position,
            cash_bucket: 15,
            square_owner: None,
            jailed: false,
        }
    }

    fn step(position: usize, action: Action, reward: i64) -> EpisodeStep {
        EpisodeStep {
            state: state(position),
            action,
            reward,
        }
    }

    #[test]
    fn first_visit_records_return_from_first_occurrence() {
        let steps = [
            step(1, Action::Pass, 10),
            step(2, Action::Pass, -5),
            step(3, Action::Buy, 20),
            step(4, Action::Pass, -10),
            step(3, Action::Buy, 5),
        ];
        let mut table = ValueTable::new();
        let recorded = first_visit_update(&mut table, &steps);
        assert_eq!(recorded, 4);
        assert_eq!(table.returns(&state(3), Action::Buy), &[15.0]);
        assert_eq!(table.returns(&state(1), Action::Pass), &[20.0]);
        assert_eq!(table.returns(&state(4), Action::Pass), &[-5.0]);
    }

    #[test]
    fn values_average_across_episodes() {
        let mut table = ValueTable::new();
        first_visit_update(&mut table, &[step(1, Action::Buy, 10)]);
        first_visit_update(&mut table, &[step(1, Action::Buy, -30)]);
        assert!((table.value(&state(1), Action::Buy) + 10.0).abs() < f64::EPSILON);
        assert_eq!(table.total_returns(), 2);
    }

    #[test]
    fn episodes_stop_at_the_step_ceiling() {
        let training = TrainingConfig {
            max_steps: 25,
            episodes: 1,
            ..TrainingConfig::default()
        };
        let mut learner = MonteCarloLearner::new(GameConfig::default(), training).unwrap();
        let mut sink = Vec::new();
        let (steps, summary) = learner.run_episode(&mut sink).unwrap();
        assert!(steps.len() <= 25);
        assert_eq!(sink.len(), steps.len());
        assert_eq!(summary.steps as usize, steps.len());
        assert_eq!(summary.truncated, summary.bankrupt_player.is_none());
        assert!(learner.table().is_empty());
    }

    #[test]
    fn training_populates_the_table() {
        let training = TrainingConfig {
            episodes: 5,
            max_steps: 100,
            epsilon: 0.3,
            ..TrainingConfig::default()
        };
        let mut learner = MonteCarloLearner::new(GameConfig::default(), training).unwrap();
        let summaries = learner.train(&mut NullSink).unwrap();
        assert_eq!(summaries.len(), 5);
        assert!(!learner.table().is_empty());
        assert_eq!(learner.episodes_run(), 5);
        let ids: Vec<u32> = summaries.iter().map(|s| s.episode_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn evaluation_leaves_table_and_epsilon_untouched() {
        let training = TrainingConfig {
            episodes: 3,
            max_steps: 60,
            ..TrainingConfig::default()
        };
        let mut learner = MonteCarloLearner::new(GameConfig::default(), training).unwrap();
        learner.train(&mut NullSink).unwrap();
        let before = learner.table().clone();
        let report = learner.evaluate(4, &mut NullSink).unwrap();
        assert_eq!(report.episodes, 4);
        assert!(report.average_steps <= 60.0);
        assert_eq!(learner.table(), &before);
        assert!((learner.agent().epsilon() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_training_config_is_rejected() {
        let training = TrainingConfig {
            epsilon: -0.5,
            ..TrainingConfig::default()
        };
        assert!(MonteCarloLearner::new(GameConfig::default(), training).is_err());
    }

    #[test]
    fn buy_rate_ignores_episodes_without_offers() {
        let mut summary = EpisodeSummary {
            episode_id: 0,
            steps: 0,
            total_reward: 0,
            final_cash: vec![],
            truncated: true,
            bankrupt_player: None,
            purchases: 0,
            declines: 0,
        };
        assert!(summary.buy_rate().is_none());
        summary.purchases = 3;
        summary.declines = 1;
        assert_eq!(summary.buy_rate(), Some(0.75));
    }
}
