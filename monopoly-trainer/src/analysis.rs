//! Post-run analysis: landing frequencies, buy-rate trend, final balances and
//! a value-table summary.

use monopoly_game::numbers::{i64_to_f64, mean, u64_to_f64, usize_to_f64};
use monopoly_game::{
    Board, EpisodeSummary, EvaluationReport, TurnRecord, TurnSink, ValueEntry, ValueTable,
};
use serde::Serialize;

const TOP_VALUE_ENTRIES: usize = 10;
const HOTTEST_SQUARES: usize = 5;

/// Counts the squares reached by dice rolls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingHistogram {
    counts: Vec<u64>,
    total: u64,
}

impl LandingHistogram {
    pub fn new(board_size: usize) -> Self {
        Self {
            counts: vec![0; board_size],
            total: 0,
        }
    }

    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Share of all landings per square; zeros when nothing was recorded.
    pub fn density(&self) -> Vec<f64> {
        if self.total == 0 {
            return vec![0.0; self.counts.len()];
        }
        let total = u64_to_f64(self.total);
        self.counts
            .iter()
            .map(|&count| u64_to_f64(count) / total)
            .collect()
    }

    /// The `n` most visited squares, ties broken by board order.
    pub fn hottest(&self, n: usize) -> Vec<(usize, u64)> {
        let mut ranked: Vec<(usize, u64)> = self.counts.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

impl TurnSink for LandingHistogram {
    fn record(&mut self, record: &TurnRecord) {
        // Failed jail attempts never move the token.
        if record.dice_roll == 0 {
            return;
        }
        if let Some(count) = self.counts.get_mut(record.landed_on_position) {
            *count += 1;
            self.total += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquareHeat {
    pub position: usize,
    pub name: String,
    pub landings: u64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyRateWindow {
    pub first_episode: u32,
    pub last_episode: u32,
    pub purchases: u32,
    pub declines: u32,
    pub buy_rate: Option<f64>,
}

/// Buy rate over consecutive windows of `window` episodes.
pub fn buy_rate_windows(summaries: &[EpisodeSummary], window: usize) -> Vec<BuyRateWindow> {
    summaries
        .chunks(window.max(1))
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            let purchases: u32 = chunk.iter().map(|s| s.purchases).sum();
            let declines: u32 = chunk.iter().map(|s| s.declines).sum();
            let offers = purchases + declines;
            Some(BuyRateWindow {
                first_episode: first.episode_id,
                last_episode: last.episode_id,
                purchases,
                declines,
                buy_rate: (offers > 0).then(|| f64::from(purchases) / f64::from(offers)),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBalance {
    pub player: usize,
    pub mean: f64,
    pub min: i64,
    pub max: i64,
}

/// Per-seat statistics of the cash held when each episode ended.
pub fn final_balances(summaries: &[EpisodeSummary]) -> Vec<PlayerBalance> {
    let seats = summaries
        .iter()
        .map(|s| s.final_cash.len())
        .max()
        .unwrap_or(0);
    (0..seats)
        .filter_map(|player| {
            let cash: Vec<i64> = summaries
                .iter()
                .filter_map(|s| s.final_cash.get(player).copied())
                .collect();
            let samples: Vec<f64> = cash.iter().copied().map(i64_to_f64).collect();
            Some(PlayerBalance {
                player,
                mean: mean(&samples),
                min: cash.iter().copied().min()?,
                max: cash.iter().copied().max()?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueSummary {
    pub pairs: usize,
    pub states: usize,
    pub total_returns: usize,
    /// Highest-valued entries, best first.
    pub top: Vec<ValueEntry>,
}

impl ValueSummary {
    pub fn from_table(table: &ValueTable) -> Self {
        let mut top = table.snapshot();
        top.sort_by(|a, b| b.value.total_cmp(&a.value));
        top.truncate(TOP_VALUE_ENTRIES);
        Self {
            pairs: table.len(),
            states: table.state_count(),
            total_returns: table.total_returns(),
            top,
        }
    }
}

/// Everything reported for one training seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedAnalysis {
    pub seed: u64,
    pub episodes: usize,
    pub mean_steps: f64,
    pub truncated: usize,
    pub bankruptcies: usize,
    pub rng_draws: u64,
    /// Dice landings recorded across all episodes.
    pub landings: u64,
    pub balances: Vec<PlayerBalance>,
    pub landing_density: Vec<f64>,
    pub hottest_squares: Vec<SquareHeat>,
    pub buy_rate_windows: Vec<BuyRateWindow>,
    pub value_summary: ValueSummary,
    pub evaluation: Option<EvaluationReport>,
    #[serde(skip)]
    pub summaries: Vec<EpisodeSummary>,
}

/// Inputs gathered by a training run.
pub struct RunArtifacts<'a> {
    pub seed: u64,
    pub summaries: Vec<EpisodeSummary>,
    pub histogram: &'a LandingHistogram,
    pub board: &'a Board,
    pub table: &'a ValueTable,
    pub rng_draws: u64,
    pub evaluation: Option<EvaluationReport>,
}

impl SeedAnalysis {
    pub fn build(run: RunArtifacts<'_>, window: usize) -> Self {
        let density = run.histogram.density();
        let hottest_squares = run
            .histogram
            .hottest(HOTTEST_SQUARES)
            .into_iter()
            .filter(|&(_, landings)| landings > 0)
            .map(|(position, landings)| SquareHeat {
                position,
                name: run
                    .board
                    .get_square(position)
                    .map(|square| square.name.clone())
                    .unwrap_or_default(),
                landings,
                density: density.get(position).copied().unwrap_or(0.0),
            })
            .collect();
        let steps: Vec<f64> = run
            .summaries
            .iter()
            .map(|s| f64::from(s.steps))
            .collect();

        Self {
            seed: run.seed,
            episodes: run.summaries.len(),
            mean_steps: mean(&steps),
            truncated: run.summaries.iter().filter(|s| s.truncated).count(),
            bankruptcies: run
                .summaries
                .iter()
                .filter(|s| s.bankrupt_player.is_some())
                .count(),
            rng_draws: run.rng_draws,
            landings: run.histogram.total(),
            balances: final_balances(&run.summaries),
            landing_density: density,
            hottest_squares,
            buy_rate_windows: buy_rate_windows(&run.summaries, window),
            value_summary: ValueSummary::from_table(run.table),
            evaluation: run.evaluation,
            summaries: run.summaries,
        }
    }

    /// Share of episodes that ended in a bankruptcy.
    pub fn bankruptcy_rate(&self) -> f64 {
        if self.episodes == 0 {
            return 0.0;
        }
        usize_to_f64(self.bankruptcies) / usize_to_f64(self.episodes)
    }
}
