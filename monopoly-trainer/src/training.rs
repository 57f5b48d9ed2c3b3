use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use monopoly_game::{MonteCarloLearner, NullSink, RunConfig, TrainingConfig, ValueTable};

use crate::analysis::{LandingHistogram, RunArtifacts, SeedAnalysis};
use crate::sink::{CsvTurnLog, FanOut};
use crate::util::seed_path;

/// Per-seed output switches shared by every run in a sweep.
#[derive(Debug, Clone, Default)]
pub struct SeedRunOptions<'a> {
    pub log_csv: Option<&'a Path>,
    pub q_table: Option<&'a Path>,
    pub multi_seed: bool,
    pub window: usize,
    pub evaluate: u32,
}

/// Train one agent from scratch with `seed` and analyse the run.
pub fn run_seed(config: &RunConfig, seed: u64, opts: &SeedRunOptions<'_>) -> Result<SeedAnalysis> {
    let training = TrainingConfig {
        seed,
        ..config.training.clone()
    };
    let mut learner = MonteCarloLearner::new(config.game.clone(), training)
        .context("invalid run configuration")?;
    let mut histogram = LandingHistogram::new(config.game.board_size);
    let mut csv_log = opts
        .log_csv
        .map(|base| CsvTurnLog::create(&seed_path(base, seed, opts.multi_seed)))
        .transpose()?;

    info!("seed {seed}: training {} episodes", config.training.episodes);
    let summaries = {
        let mut fan = FanOut::new().with(&mut histogram);
        if let Some(log) = csv_log.as_mut() {
            fan = fan.with(log);
        }
        learner
            .train(&mut fan)
            .with_context(|| format!("training failed for seed {seed}"))?
    };

    if let (Some(log), Some(base)) = (csv_log, opts.log_csv) {
        let rows = log.finish()?;
        info!(
            "seed {seed}: wrote {rows} turn records to {}",
            seed_path(base, seed, opts.multi_seed).display()
        );
    }

    let evaluation = if opts.evaluate > 0 {
        Some(
            learner
                .evaluate(opts.evaluate, &mut NullSink)
                .with_context(|| format!("evaluation failed for seed {seed}"))?,
        )
    } else {
        None
    };

    if let Some(base) = opts.q_table {
        export_value_table(learner.table(), &seed_path(base, seed, opts.multi_seed))?;
    }

    Ok(SeedAnalysis::build(
        RunArtifacts {
            seed,
            summaries,
            histogram: &histogram,
            board: &learner.engine().state().board,
            table: learner.table(),
            rng_draws: learner.rng_draws(),
            evaluation,
        },
        opts.window,
    ))
}

/// Write the sorted value-table snapshot as pretty JSON.
pub fn export_value_table(table: &ValueTable, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &table.snapshot())
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(writer)?;
    writer.flush()?;
    info!(
        "exported {} value entries to {}",
        table.len(),
        path.display()
    );
    Ok(())
}
