mod analysis;
mod reports;
mod seeds;
mod sink;
mod training;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use analysis::SeedAnalysis;
use monopoly_game::RunConfig;
use seeds::resolve_seed_inputs;
use training::{SeedRunOptions, run_seed};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "monopoly-trainer", version = "0.1.0")]
#[command(about = "Train a Monte Carlo buy/pass agent on a simplified Monopoly board")]
struct Args {
    /// JSON run configuration with optional `game` and `training` sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training episodes per seed
    #[arg(long)]
    episodes: Option<u32>,

    /// Exploration rate in [0, 1]
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seeds to train (comma-separated, ranges like 1..5 allowed)
    #[arg(long)]
    seeds: Option<String>,

    /// Number of players at the table
    #[arg(long)]
    players: Option<usize>,

    /// Starting cash per player
    #[arg(long)]
    start_cash: Option<i64>,

    /// Cash credited for passing or landing on GO
    #[arg(long)]
    go_bonus: Option<i64>,

    /// Turn ceiling per episode
    #[arg(long)]
    max_steps: Option<u32>,

    /// Let players buy improvements on complete color groups
    #[arg(long)]
    improvements: bool,

    /// Write every turn record to this CSV file (suffixed per seed)
    #[arg(long)]
    log_csv: Option<PathBuf>,

    /// Export the learned value table as JSON (suffixed per seed)
    #[arg(long)]
    q_table: Option<PathBuf>,

    /// Greedy evaluation episodes played after training
    #[arg(long, default_value_t = 0)]
    evaluate: u32,

    /// Episodes per buy-rate window
    #[arg(long, default_value_t = 500)]
    window: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output (progress logging at info level)
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    announce_banner();

    let config = build_run_config(&args)?;
    let seeds = resolve_seeds(&args, &config)?;
    let start_time = Instant::now();
    let analyses = run_seeds(&args, &config, &seeds)?;

    write_reports(&args, &analyses, start_time)?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn announce_banner() {
    println!("{}", "🎩 Monopoly Monte Carlo Trainer".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

/// Config file first, then command-line overrides.
fn build_run_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RunConfig::from_json(&text)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if let Some(epsilon) = args.epsilon {
        config.training.epsilon = epsilon;
    }
    if let Some(max_steps) = args.max_steps {
        config.training.max_steps = max_steps;
    }
    if let Some(players) = args.players {
        config.game.num_players = players;
    }
    if let Some(start_cash) = args.start_cash {
        config.game.start_cash = start_cash;
    }
    if let Some(go_bonus) = args.go_bonus {
        config.game.go_bonus = go_bonus;
    }
    if args.improvements {
        config.game.allow_improvements = true;
    }

    config.validate().context("invalid run configuration")?;
    Ok(config)
}

fn resolve_seeds(args: &Args, config: &RunConfig) -> Result<Vec<u64>> {
    match &args.seeds {
        Some(seeds) => resolve_seed_inputs(&split_csv(seeds)),
        None => Ok(vec![config.training.seed]),
    }
}

fn run_seeds(args: &Args, config: &RunConfig, seeds: &[u64]) -> Result<Vec<SeedAnalysis>> {
    println!(
        "{}",
        format!(
            "🧠 Training {} episode(s) on {} seed(s)",
            config.training.episodes,
            seeds.len()
        )
        .bright_yellow()
        .bold()
    );
    println!("{}", "-".repeat(30).yellow());

    let opts = SeedRunOptions {
        log_csv: args.log_csv.as_deref(),
        q_table: args.q_table.as_deref(),
        multi_seed: seeds.len() > 1,
        window: args.window,
        evaluate: args.evaluate,
    };

    let mut analyses = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        let seed_start = Instant::now();
        let analysis = run_seed(config, seed, &opts)?;
        println!(
            "✅ [seed {}] {} episodes, {} value pairs - {:?}",
            seed.to_string().green(),
            analysis.episodes,
            analysis.value_summary.pairs,
            seed_start.elapsed()
        );
        analyses.push(analysis);
    }
    Ok(analyses)
}

fn write_reports(args: &Args, analyses: &[SeedAnalysis], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, analyses)?,
        "markdown" => {
            if analyses.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Monopoly Training Report\n\n_No seeds trained._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, analyses)?;
            }
        }
        "csv" => reports::generate_csv_report(&mut output_target, analyses)?,
        _ => {
            let duration = start_time.elapsed();
            if analyses.is_empty() {
                writeln!(&mut output_target, "No seeds trained.")?;
            } else {
                reports::generate_console_report(&mut output_target, analyses, duration)?;
            }
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
