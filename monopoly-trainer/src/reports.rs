use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::analysis::SeedAnalysis;
use crate::util::report_timestamp;

fn percent(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |rate| format!("{:.1}%", rate * 100.0))
}

pub fn generate_console_report(
    out: &mut dyn Write,
    analyses: &[SeedAnalysis],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Training Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===================".cyan())?;
    writeln!(out, "Generated: {}", report_timestamp())?;
    writeln!(out, "Seeds: {}", analyses.len())?;
    writeln!(out, "Training time: {total_duration:?}")?;
    writeln!(out)?;

    for analysis in analyses {
        writeln!(out, "{} {}", "🎲 Seed".bold(), analysis.seed.to_string().bold())?;
        writeln!(
            out,
            "   Episodes: {} (mean {:.1} turns, {} truncated, {} bankruptcies)",
            analysis.episodes, analysis.mean_steps, analysis.truncated, analysis.bankruptcies
        )?;
        writeln!(
            out,
            "   Random draws: {}, dice landings: {}",
            analysis.rng_draws, analysis.landings
        )?;

        writeln!(out, "   Final balances:")?;
        for balance in &analysis.balances {
            writeln!(
                out,
                "     • player {}: mean {:.1}, min {}, max {}",
                balance.player, balance.mean, balance.min, balance.max
            )?;
        }

        if !analysis.hottest_squares.is_empty() {
            writeln!(out, "   Most landed squares:")?;
            for heat in &analysis.hottest_squares {
                writeln!(
                    out,
                    "     • {:>2} {:<24} {:>6} ({:.2}%)",
                    heat.position,
                    heat.name,
                    heat.landings,
                    heat.density * 100.0
                )?;
            }
        }

        if let (Some(first), Some(last)) = (
            analysis.buy_rate_windows.first(),
            analysis.buy_rate_windows.last(),
        ) {
            writeln!(
                out,
                "   Buy rate: {} → {} over {} window(s)",
                percent(first.buy_rate).yellow(),
                percent(last.buy_rate).green(),
                analysis.buy_rate_windows.len()
            )?;
        }

        let values = &analysis.value_summary;
        writeln!(
            out,
            "   Value table: {} pairs over {} states ({} returns)",
            values.pairs, values.states, values.total_returns
        )?;
        if let Some(best) = values.top.first() {
            writeln!(
                out,
                "   Best pair: square {} bucket {} {} → {:.1}",
                best.state.position,
                best.state.cash_bucket,
                best.action.label(),
                best.value
            )?;
        }

        if let Some(eval) = &analysis.evaluation {
            writeln!(
                out,
                "   {} {} episodes, mean cash {:.1}, mean turns {:.1}, {} truncated, {} bankrupt",
                "Greedy evaluation:".bright_green(),
                eval.episodes,
                eval.average_final_cash,
                eval.average_steps,
                eval.truncated,
                eval.bankruptcies
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    seeds: &'a [SeedAnalysis],
}

pub fn generate_json_report(out: &mut dyn Write, analyses: &[SeedAnalysis]) -> Result<()> {
    let report = JsonReport {
        generated_at: report_timestamp(),
        seeds: analyses,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, analyses: &[SeedAnalysis]) -> Result<()> {
    writeln!(out, "# Monopoly Training Report\n")?;
    writeln!(out, "_Generated {}_\n", report_timestamp())?;

    writeln!(out, "## Summary\n")?;
    writeln!(
        out,
        "| Seed | Episodes | Mean turns | Truncated | Bankruptcy rate | Value pairs |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for analysis in analyses {
        writeln!(
            out,
            "| {} | {} | {:.1} | {} | {:.1}% | {} |",
            analysis.seed,
            analysis.episodes,
            analysis.mean_steps,
            analysis.truncated,
            analysis.bankruptcy_rate() * 100.0,
            analysis.value_summary.pairs
        )?;
    }
    writeln!(out)?;

    for analysis in analyses {
        writeln!(out, "## Seed {}\n", analysis.seed)?;

        writeln!(out, "### Final balances\n")?;
        for balance in &analysis.balances {
            writeln!(
                out,
                "- **Player {}**: mean {:.1}, min {}, max {}",
                balance.player, balance.mean, balance.min, balance.max
            )?;
        }
        writeln!(out)?;

        writeln!(out, "### Buy rate by window\n")?;
        writeln!(out, "| Episodes | Bought | Declined | Rate |")?;
        writeln!(out, "|---|---|---|---|")?;
        for window in &analysis.buy_rate_windows {
            writeln!(
                out,
                "| {}-{} | {} | {} | {} |",
                window.first_episode,
                window.last_episode,
                window.purchases,
                window.declines,
                percent(window.buy_rate)
            )?;
        }
        writeln!(out)?;

        if !analysis.hottest_squares.is_empty() {
            writeln!(out, "### Most landed squares\n")?;
            for heat in &analysis.hottest_squares {
                writeln!(
                    out,
                    "- {} (square {}): {} landings, {:.2}%",
                    heat.name,
                    heat.position,
                    heat.landings,
                    heat.density * 100.0
                )?;
            }
            writeln!(out)?;
        }

        if let Some(eval) = &analysis.evaluation {
            writeln!(out, "### Greedy evaluation\n")?;
            writeln!(out, "- **Episodes**: {}", eval.episodes)?;
            writeln!(out, "- **Mean final cash**: {:.1}", eval.average_final_cash)?;
            writeln!(out, "- **Mean turns**: {:.1}", eval.average_steps)?;
            writeln!(out, "- **Truncated**: {}", eval.truncated)?;
            writeln!(out, "- **Bankruptcies**: {}\n", eval.bankruptcies)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct EpisodeRow {
    seed: u64,
    episode_id: u32,
    steps: u32,
    total_reward: i64,
    truncated: bool,
    bankrupt_player: Option<usize>,
    purchases: u32,
    declines: u32,
    buy_rate: Option<f64>,
    final_cash: String,
}

/// One row per training episode across all seeds.
pub fn generate_csv_report(out: &mut dyn Write, analyses: &[SeedAnalysis]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for analysis in analyses {
        for summary in &analysis.summaries {
            writer.serialize(EpisodeRow {
                seed: analysis.seed,
                episode_id: summary.episode_id,
                steps: summary.steps,
                total_reward: summary.total_reward,
                truncated: summary.truncated,
                bankrupt_player: summary.bankrupt_player,
                purchases: summary.purchases,
                declines: summary.declines,
                buy_rate: summary.buy_rate(),
                final_cash: summary
                    .final_cash
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(";"),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
