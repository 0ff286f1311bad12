//! Human-readable text output

use crate::coordinator::SearchReport;
use crate::scoring::PlayerId;
use crate::stats::RunStats;
use crate::util::time::{format_duration, format_rate};
use std::collections::BTreeSet;

/// Print the search report to the console
///
/// Shows the baseline, the winning strategy with its per-period breakdown,
/// and how the evaluation went: counts, throughput, evaluation times and the
/// per-worker split.
pub fn print_report(report: &SearchReport) {
    let outcome = &report.outcome;

    println!("═══════════════════════════════════════════════════════════");
    println!("                    SEARCH RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Run tag:        {}", outcome.run_tag);
    println!("Season:         {}", report.season);
    println!("Baseline score: {:.2}", report.baseline_score);
    println!();

    match outcome.best {
        Some(ref best) => {
            let gain = best.result.total_score - report.baseline_score;
            println!("Best strategy:  {}", best.strategy_id);
            println!("Best score:     {:.2} ({:+.2} vs baseline)", best.result.total_score, gain);
            println!();

            if !best.result.score_per_period.is_empty() {
                println!("Per period:");
                for (period, score) in &best.result.score_per_period {
                    println!("  Period {:>3}: {:>7.2}", period, score);
                    if let Some(sold) = best.result.sold_per_period.get(period) {
                        println!("    Sold:   {}", format_players(sold));
                    }
                    if let Some(bought) = best.result.bought_per_period.get(period) {
                        println!("    Bought: {}", format_players(bought));
                    }
                }
                println!();
            }
        }
        None => {
            println!("No strategy scored above zero; keep the baseline.");
            println!();
        }
    }

    print_stats(&outcome.stats, outcome.queued, outcome.lost());

    println!("═══════════════════════════════════════════════════════════");
}

fn print_stats(stats: &RunStats, queued: usize, lost: usize) {
    println!("Evaluation:");
    println!("  Queued:     {}", queued);
    println!("  Evaluated:  {}", stats.evaluated);
    if stats.failed > 0 {
        println!("  Failed:     {}", stats.failed);
    }
    if lost > 0 {
        println!("  Lost:       {}", lost);
    }
    println!("  Elapsed:    {}", format_duration(stats.elapsed));
    println!("  Throughput: {} strategies/s", format_rate(stats.throughput()));
    println!();

    let times = &stats.evaluation_times;
    println!("Evaluation time:");
    match (times.min(), times.mean(), times.max()) {
        (Some(min), Some(mean), Some(max)) => {
            println!("  Min:    {}", format_duration(min));
            println!("  Mean:   {}", format_duration(mean));
            println!("  Max:    {}", format_duration(max));
            println!();
            println!("  Percentiles:");
            for &p in &[50.0, 90.0, 99.0] {
                if let Some(val) = times.percentile(p) {
                    println!("    p{:<4}: {}", p, format_duration(val));
                }
            }
        }
        _ => println!("  No evaluations completed"),
    }
    println!();

    if stats.per_worker.len() > 1 {
        println!("Workers:");
        for w in &stats.per_worker {
            println!("  #{:<3} evaluated {:>6}  failed {:>4}", w.worker_index, w.evaluated, w.failed);
        }
        println!();
    }
}

/// Comma-separated player ids
fn format_players(players: &BTreeSet<PlayerId>) -> String {
    players
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_players() {
        let players: BTreeSet<PlayerId> = [12, 3, 7].into_iter().collect();
        assert_eq!(format_players(&players), "3, 7, 12");
        assert_eq!(format_players(&BTreeSet::new()), "");
    }
}
