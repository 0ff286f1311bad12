//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, IterationPolicyArg};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<SearchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<SearchConfig> {
    let config: SearchConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: SearchConfig) -> SearchConfig {
    // Strategy space
    if let Some(weeks) = cli.weeks_ahead {
        config.search.weeks_ahead = weeks;
    }
    if let Some(start) = cli.start_period {
        config.search.start_period = start;
    }
    if let Some(free) = cli.num_free_transfers {
        config.search.num_free_transfers = free;
    }
    if let Some(hit) = cli.max_points_hit {
        config.search.max_points_hit = hit;
    }
    if cli.allow_wildcard {
        config.search.allow_wildcard = true;
    }
    if let Some(season) = cli.season {
        config.search.season = season;
    }

    // Evaluation
    if let Some(ref tag) = cli.tag {
        config.evaluation.tag = Some(tag.clone());
    }
    if let Some(bank) = cli.bank {
        config.evaluation.bank = bank;
    }
    if let Some(iterations) = cli.num_iterations {
        config.evaluation.num_iterations = iterations;
    }
    if cli.exhaustive_double_transfer {
        config.evaluation.exhaustive_double_transfer = true;
    }
    if let Some(policy) = cli.iteration_policy {
        config.evaluation.iteration_policy = match policy {
            IterationPolicyArg::AlwaysFull => IterationPolicy::AlwaysFull,
            IterationPolicyArg::SkipHeavyTransfersUnlessExhaustive => {
                IterationPolicy::SkipHeavyTransfersUnlessExhaustive
            }
        };
    }
    if let Some(threads) = cli.num_thread {
        // 0 means "one worker per CPU"
        config.evaluation.workers = if threads == 0 { num_cpus::get() } else { threads };
    }
    if let Some(ref dir) = cli.output_dir {
        config.evaluation.output_dir = dir.clone();
    }
    if let Some(seed) = cli.seed {
        config.evaluation.seed = seed;
    }

    // Output
    if cli.no_progress {
        config.output.show_progress = false;
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if let Some(ref path) = cli.suggestions_file {
        config.output.suggestions_file = Some(path.clone());
    }

    config
}
