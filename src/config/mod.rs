//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::strategy::generator::GeneratorParams;
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete search configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub search: SearchParams,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters of the strategy space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// How many periods ahead to plan
    #[serde(default = "default_weeks_ahead")]
    pub weeks_ahead: u32,
    /// First period of the plan
    #[serde(default = "default_start_period")]
    pub start_period: u32,
    /// Free transfers available in the first period
    #[serde(default = "default_free_transfers")]
    pub num_free_transfers: u32,
    /// Points we are prepared to lose on transfers
    #[serde(default = "default_max_points_hit")]
    pub max_points_hit: u32,
    /// Include a wildcard in one of the periods
    #[serde(default)]
    pub allow_wildcard: bool,
    /// Season, in format e.g. 2425
    #[serde(default = "default_season")]
    pub season: u32,
}

fn default_weeks_ahead() -> u32 {
    3
}

fn default_start_period() -> u32 {
    1
}

fn default_free_transfers() -> u32 {
    1
}

fn default_max_points_hit() -> u32 {
    4
}

fn default_season() -> u32 {
    2425
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            weeks_ahead: default_weeks_ahead(),
            start_period: default_start_period(),
            num_free_transfers: default_free_transfers(),
            max_points_hit: default_max_points_hit(),
            allow_wildcard: false,
            season: default_season(),
        }
    }
}

impl SearchParams {
    /// Generator inputs derived from these parameters
    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            start_period: self.start_period,
            horizon: self.weeks_ahead,
            free_transfers: self.num_free_transfers,
            max_points_hit: self.max_points_hit,
            allow_wildcard: self.allow_wildcard,
        }
    }
}

/// How many scorer iterations a strategy gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IterationPolicy {
    /// Always use the configured iteration count
    AlwaysFull,
    /// One iteration unless a period makes 3+ transfers or exhaustive mode is on
    SkipHeavyTransfersUnlessExhaustive,
}

impl Default for IterationPolicy {
    fn default() -> Self {
        Self::AlwaysFull
    }
}

impl IterationPolicy {
    /// Iterations to request from the scorer for `strategy`
    pub fn iterations_for(&self, strategy: &Strategy, configured: u64, exhaustive_double_transfer: bool) -> u64 {
        match self {
            Self::AlwaysFull => configured,
            Self::SkipHeavyTransfersUnlessExhaustive => {
                if strategy.involves_n_or_more_transfers(HEAVY_TRANSFER_COUNT) || exhaustive_double_transfer {
                    configured
                } else {
                    1
                }
            }
        }
    }
}

/// Transfers in one period from which a strategy always gets full iterations
pub const HEAVY_TRANSFER_COUNT: u8 = 3;

impl fmt::Display for IterationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysFull => write!(f, "always-full"),
            Self::SkipHeavyTransfersUnlessExhaustive => {
                write!(f, "skip-heavy-transfers-unless-exhaustive")
            }
        }
    }
}

/// Worker pool and scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Scorer iterations per strategy
    #[serde(default = "default_num_iterations")]
    pub num_iterations: u64,
    /// Exhaustive search when doing two transfers in a period
    #[serde(default)]
    pub exhaustive_double_transfer: bool,
    #[serde(default)]
    pub iteration_policy: IterationPolicy,
    /// Money in the bank (multiplied by 10), passed to the scorer as its transfer budget
    #[serde(default)]
    pub bank: u32,
    /// Prediction set tag (the baseline's latest tag when absent)
    pub tag: Option<String>,
    /// Directory holding one result file per evaluated strategy
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Seed for the simulated scorer
    #[serde(default)]
    pub seed: u64,
}

fn default_workers() -> usize {
    4
}

fn default_num_iterations() -> u64 {
    100
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("stratsweep")
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            num_iterations: default_num_iterations(),
            exhaustive_double_transfer: false,
            iteration_policy: IterationPolicy::default(),
            bank: 0,
            tag: None,
            output_dir: default_output_dir(),
            seed: 0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Render live per-worker progress
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    /// Progress refresh interval (milliseconds)
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// JSON run summary path
    pub json_output: Option<PathBuf>,
    /// File receiving one suggestion record per run
    pub suggestions_file: Option<PathBuf>,
}

fn default_show_progress() -> bool {
    true
}

fn default_progress_interval_ms() -> u64 {
    500
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_progress: default_show_progress(),
            progress_interval_ms: default_progress_interval_ms(),
            json_output: None,
            suggestions_file: None,
        }
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search:")?;
        writeln!(f, "  Weeks ahead: {} (from period {})", self.search.weeks_ahead, self.search.start_period)?;
        writeln!(f, "  Free transfers: {}", self.search.num_free_transfers)?;
        writeln!(f, "  Max points hit: {}", self.search.max_points_hit)?;
        writeln!(f, "  Wildcard: {}", self.search.allow_wildcard)?;
        writeln!(f, "  Season: {}", self.search.season)?;
        writeln!(f, "Evaluation:")?;
        writeln!(f, "  Workers: {}", self.evaluation.workers)?;
        writeln!(f, "  Iterations: {}", self.evaluation.num_iterations)?;
        writeln!(f, "  Exhaustive double transfer: {}", self.evaluation.exhaustive_double_transfer)?;
        writeln!(f, "  Iteration policy: {}", self.evaluation.iteration_policy)?;
        writeln!(f, "  Bank: {:.1}", f64::from(self.evaluation.bank) / 10.0)?;
        write!(f, "  Output dir: {}", self.evaluation.output_dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.search.weeks_ahead, 3);
        assert_eq!(config.search.max_points_hit, 4);
        assert_eq!(config.evaluation.workers, 4);
        assert_eq!(config.evaluation.num_iterations, 100);
        assert_eq!(config.evaluation.iteration_policy, IterationPolicy::AlwaysFull);
        assert_eq!(config.evaluation.bank, 0);
        assert!(config.output.show_progress);
    }

    #[test]
    fn test_generator_params() {
        let mut params = SearchParams::default();
        params.weeks_ahead = 5;
        params.allow_wildcard = true;
        let gen = params.generator_params();
        assert_eq!(gen.horizon, 5);
        assert!(gen.allow_wildcard);
        assert_eq!(gen.free_transfers, 1);
    }

    #[test]
    fn test_always_full_policy() {
        let strat = Strategy::parse(1, "1-0").unwrap();
        let policy = IterationPolicy::AlwaysFull;
        assert_eq!(policy.iterations_for(&strat, 100, false), 100);
        assert_eq!(policy.iterations_for(&strat, 100, true), 100);
    }

    #[test]
    fn test_skip_heavy_policy() {
        let policy = IterationPolicy::SkipHeavyTransfersUnlessExhaustive;
        let light = Strategy::parse(1, "1-2-0").unwrap();
        let heavy = Strategy::parse(1, "0-3").unwrap();
        let wildcard = Strategy::parse(1, "W-0").unwrap();

        assert_eq!(policy.iterations_for(&light, 100, false), 1);
        assert_eq!(policy.iterations_for(&light, 100, true), 100);
        assert_eq!(policy.iterations_for(&heavy, 100, false), 100);
        assert_eq!(policy.iterations_for(&wildcard, 100, false), 100);
    }

    #[test]
    fn test_display_shows_bank() {
        let mut config = SearchConfig::default();
        config.evaluation.bank = 15;
        assert!(config.to_string().contains("Bank: 1.5"));
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(IterationPolicy::AlwaysFull.to_string(), "always-full");
        assert_eq!(
            IterationPolicy::SkipHeavyTransfersUnlessExhaustive.to_string(),
            "skip-heavy-transfers-unless-exhaustive"
        );
    }
}
