//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Iteration policy selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IterationPolicyArg {
    /// Always run the configured number of iterations
    AlwaysFull,
    /// Run a single iteration unless a period makes 3+ transfers or exhaustive mode is on
    SkipHeavyTransfersUnlessExhaustive,
}

/// stratsweep - try different transfer strategies in parallel
#[derive(Parser, Debug)]
#[command(name = "stratsweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Strategy space ===
    /// How many weeks ahead
    #[arg(long)]
    pub weeks_ahead: Option<u32>,

    /// First period of the plan
    #[arg(long)]
    pub start_period: Option<u32>,

    /// How many free transfers do we have
    #[arg(long)]
    pub num_free_transfers: Option<u32>,

    /// How many points are we prepared to lose on transfers
    #[arg(long)]
    pub max_points_hit: Option<u32>,

    /// Include possibility of wildcarding in one of the weeks
    #[arg(long)]
    pub allow_wildcard: bool,

    /// How much money do we have in the bank (multiplied by 10)
    #[arg(long)]
    pub bank: Option<u32>,

    /// What season, in format e.g. 2425
    #[arg(long)]
    pub season: Option<u32>,

    // === Evaluation ===
    /// String identifying the prediction set
    #[arg(long, env = "STRATSWEEP_TAG")]
    pub tag: Option<String>,

    /// How many trials to run per strategy
    #[arg(long)]
    pub num_iterations: Option<u64>,

    /// Use exhaustive search when doing 2 transfers in a week
    #[arg(long)]
    pub exhaustive_double_transfer: bool,

    /// How many scorer iterations a strategy gets
    #[arg(long, value_enum)]
    pub iteration_policy: Option<IterationPolicyArg>,

    /// How many worker threads to use (0 = number of CPUs)
    #[arg(short = 't', long = "num-thread")]
    pub num_thread: Option<usize>,

    /// Directory for per-strategy result files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Seed for the simulated scorer
    #[arg(long)]
    pub seed: Option<u64>,

    // === Output ===
    /// Disable live progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Append the winning suggestion to this file
    #[arg(long)]
    pub suggestions_file: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
