//! stratsweep CLI entry point

use anyhow::{Context, Result};
use std::sync::Arc;
use stratsweep::config::cli::Cli;
use stratsweep::config::toml::{merge_cli_with_config, parse_toml_file};
use stratsweep::config::validator::validate_config;
use stratsweep::config::SearchConfig;
use stratsweep::output::sink::{JsonLinesSink, LogSink, PersistenceSink};
use stratsweep::output::{json, text};
use stratsweep::scoring::simulated::{SimulatedBaseline, SimulatedScorer};
use stratsweep::store::file::{FileResultStore, OutputArea};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    println!("stratsweep v{}", env!("CARGO_PKG_VERSION"));
    println!("Parallel strategy search");
    println!();

    let config = build_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;
    println!("{}", config);

    if cli.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let area = OutputArea::prepare(&config.evaluation.output_dir).context("Failed to prepare output directory")?;
    let store = Arc::new(FileResultStore::new(area));

    let provider = SimulatedBaseline::new(config.evaluation.seed, config.search.start_period);
    let scorer = Arc::new(SimulatedScorer::new(config.evaluation.seed));

    let sink: Box<dyn PersistenceSink> = match config.output.suggestions_file {
        Some(ref path) => Box::new(JsonLinesSink::new(path)),
        None => Box::new(LogSink),
    };

    println!();
    println!("Starting search...");
    println!();

    let report = stratsweep::run_search(&config, store, &provider, scorer, sink.as_ref())?;

    if config.output.show_progress {
        // Move past the live progress line
        println!();
    }
    println!();
    text::print_report(&report);

    if let Some(ref path) = config.output.json_output {
        json::write_summary(path, &report)?;
        println!("JSON summary written to {}", path.display());
    }

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the default level
fn init_tracing(debug: bool) {
    let default_level = if debug { "stratsweep=debug" } else { "stratsweep=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Defaults, then the TOML file if given, then CLI flags
fn build_config(cli: &Cli) -> Result<SearchConfig> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => SearchConfig::default(),
    };
    Ok(merge_cli_with_config(cli, base))
}
