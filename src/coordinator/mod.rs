//! Coordinator module
//!
//! Orchestrates the worker pool and aggregates results.
//!
//! # Lifecycle
//!
//! 1. Load the task queue with every strategy plus one termination marker per worker
//! 2. Start the progress tracker and N worker threads
//! 3. Join every worker, then the tracker
//! 4. Run the aggregator over the run tag's stored results
//!
//! The aggregator never starts before every worker has joined, so it cannot
//! delete entries while a worker is still writing for the same run tag.
//!
//! [`run_search`] wraps this with strategy generation, the baseline fetch and
//! persistence of the winner.

pub mod queue;

use crate::config::{EvaluationConfig, SearchConfig};
use crate::output::sink::PersistenceSink;
use crate::progress::{ProgressReporter, ProgressSummary, ProgressTracker};
use crate::scoring::{BaselineProvider, Scorer};
use crate::stats::RunStats;
use crate::store::{aggregator, ResultStore, RunTag, ScoredStrategy};
use crate::strategy::generator::generate_strategies;
use crate::strategy::Strategy;
use crate::worker::Worker;
use crate::Result;
use anyhow::Context;
use queue::TaskQueue;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Fatal errors that stop a search before any worker starts
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("strategy generator produced no strategies")]
    EmptyStrategySpace,
    #[error("failed to fetch baseline for run tag {run_tag}: {reason}")]
    Baseline { run_tag: String, reason: String },
}

/// Result of evaluating one batch of strategies
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_tag: RunTag,
    /// Strategies put on the queue
    pub queued: usize,
    /// Best strictly positive result, if any
    pub best: Option<ScoredStrategy>,
    pub stats: RunStats,
    pub progress: ProgressSummary,
}

impl RunOutcome {
    /// Strategies that never produced a result
    ///
    /// Counted from progress events, which survive a worker thread that dies
    /// and takes its report with it.
    pub fn lost(&self) -> usize {
        self.queued.saturating_sub(self.progress.completed)
    }
}

/// Parallel strategy evaluation coordinator
pub struct Coordinator {
    config: Arc<EvaluationConfig>,
    store: Arc<dyn ResultStore>,
    progress_interval: Option<Duration>,
}

impl Coordinator {
    /// Create a coordinator writing results to `store`
    pub fn new(config: EvaluationConfig, store: Arc<dyn ResultStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            progress_interval: None,
        }
    }

    /// Render live progress at `interval`
    pub fn with_progress_display(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate `strategies` on the worker pool and return the best result
    pub fn evaluate<S>(
        &self,
        strategies: Vec<Strategy>,
        run_tag: &RunTag,
        baseline: Arc<S::Detail>,
        scorer: Arc<S>,
    ) -> Result<RunOutcome>
    where
        S: Scorer + 'static,
    {
        if strategies.is_empty() {
            return Err(SearchError::EmptyStrategySpace.into());
        }
        let num_workers = self.config.workers;
        if num_workers == 0 {
            anyhow::bail!("worker pool size must be at least 1");
        }

        let queued = strategies.len();
        let queue = TaskQueue::load(strategies, num_workers);
        tracing::info!(
            run_tag = %run_tag,
            strategies = queued,
            workers = num_workers,
            "starting strategy evaluation"
        );

        let (progress_tx, progress_rx) = crossbeam::channel::unbounded();
        let mut tracker = ProgressTracker::new(num_workers, queued, progress_rx);
        if let Some(interval) = self.progress_interval {
            tracker = tracker.with_display(interval);
        }
        let tracker_handle = thread::Builder::new()
            .name("stratsweep-progress".to_string())
            .spawn(move || tracker.run())
            .context("Failed to spawn progress tracker thread")?;

        let start = Instant::now();
        let mut handles = Vec::with_capacity(num_workers);
        for index in 0..num_workers {
            let worker = Worker::new(
                index,
                queue.receiver(),
                self.config.clone(),
                run_tag.clone(),
                baseline.clone(),
                scorer.clone(),
                self.store.clone(),
                ProgressReporter::new(index, progress_tx.clone()),
            );
            let handle = thread::Builder::new()
                .name(format!("stratsweep-worker-{}", index))
                .spawn(move || worker.run())
                .with_context(|| format!("Failed to spawn worker thread {}", index))?;
            handles.push(handle);
        }
        // Only workers hold senders from here on
        drop(progress_tx);

        let mut reports = Vec::with_capacity(num_workers);
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => tracing::error!(worker = index, "worker thread panicked, its in-flight strategy is lost"),
            }
        }
        let elapsed = start.elapsed();

        let progress = tracker_handle
            .join()
            .map_err(|_| anyhow::anyhow!("Progress tracker thread panicked"))?;
        let stats = RunStats::from_reports(reports, elapsed)?;

        let best = aggregator::find_best(self.store.as_ref(), run_tag)
            .with_context(|| format!("Failed to aggregate results for run tag {}", run_tag))?;

        let outcome = RunOutcome {
            run_tag: run_tag.clone(),
            queued,
            best,
            stats,
            progress,
        };
        if outcome.lost() > 0 {
            tracing::warn!(
                run_tag = %run_tag,
                lost = outcome.lost(),
                queued,
                "some strategies produced no result"
            );
        }
        Ok(outcome)
    }
}

/// Everything a completed search produced
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub baseline_score: f64,
    pub season: u32,
    pub outcome: RunOutcome,
}

/// Resolve the run tag: configured tag, else the provider's latest
pub fn resolve_run_tag<P: BaselineProvider>(config: &EvaluationConfig, provider: &P) -> Result<RunTag> {
    match config.tag {
        Some(ref tag) => RunTag::new(tag).with_context(|| format!("Invalid tag '{}'", tag)),
        None => provider
            .latest_run_tag()
            .context("Failed to determine latest prediction tag"),
    }
}

/// Generate strategies, fetch the baseline, evaluate, and persist the winner
///
/// Generator and baseline failures are fatal and happen before any worker
/// starts. The sink is called exactly once, also when no strategy won.
pub fn run_search<P, S>(
    config: &SearchConfig,
    store: Arc<dyn ResultStore>,
    provider: &P,
    scorer: Arc<S>,
    sink: &dyn PersistenceSink,
) -> Result<SearchReport>
where
    P: BaselineProvider<Detail = S::Detail>,
    S: Scorer + 'static,
{
    let run_tag = resolve_run_tag(&config.evaluation, provider)?;

    let strategies = generate_strategies(&config.search.generator_params())
        .context("Failed to generate strategies")?;
    if strategies.is_empty() {
        return Err(SearchError::EmptyStrategySpace.into());
    }

    let baseline = provider
        .baseline(config.search.weeks_ahead, &run_tag)
        .map_err(|e| SearchError::Baseline {
            run_tag: run_tag.to_string(),
            reason: format!("{:#}", e),
        })?;
    tracing::info!(run_tag = %run_tag, score = baseline.score, "baseline prediction loaded");

    let mut coordinator = Coordinator::new(config.evaluation.clone(), store);
    if config.output.show_progress {
        coordinator =
            coordinator.with_progress_display(Duration::from_millis(config.output.progress_interval_ms));
    }

    let outcome = coordinator.evaluate(strategies, &run_tag, Arc::new(baseline.detail), scorer)?;

    sink.persist_best(baseline.score, outcome.best.as_ref(), config.search.season)
        .context("Failed to persist best strategy")?;

    Ok(SearchReport {
        baseline_score: baseline.score,
        season: config.search.season,
        outcome,
    })
}
