//! Progress tracker
//!
//! Single consumer of [`ProgressEvent`]s. Owns one [`ProgressState`] per worker
//! and the global count of finished strategies, and optionally renders a live
//! single-line display at a fixed interval.
//!
//! # Example
//!
//! ```
//! use stratsweep::progress::{ProgressEvent, ProgressTracker};
//!
//! let (tx, rx) = crossbeam::channel::unbounded();
//! let tracker = ProgressTracker::new(1, 0, rx);
//! tx.send(ProgressEvent::Exited { worker: 0 }).unwrap();
//!
//! let summary = tracker.run();
//! assert_eq!(summary.worker_exits, 1);
//! ```

use super::{ProgressEvent, ProgressState};
use crossbeam::channel::Receiver;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Final counts seen by the tracker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    /// Strategies whose result was stored
    pub completed: usize,
    /// Strategies that produced no result
    pub failed: usize,
    /// Workers that consumed their termination marker
    pub worker_exits: usize,
    /// True once completed + failed reached the number of queued strategies
    pub finished: bool,
}

/// Owner of all progress state
#[derive(Debug)]
pub struct ProgressTracker {
    receiver: Receiver<ProgressEvent>,
    workers: Vec<ProgressState>,
    total_strategies: usize,
    completed: usize,
    failed: usize,
    worker_exits: usize,
    finished: bool,
    /// Render interval; `None` disables the live display
    display_interval: Option<Duration>,
    last_render: Instant,
    started: Instant,
}

impl ProgressTracker {
    /// Create a tracker for `num_workers` workers and `total_strategies` queued strategies
    pub fn new(num_workers: usize, total_strategies: usize, receiver: Receiver<ProgressEvent>) -> Self {
        let now = Instant::now();
        Self {
            receiver,
            workers: (0..num_workers).map(ProgressState::new).collect(),
            total_strategies,
            completed: 0,
            failed: 0,
            worker_exits: 0,
            finished: false,
            display_interval: None,
            last_render: now,
            started: now,
        }
    }

    /// Enable live console rendering
    pub fn with_display(mut self, interval: Duration) -> Self {
        self.display_interval = Some(interval);
        self
    }

    /// Consume events until every worker has exited
    ///
    /// Also returns if all senders are dropped, which happens when a worker
    /// thread dies without sending its exit event.
    pub fn run(mut self) -> ProgressSummary {
        while self.worker_exits < self.workers.len() {
            match self.receiver.recv() {
                Ok(event) => {
                    self.apply(event);
                    if self.should_render() {
                        self.render();
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        exits = self.worker_exits,
                        workers = self.workers.len(),
                        "progress channel closed before all workers exited"
                    );
                    break;
                }
            }
        }

        if self.display_interval.is_some() {
            self.render();
            println!();
        }

        self.summary()
    }

    /// Apply one event to the tracked state
    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started {
                worker,
                label,
                units_total,
            } => {
                if let Some(state) = self.workers.get_mut(worker) {
                    state.reset(label, units_total);
                }
            }
            ProgressEvent::Advanced { worker, delta } => {
                if let Some(state) = self.workers.get_mut(worker) {
                    state.advance(delta);
                }
            }
            ProgressEvent::Completed { worker } => {
                if let Some(state) = self.workers.get_mut(worker) {
                    state.units_done = state.units_total;
                }
                self.completed += 1;
                self.check_finished();
            }
            ProgressEvent::Failed { worker, label } => {
                tracing::debug!(worker, strategy = %label, "strategy failed");
                self.failed += 1;
                self.check_finished();
            }
            ProgressEvent::Exited { worker } => {
                if let Some(state) = self.workers.get_mut(worker) {
                    if !state.finished {
                        state.close();
                        self.worker_exits += 1;
                    }
                }
            }
        }
    }

    fn check_finished(&mut self) {
        if !self.finished && self.completed + self.failed >= self.total_strategies {
            self.finished = true;
            tracing::info!(
                completed = self.completed,
                failed = self.failed,
                elapsed_s = self.started.elapsed().as_secs_f64(),
                "all strategies evaluated"
            );
        }
    }

    fn should_render(&self) -> bool {
        match self.display_interval {
            Some(interval) => self.last_render.elapsed() >= interval,
            None => false,
        }
    }

    /// Render a single-line status to the console
    fn render(&mut self) {
        self.last_render = Instant::now();

        let done = self.completed + self.failed;
        let pct = if self.total_strategies > 0 {
            done as f64 * 100.0 / self.total_strategies as f64
        } else {
            100.0
        };

        let mut line = format!(
            "\r[{:4}s] Total: {}/{} ({:5.1}%)",
            self.started.elapsed().as_secs(),
            done,
            self.total_strategies,
            pct
        );
        for state in &self.workers {
            match (&state.current_strategy_label, state.finished) {
                (_, true) => line.push_str(&format!(" | w{} done", state.worker_index)),
                (Some(label), false) => line.push_str(&format!(
                    " | w{} {} {:3.0}%",
                    state.worker_index,
                    label,
                    state.percent()
                )),
                (None, false) => line.push_str(&format!(" | w{} idle", state.worker_index)),
            }
        }

        let mut out = io::stdout();
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }

    pub fn worker_state(&self, worker: usize) -> Option<&ProgressState> {
        self.workers.get(worker)
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary {
            completed: self.completed,
            failed: self.failed,
            worker_exits: self.worker_exits,
            finished: self.finished,
        }
    }
}
