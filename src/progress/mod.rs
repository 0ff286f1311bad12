//! Progress reporting
//!
//! Workers never touch display state directly. They send [`ProgressEvent`]s over a
//! channel and a single [`tracker::ProgressTracker`] owns every per-worker
//! counter and the global completion count.
//!
//! Per-worker progress is measured in increments: the units of internal work
//! the scorer performs for one strategy, as sized by [`count_increments`].
//! Global progress is measured in completed strategies.
//!
//! # Example
//!
//! ```
//! use stratsweep::progress::count_increments;
//! use stratsweep::strategy::StrategyId;
//!
//! let id = StrategyId::parse("W-1-2").unwrap();
//! // wildcard: 100, single: 15, double (sampled): 100
//! assert_eq!(count_increments(&id, 100, false), 215);
//! // double (exhaustive): 105
//! assert_eq!(count_increments(&id, 100, true), 220);
//! ```

pub mod tracker;

pub use tracker::{ProgressSummary, ProgressTracker};

use crate::strategy::StrategyId;
use crossbeam::channel::Sender;

/// Players in a squad; a single transfer tries replacing each in turn
pub const SQUAD_SIZE: u64 = 15;

/// Increments for an exhaustive double transfer (15 choose 2 player pairs)
pub const EXHAUSTIVE_DOUBLE_INCREMENTS: u64 = 105;

/// Number of progress increments one strategy represents
///
/// Used only to size a worker's progress counter. A wildcard, a sampled double
/// transfer and any transfer of three or more players cost `iteration_count`
/// increments; a single transfer costs [`SQUAD_SIZE`]; an exhaustive double
/// transfer costs [`EXHAUSTIVE_DOUBLE_INCREMENTS`]. Never returns less than 1.
pub fn count_increments(
    strategy_id: &StrategyId,
    iteration_count: u64,
    exhaustive_double_transfer: bool,
) -> u64 {
    let total: u64 = strategy_id
        .tokens()
        .map(|token| match token {
            'W' => iteration_count,
            '1' => SQUAD_SIZE,
            '2' if exhaustive_double_transfer => EXHAUSTIVE_DOUBLE_INCREMENTS,
            '2' => iteration_count,
            '3'..='9' => iteration_count,
            _ => 0,
        })
        .fold(0u64, |acc, n| acc.saturating_add(n));

    total.max(1)
}

/// Message sent from a worker to the progress tracker
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Worker picked up a new strategy
    Started {
        worker: usize,
        label: StrategyId,
        units_total: u64,
    },
    /// Scorer finished `delta` increments
    Advanced { worker: usize, delta: u64 },
    /// Result for the current strategy has been stored
    Completed { worker: usize },
    /// Current strategy produced no result
    Failed { worker: usize, label: StrategyId },
    /// Worker consumed its termination marker
    Exited { worker: usize },
}

/// Handle the scorer uses to report increments
///
/// Sending never blocks and never fails from the caller's point of view; if the
/// tracker has gone away the event is dropped.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    worker: usize,
    sender: Sender<ProgressEvent>,
}

impl ProgressReporter {
    pub fn new(worker: usize, sender: Sender<ProgressEvent>) -> Self {
        Self { worker, sender }
    }

    /// A reporter nobody listens to
    pub fn detached() -> Self {
        let (sender, _) = crossbeam::channel::unbounded();
        Self { worker: 0, sender }
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Report one increment
    #[inline]
    pub fn tick(&self) {
        self.advance(1);
    }

    /// Report `delta` increments
    pub fn advance(&self, delta: u64) {
        let _ = self.sender.send(ProgressEvent::Advanced {
            worker: self.worker,
            delta,
        });
    }

    pub(crate) fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

/// Progress of one worker on its current strategy
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    pub worker_index: usize,
    pub current_strategy_label: Option<StrategyId>,
    pub units_done: u64,
    pub units_total: u64,
    /// Set once the worker has consumed its termination marker
    pub finished: bool,
}

impl ProgressState {
    pub fn new(worker_index: usize) -> Self {
        Self {
            worker_index,
            current_strategy_label: None,
            units_done: 0,
            units_total: 1,
            finished: false,
        }
    }

    /// Start counting for a new strategy
    pub fn reset(&mut self, label: StrategyId, units_total: u64) {
        self.current_strategy_label = Some(label);
        self.units_done = 0;
        self.units_total = units_total.max(1);
    }

    pub fn advance(&mut self, delta: u64) {
        self.units_done = self.units_done.saturating_add(delta);
    }

    /// Final close: clear the label
    pub fn close(&mut self) {
        self.current_strategy_label = None;
        self.units_done = 0;
        self.finished = true;
    }

    /// Percentage of the current strategy done, capped at 100
    pub fn percent(&self) -> f64 {
        let pct = self.units_done as f64 * 100.0 / self.units_total as f64;
        pct.min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StrategyId {
        StrategyId::parse(s).unwrap()
    }

    #[test]
    fn test_single_swap_is_squad_size() {
        for iterations in [1, 10, 100, 10_000] {
            assert_eq!(count_increments(&id("1"), iterations, false), 15);
            assert_eq!(count_increments(&id("1"), iterations, true), 15);
        }
    }

    #[test]
    fn test_double_swap_depends_on_exhaustive() {
        assert_eq!(count_increments(&id("2"), 100, true), 105);
        assert_eq!(count_increments(&id("2"), 100, false), 100);
        assert_eq!(count_increments(&id("2"), 7, false), 7);
    }

    #[test]
    fn test_wildcard_and_heavy_use_iterations() {
        assert_eq!(count_increments(&id("W"), 50, false), 50);
        assert_eq!(count_increments(&id("3"), 50, true), 50);
        assert_eq!(count_increments(&id("W-3-1"), 50, false), 115);
    }

    #[test]
    fn test_never_below_one() {
        assert_eq!(count_increments(&id("0"), 100, false), 1);
        assert_eq!(count_increments(&id("0-0-0"), 100, true), 1);
        for s in ["0", "1", "2", "W", "0-2", "3-0"] {
            for iterations in [0, 1, 5] {
                for exhaustive in [false, true] {
                    assert!(count_increments(&id(s), iterations, exhaustive) >= 1);
                }
            }
        }
    }

    #[test]
    fn test_state_reset_and_percent() {
        let mut state = ProgressState::new(2);
        assert_eq!(state.percent(), 0.0);

        state.reset(id("1-0"), 15);
        state.advance(5);
        assert_eq!(state.units_done, 5);
        assert!((state.percent() - 33.333).abs() < 0.01);

        state.advance(50);
        assert_eq!(state.percent(), 100.0);

        state.reset(id("2"), 0);
        assert_eq!(state.units_done, 0);
        assert_eq!(state.units_total, 1);
        assert_eq!(state.current_strategy_label, Some(id("2")));

        state.close();
        assert!(state.finished);
        assert!(state.current_strategy_label.is_none());
    }

    #[test]
    fn test_reporter_sends_events() {
        let (tx, rx) = crossbeam::channel::unbounded();
        let reporter = ProgressReporter::new(3, tx);
        reporter.tick();
        reporter.advance(4);

        assert_eq!(rx.recv().unwrap(), ProgressEvent::Advanced { worker: 3, delta: 1 });
        assert_eq!(rx.recv().unwrap(), ProgressEvent::Advanced { worker: 3, delta: 4 });
    }

    #[test]
    fn test_detached_reporter_does_not_panic() {
        let reporter = ProgressReporter::detached();
        reporter.tick();
        reporter.advance(10);
    }
}
