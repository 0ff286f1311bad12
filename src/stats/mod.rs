//! Run statistics
//!
//! Each worker returns a [`WorkerReport`] when it exits. The coordinator merges
//! them into [`RunStats`], keeping the per-worker breakdown for the report.

pub mod histogram;

use crate::util::time::calculate_rate;
use crate::Result;
use histogram::EvaluationHistogram;
use std::time::Duration;

/// What one worker did before consuming its termination marker
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker_index: usize,
    /// Strategies whose result was stored
    pub evaluated: usize,
    /// Strategies that produced no result
    pub failed: usize,
    pub evaluation_times: EvaluationHistogram,
}

impl WorkerReport {
    pub fn new(worker_index: usize) -> Self {
        Self {
            worker_index,
            evaluated: 0,
            failed: 0,
            evaluation_times: EvaluationHistogram::new(),
        }
    }

    pub fn record_success(&mut self, elapsed: Duration) {
        self.evaluated += 1;
        self.evaluation_times.record(elapsed);
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

/// Merged statistics for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub evaluated: usize,
    pub failed: usize,
    pub evaluation_times: EvaluationHistogram,
    /// Per-worker reports, ordered by worker index
    pub per_worker: Vec<WorkerReport>,
    /// Wall time from pool start to pool join
    pub elapsed: Duration,
}

impl RunStats {
    /// Merge worker reports
    pub fn from_reports(mut reports: Vec<WorkerReport>, elapsed: Duration) -> Result<Self> {
        reports.sort_by_key(|r| r.worker_index);

        let mut stats = RunStats {
            elapsed,
            ..Default::default()
        };
        for report in &reports {
            stats.evaluated += report.evaluated;
            stats.failed += report.failed;
            stats.evaluation_times.merge(&report.evaluation_times)?;
        }
        stats.per_worker = reports;
        Ok(stats)
    }

    /// Strategies evaluated per second of wall time
    pub fn throughput(&self) -> f64 {
        calculate_rate(self.evaluated as u64, self.elapsed)
    }
}
