//! JSON run summary
//!
//! One document per search with the winner, the baseline, counts, and the
//! evaluation time distribution. Durations carry both microseconds and a
//! human-readable form.

use crate::coordinator::SearchReport;
use crate::store::ScoredStrategy;
use crate::util::time::format_duration;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            human: format_duration(d),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEvaluationTimes {
    pub count: u64,
    pub min: Option<JsonDuration>,
    pub mean: Option<JsonDuration>,
    pub p50: Option<JsonDuration>,
    pub p99: Option<JsonDuration>,
    pub max: Option<JsonDuration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWorkerSummary {
    pub worker: usize,
    pub evaluated: usize,
    pub failed: usize,
}

/// Top-level summary document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRunSummary {
    pub generated_at: String,
    pub version: String,
    pub run_tag: String,
    pub season: u32,
    pub baseline_score: f64,
    pub best: Option<ScoredStrategy>,
    pub queued: usize,
    pub evaluated: usize,
    pub failed: usize,
    pub elapsed: JsonDuration,
    pub strategies_per_second: f64,
    pub evaluation_times: JsonEvaluationTimes,
    pub workers: Vec<JsonWorkerSummary>,
}

/// Build the summary document for a finished search
pub fn build_summary(report: &SearchReport) -> JsonRunSummary {
    let outcome = &report.outcome;
    let times = &outcome.stats.evaluation_times;
    let json_of = |d: Option<Duration>| d.map(JsonDuration::from_duration);

    JsonRunSummary {
        generated_at: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        run_tag: outcome.run_tag.to_string(),
        season: report.season,
        baseline_score: report.baseline_score,
        best: outcome.best.clone(),
        queued: outcome.queued,
        evaluated: outcome.stats.evaluated,
        failed: outcome.stats.failed,
        elapsed: JsonDuration::from_duration(outcome.stats.elapsed),
        strategies_per_second: outcome.stats.throughput(),
        evaluation_times: JsonEvaluationTimes {
            count: times.len(),
            min: json_of(times.min()),
            mean: json_of(times.mean()),
            p50: json_of(times.percentile(50.0)),
            p99: json_of(times.percentile(99.0)),
            max: json_of(times.max()),
        },
        workers: outcome
            .stats
            .per_worker
            .iter()
            .map(|w| JsonWorkerSummary {
                worker: w.worker_index,
                evaluated: w.evaluated,
                failed: w.failed,
            })
            .collect(),
    }
}

/// Write the summary as pretty JSON to `output_path`
pub fn write_summary(output_path: &Path, report: &SearchReport) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &build_summary(report))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RunOutcome;
    use crate::progress::ProgressSummary;
    use crate::scoring::StrategyResult;
    use crate::stats::{RunStats, WorkerReport};
    use crate::store::RunTag;
    use crate::strategy::StrategyId;
    use tempfile::TempDir;

    fn report() -> SearchReport {
        let mut w0 = WorkerReport::new(0);
        w0.record_success(Duration::from_millis(4));
        w0.record_success(Duration::from_millis(6));
        let mut w1 = WorkerReport::new(1);
        w1.record_failure();

        SearchReport {
            baseline_score: 100.0,
            season: 2425,
            outcome: RunOutcome {
                run_tag: RunTag::new("abc").unwrap(),
                queued: 3,
                best: Some(ScoredStrategy {
                    strategy_id: StrategyId::parse("0-1").unwrap(),
                    result: StrategyResult::with_total(104.0),
                }),
                stats: RunStats::from_reports(vec![w0, w1], Duration::from_secs(1)).unwrap(),
                progress: ProgressSummary::default(),
            },
        }
    }

    #[test]
    fn test_build_summary() {
        let summary = build_summary(&report());
        assert_eq!(summary.run_tag, "abc");
        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.evaluation_times.count, 2);
        assert!(summary.evaluation_times.min.is_some());
        assert_eq!(summary.workers.len(), 2);
        assert_eq!(summary.elapsed.micros, 1_000_000);
    }

    #[test]
    fn test_write_summary() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.json");
        write_summary(&path, &report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["best"]["strategy_id"], "0-1");
        assert_eq!(value["best"]["result"]["total_score"], 104.0);
        assert_eq!(value["baseline_score"], 100.0);
    }
}
