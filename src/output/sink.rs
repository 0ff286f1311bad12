//! Persistence of the winning strategy
//!
//! The coordinator calls [`PersistenceSink::persist_best`] exactly once per
//! search, after aggregation. A run without a strictly positive result still
//! produces a record: the baseline is recommended and no transfers are listed.

use crate::scoring::PlayerId;
use crate::store::ScoredStrategy;
use crate::strategy::StrategyId;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Long-term store for the chosen strategy
pub trait PersistenceSink {
    fn persist_best(&self, baseline_score: f64, best: Option<&ScoredStrategy>, season: u32) -> Result<()>;
}

/// One persisted suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    /// RFC 3339 timestamp
    pub recorded_at: String,
    pub season: u32,
    pub baseline_score: f64,
    /// `None` when the baseline is recommended
    pub strategy_id: Option<StrategyId>,
    pub total_score: f64,
    /// Total score minus baseline score
    pub points_gain: f64,
    pub score_per_period: BTreeMap<u32, f64>,
    pub sold_per_period: BTreeMap<u32, BTreeSet<PlayerId>>,
    pub bought_per_period: BTreeMap<u32, BTreeSet<PlayerId>>,
}

impl SuggestionRecord {
    pub fn new(baseline_score: f64, best: Option<&ScoredStrategy>, season: u32) -> Self {
        let recorded_at = chrono::Utc::now().to_rfc3339();
        match best {
            Some(best) => Self {
                recorded_at,
                season,
                baseline_score,
                strategy_id: Some(best.strategy_id.clone()),
                total_score: best.result.total_score,
                points_gain: best.result.total_score - baseline_score,
                score_per_period: best.result.score_per_period.clone(),
                sold_per_period: best.result.sold_per_period.clone(),
                bought_per_period: best.result.bought_per_period.clone(),
            },
            None => Self {
                recorded_at,
                season,
                baseline_score,
                strategy_id: None,
                total_score: baseline_score,
                points_gain: 0.0,
                score_per_period: BTreeMap::new(),
                sold_per_period: BTreeMap::new(),
                bought_per_period: BTreeMap::new(),
            },
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.strategy_id.is_none()
    }
}

/// Appends one JSON line per search to a file
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, oldest first
    pub fn read_all(&self) -> Result<Vec<SuggestionRecord>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read suggestions file: {}", self.path.display()))?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid suggestion record on line {}", i + 1))
            })
            .collect()
    }
}

impl PersistenceSink for JsonLinesSink {
    fn persist_best(&self, baseline_score: f64, best: Option<&ScoredStrategy>, season: u32) -> Result<()> {
        let record = SuggestionRecord::new(baseline_score, best, season);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open suggestions file: {}", self.path.display()))?;

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        tracing::info!(
            path = %self.path.display(),
            strategy = record.strategy_id.as_ref().map(|id| id.as_str()).unwrap_or("baseline"),
            gain = record.points_gain,
            "suggestion recorded"
        );
        Ok(())
    }
}

/// Sink that only logs the suggestion
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl PersistenceSink for LogSink {
    fn persist_best(&self, baseline_score: f64, best: Option<&ScoredStrategy>, season: u32) -> Result<()> {
        match best {
            Some(best) => tracing::info!(
                season,
                strategy = %best.strategy_id,
                score = best.result.total_score,
                baseline = baseline_score,
                "suggesting strategy"
            ),
            None => tracing::info!(season, baseline = baseline_score, "suggesting baseline, no strategy scored above zero"),
        }
        Ok(())
    }
}

/// Sink keeping records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SuggestionRecord>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<SuggestionRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl PersistenceSink for MemorySink {
    fn persist_best(&self, baseline_score: f64, best: Option<&ScoredStrategy>, season: u32) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("suggestion records lock poisoned"))?
            .push(SuggestionRecord::new(baseline_score, best, season));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::StrategyResult;
    use tempfile::TempDir;

    fn winner() -> ScoredStrategy {
        let mut result = StrategyResult::with_total(130.0);
        result.score_per_period.insert(5, 60.0);
        result.score_per_period.insert(6, 70.0);
        result.sold_per_period.insert(5, [3].into_iter().collect());
        result.bought_per_period.insert(5, [1042].into_iter().collect());
        ScoredStrategy {
            strategy_id: StrategyId::parse("1-0").unwrap(),
            result,
        }
    }

    #[test]
    fn test_record_from_winner() {
        let record = SuggestionRecord::new(120.0, Some(&winner()), 2425);
        assert!(!record.is_baseline());
        assert_eq!(record.points_gain, 10.0);
        assert_eq!(record.bought_per_period[&5].len(), 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.recorded_at).is_ok());
    }

    #[test]
    fn test_record_without_winner_recommends_baseline() {
        let record = SuggestionRecord::new(120.0, None, 2425);
        assert!(record.is_baseline());
        assert_eq!(record.total_score, 120.0);
        assert_eq!(record.points_gain, 0.0);
        assert!(record.sold_per_period.is_empty());
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let temp_dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(temp_dir.path().join("nested/suggestions.jsonl"));

        sink.persist_best(120.0, Some(&winner()), 2425).unwrap();
        sink.persist_best(118.0, None, 2425).unwrap();

        let records = sink.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].strategy_id.as_ref().unwrap().as_str(), "1-0");
        assert_eq!(records[0].score_per_period[&6], 70.0);
        assert!(records[1].is_baseline());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::default();
        sink.persist_best(1.0, None, 2324).unwrap();
        assert_eq!(sink.records()[0].season, 2324);
    }
}
