//! Result store
//!
//! Every worker writes one [`StrategyResult`] per completed strategy, keyed by
//! `(run tag, strategy id)`. Keys are globally unique within a run, so writers
//! never conflict and no locking is needed around writes.
//!
//! Two backends implement [`ResultStore`]:
//!
//! - [`file::FileResultStore`]: one JSON file per result inside an [`file::OutputArea`]
//! - [`memory::MemoryResultStore`]: a lock-protected map for single-process runs
//!
//! The [`aggregator`] scans a run's entries once all workers have joined.

pub mod aggregator;
pub mod file;
pub mod memory;

use crate::scoring::StrategyResult;
use crate::strategy::StrategyId;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest accepted run tag
pub const MAX_RUN_TAG_LEN: usize = 128;

/// Errors raised when constructing a run tag
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunTagError {
    #[error("run tag is empty")]
    Empty,
    #[error("run tag is longer than {} characters", MAX_RUN_TAG_LEN)]
    TooLong,
    #[error("run tag contains invalid character '{0}' (allowed: letters, digits, '.', '-')")]
    InvalidChar(char),
}

/// Errors raised by store backends
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result entry {key} is corrupt")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("result entry {0} not found")]
    NotFound(String),
}

/// Identifier of one invocation's prediction set
///
/// Restricted to letters, digits, `.` and `-` so that it can never contain the
/// `_` separating it from the strategy id in a result file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunTag(String);

impl RunTag {
    pub fn new(tag: &str) -> std::result::Result<Self, RunTagError> {
        if tag.is_empty() {
            return Err(RunTagError::Empty);
        }
        if tag.len() > MAX_RUN_TAG_LEN {
            return Err(RunTagError::TooLong);
        }
        if let Some(c) = tag
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(RunTagError::InvalidChar(c));
        }
        Ok(Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored result together with the strategy it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStrategy {
    pub strategy_id: StrategyId,
    pub result: StrategyResult,
}

/// Durable put/scan/delete storage for strategy results
///
/// A `put` must be visible to every later `keys` call on any thread. Workers
/// only ever call `put`; `load` and `remove` belong to the aggregator.
pub trait ResultStore: Send + Sync {
    /// Store the result of one strategy
    fn put(&self, run_tag: &RunTag, strategy_id: &StrategyId, result: &StrategyResult) -> Result<()>;

    /// Ids of every stored result for `run_tag`
    fn keys(&self, run_tag: &RunTag) -> Result<Vec<StrategyId>>;

    /// Read one stored result
    fn load(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<StrategyResult>;

    /// Delete one stored result; deleting a missing entry is not an error
    fn remove(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<()>;

    /// Remove entries under `run_tag` whose strategy id cannot be recovered
    ///
    /// Such entries never show up in `keys`. Returns how many were removed.
    fn purge_unreadable(&self, _run_tag: &RunTag) -> Result<usize> {
        Ok(0)
    }

    /// Number of stored results for `run_tag`
    fn count(&self, run_tag: &RunTag) -> Result<usize> {
        Ok(self.keys(run_tag)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_tag_valid() {
        let tag = RunTag::new("3f2a-91bc.v2").unwrap();
        assert_eq!(tag.as_str(), "3f2a-91bc.v2");
        assert_eq!(tag.to_string(), "3f2a-91bc.v2");
    }

    #[test]
    fn test_run_tag_invalid() {
        assert_eq!(RunTag::new(""), Err(RunTagError::Empty));
        assert_eq!(RunTag::new("a_b"), Err(RunTagError::InvalidChar('_')));
        assert_eq!(RunTag::new("a/b"), Err(RunTagError::InvalidChar('/')));
        assert_eq!(RunTag::new(&"x".repeat(MAX_RUN_TAG_LEN + 1)), Err(RunTagError::TooLong));
    }
}
