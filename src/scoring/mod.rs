//! Scoring interfaces
//!
//! The scoring function and the baseline prediction are supplied by the caller.
//! This module defines the narrow contracts the coordinator relies on and the
//! result record every evaluated strategy produces.
//!
//! # Architecture
//!
//! - **BaselineProvider**: returns the reference prediction for a run tag, once per run
//! - **Scorer**: evaluates one strategy against the baseline detail; called from worker threads
//! - **StrategyResult**: the score breakdown written to the result store
//!
//! The baseline detail is opaque to the coordinator. It is produced by the
//! provider and handed unchanged to every `Scorer::evaluate` call, which is why
//! both traits name it through an associated type.

pub mod simulated;

use crate::progress::ProgressReporter;
use crate::store::RunTag;
use crate::strategy::Strategy;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Player identifier
pub type PlayerId = u32;

/// Score breakdown of one evaluated strategy
///
/// Written exactly once per evaluated strategy and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub total_score: f64,
    #[serde(default)]
    pub score_per_period: BTreeMap<u32, f64>,
    #[serde(default)]
    pub sold_per_period: BTreeMap<u32, BTreeSet<PlayerId>>,
    #[serde(default)]
    pub bought_per_period: BTreeMap<u32, BTreeSet<PlayerId>>,
}

impl StrategyResult {
    /// A result with only a total score
    pub fn with_total(total_score: f64) -> Self {
        Self {
            total_score,
            ..Default::default()
        }
    }
}

/// Reference prediction the strategies are scored against
#[derive(Debug, Clone)]
pub struct Baseline<D> {
    /// Expected score of making no transfers
    pub score: f64,
    /// Opaque detail passed to every scorer call
    pub detail: D,
}

/// Supplies the baseline prediction for a run
pub trait BaselineProvider {
    type Detail: Send + Sync + 'static;

    /// Tag of the most recent prediction set, used when no tag is configured
    fn latest_run_tag(&self) -> Result<RunTag>;

    /// Fetch the baseline for `horizon` periods of prediction set `run_tag`
    fn baseline(&self, horizon: u32, run_tag: &RunTag) -> Result<Baseline<Self::Detail>>;
}

/// Per-call scorer inputs
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub exhaustive_double_transfer: bool,
    pub run_tag: RunTag,
    /// Iterations chosen by the iteration policy
    pub iterations: u64,
    /// Money in the bank (multiplied by 10) available for transfers
    pub budget: u32,
}

/// Expensive scoring function
///
/// Implementations are shared by all worker threads and must be `Send + Sync`.
/// They should call `progress.tick()` once per unit of internal work so the
/// worker's progress reaches its total by the time the strategy completes.
pub trait Scorer: Send + Sync {
    type Detail: Send + Sync + 'static;

    fn evaluate(
        &self,
        strategy: &Strategy,
        request: &EvaluationRequest,
        baseline: &Self::Detail,
        progress: &ProgressReporter,
    ) -> Result<StrategyResult>;
}
