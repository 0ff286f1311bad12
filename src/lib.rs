//! stratsweep - parallel strategy-evaluation coordinator
//!
//! stratsweep enumerates every transfer strategy over a planning horizon, scores
//! each one with an expensive external scoring function on a fixed pool of worker
//! threads, and reports the single best strategy against a baseline prediction.
//!
//! # Architecture
//!
//! - **Strategy space**: deterministic strategy ids and a budget-pruned generator
//! - **Coordinator**: task queue with one termination marker per worker, worker pool, aggregation
//! - **Progress**: per-worker and global progress via message passing to a single tracker
//! - **Result store**: durable per-strategy results under an explicit output area
//! - **Output**: console report, JSON summary, and a persistence sink for the winner

pub mod config;
pub mod coordinator;
pub mod output;
pub mod progress;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod strategy;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::SearchConfig;
pub use coordinator::{run_search, Coordinator, RunOutcome, SearchReport};
pub use scoring::{BaselineProvider, Scorer, StrategyResult};
pub use store::{ResultStore, RunTag, ScoredStrategy};
pub use strategy::{Strategy, StrategyId};

/// Result type used throughout stratsweep
pub type Result<T> = anyhow::Result<T>;
