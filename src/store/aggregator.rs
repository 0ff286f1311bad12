//! Best-result aggregation
//!
//! Runs once per run tag after every worker has joined. Reads each stored
//! result, keeps the first one with the highest strictly positive score, and
//! deletes every entry it visits so the store is empty for the tag afterwards.
//!
//! Must not run while workers for the same tag are still writing.
//!
//! # Example
//!
//! ```
//! use stratsweep::scoring::StrategyResult;
//! use stratsweep::store::{aggregator::find_best, memory::MemoryResultStore, ResultStore, RunTag};
//! use stratsweep::strategy::StrategyId;
//!
//! let store = MemoryResultStore::new();
//! let tag = RunTag::new("run").unwrap();
//! store.put(&tag, &StrategyId::parse("1").unwrap(), &StrategyResult::with_total(10.0))?;
//! store.put(&tag, &StrategyId::parse("2").unwrap(), &StrategyResult::with_total(25.0))?;
//!
//! let best = find_best(&store, &tag)?.unwrap();
//! assert_eq!(best.strategy_id.as_str(), "2");
//! assert_eq!(store.count(&tag)?, 0);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::{ResultStore, RunTag, ScoredStrategy};
use crate::Result;

/// Find the best stored result for `run_tag`, consuming every entry
///
/// A result must score strictly above zero to be eligible, so `None` means
/// either no entries existed or none scored above zero. Ties keep the first
/// entry encountered. Unreadable entries are logged, skipped and removed.
pub fn find_best(store: &dyn ResultStore, run_tag: &RunTag) -> Result<Option<ScoredStrategy>> {
    let keys = store.keys(run_tag)?;
    let mut best_score = 0.0;
    let mut best: Option<ScoredStrategy> = None;
    let mut skipped = 0usize;

    for strategy_id in keys {
        match store.load(run_tag, &strategy_id) {
            Ok(result) => {
                if result.total_score > best_score {
                    best_score = result.total_score;
                    best = Some(ScoredStrategy {
                        strategy_id: strategy_id.clone(),
                        result,
                    });
                }
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!(run_tag = %run_tag, strategy = %strategy_id, "skipping unreadable result: {:#}", e);
            }
        }

        if let Err(e) = store.remove(run_tag, &strategy_id) {
            tracing::warn!(run_tag = %run_tag, strategy = %strategy_id, "failed to remove result: {:#}", e);
        }
    }

    match store.purge_unreadable(run_tag) {
        Ok(purged) => skipped += purged,
        Err(e) => tracing::warn!(run_tag = %run_tag, "failed to purge unreadable results: {:#}", e),
    }

    match &best {
        Some(b) => tracing::info!(run_tag = %run_tag, strategy = %b.strategy_id, score = b.result.total_score, skipped, "best strategy found"),
        None => tracing::info!(run_tag = %run_tag, skipped, "no strategy scored above zero"),
    }

    Ok(best)
}
