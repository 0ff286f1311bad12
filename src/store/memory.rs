//! In-memory result store
//!
//! Same put/scan/delete contract as the filesystem store, backed by a
//! mutex-protected map. Suitable when every worker is a thread of this process.

use super::{ResultStore, RunTag, StoreError};
use crate::scoring::StrategyResult;
use crate::strategy::StrategyId;
use crate::Result;
use std::collections::HashMap;
use std::sync::Mutex;

type Key = (RunTag, StrategyId);

/// Lock-protected map of results
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: Mutex<HashMap<Key, StrategyResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Key, StrategyResult>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("result store lock poisoned"))
    }

    /// Total entries across all run tags
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryResultStore {
    fn put(&self, run_tag: &RunTag, strategy_id: &StrategyId, result: &StrategyResult) -> Result<()> {
        self.lock()?
            .insert((run_tag.clone(), strategy_id.clone()), result.clone());
        Ok(())
    }

    fn keys(&self, run_tag: &RunTag) -> Result<Vec<StrategyId>> {
        let mut keys: Vec<StrategyId> = self
            .lock()?
            .keys()
            .filter(|(tag, _)| tag == run_tag)
            .map(|(_, id)| id.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn load(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<StrategyResult> {
        self.lock()?
            .get(&(run_tag.clone(), strategy_id.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", run_tag, strategy_id)).into())
    }

    fn remove(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<()> {
        self.lock()?.remove(&(run_tag.clone(), strategy_id.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_partitions_by_tag() {
        let store = MemoryResultStore::new();
        let a = RunTag::new("a").unwrap();
        let b = RunTag::new("b").unwrap();
        let id = StrategyId::parse("1").unwrap();

        store.put(&a, &id, &StrategyResult::with_total(1.0)).unwrap();
        store.put(&b, &id, &StrategyResult::with_total(2.0)).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.load(&a, &id).unwrap().total_score, 1.0);
        assert_eq!(store.load(&b, &id).unwrap().total_score, 2.0);

        store.remove(&a, &id).unwrap();
        assert_eq!(store.count(&a).unwrap(), 0);
        assert_eq!(store.count(&b).unwrap(), 1);
        assert!(store.load(&a, &id).is_err());
    }
}
