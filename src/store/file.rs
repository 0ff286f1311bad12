//! Filesystem-backed result store
//!
//! Results live in an [`OutputArea`], one JSON file per strategy named
//! `strategy_<run tag>_<strategy id>.json`. A file is first written under a
//! hidden temporary name and then renamed into place, so a scan only ever sees
//! complete results.
//!
//! The directory may be shared with unrelated files. Only names this store
//! writes are ever listed or removed.

use super::{ResultStore, RunTag, StoreError};
use crate::scoring::StrategyResult;
use crate::strategy::StrategyId;
use crate::Result;
use anyhow::Context;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Prefix of every result file
pub const RESULT_FILE_PREFIX: &str = "strategy_";

/// Extension of every result file
pub const RESULT_FILE_EXTENSION: &str = ".json";

/// File name for a stored result
pub fn result_file_name(run_tag: &RunTag, strategy_id: &StrategyId) -> String {
    format!("{}{}_{}{}", RESULT_FILE_PREFIX, run_tag, strategy_id, RESULT_FILE_EXTENSION)
}

/// Split a result file name back into its key
///
/// Returns `None` for anything that is not a result file.
pub fn parse_result_file_name(name: &str) -> Option<(RunTag, StrategyId)> {
    let stem = name
        .strip_prefix(RESULT_FILE_PREFIX)?
        .strip_suffix(RESULT_FILE_EXTENSION)?;
    let (tag, id) = stem.split_once('_')?;
    Some((RunTag::new(tag).ok()?, StrategyId::parse(id).ok()?))
}

/// Run tag of a name shaped like a result file, whether or not its id parses
fn result_file_tag(name: &str) -> Option<RunTag> {
    let stem = name
        .strip_prefix(RESULT_FILE_PREFIX)?
        .strip_suffix(RESULT_FILE_EXTENSION)?;
    let (tag, _) = stem.split_once('_')?;
    RunTag::new(tag).ok()
}

/// Hidden name a result is written under before the rename
fn temp_file_name(name: &str) -> String {
    format!(".{}.tmp", name)
}

/// True for result files and their temporaries, false for anything else
pub fn is_store_file(name: &str) -> bool {
    let inner = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(".tmp"))
        .unwrap_or(name);
    parse_result_file_name(inner).is_some()
}

/// Directory shared by all workers and the aggregator for one run
///
/// Created explicitly per run and handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct OutputArea {
    root: PathBuf,
}

impl OutputArea {
    /// Create the directory if absent and remove stale result files
    ///
    /// Files this store did not write are left alone.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create output directory: {}", root.display()))?;

        let mut removed = 0usize;
        for entry in fs::read_dir(&root)
            .with_context(|| format!("Failed to list output directory: {}", root.display()))?
        {
            let entry = entry?;
            let owned = entry.file_name().to_str().map(is_store_file).unwrap_or(false);
            if owned && entry.file_type()?.is_file() {
                fs::remove_file(entry.path()).with_context(|| {
                    format!("Failed to remove stale entry: {}", entry.path().display())
                })?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(dir = %root.display(), removed, "cleared stale entries from output directory");
        }

        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Number of result files and temporaries currently in the area
    pub fn entry_count(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let owned = entry.file_name().to_str().map(is_store_file).unwrap_or(false);
            if owned && entry.file_type()?.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Result store writing one JSON file per result
#[derive(Debug, Clone)]
pub struct FileResultStore {
    area: OutputArea,
}

impl FileResultStore {
    pub fn new(area: OutputArea) -> Self {
        Self { area }
    }

    pub fn area(&self) -> &OutputArea {
        &self.area
    }

    fn entry_path(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> PathBuf {
        self.area.path().join(result_file_name(run_tag, strategy_id))
    }
}

impl ResultStore for FileResultStore {
    fn put(&self, run_tag: &RunTag, strategy_id: &StrategyId, result: &StrategyResult) -> Result<()> {
        let name = result_file_name(run_tag, strategy_id);
        let final_path = self.area.path().join(&name);
        let tmp_path = self.area.path().join(temp_file_name(&name));

        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create result file: {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, result)
            .with_context(|| format!("Failed to serialize result for strategy {}", strategy_id))?;
        writer.flush()?;
        writer
            .get_ref()
            .sync_all()
            .with_context(|| format!("Failed to sync result file: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("Failed to move result into place: {}", final_path.display()))?;

        tracing::trace!(file = %name, "stored strategy result");
        Ok(())
    }

    fn keys(&self, run_tag: &RunTag) -> Result<Vec<StrategyId>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(self.area.path()).with_context(|| {
            format!("Failed to list output directory: {}", self.area.path().display())
        })? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((tag, id)) = parse_result_file_name(name) {
                if &tag == run_tag {
                    keys.push(id);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn load(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<StrategyResult> {
        let path = self.entry_path(run_tag, strategy_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.display().to_string()).into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read result file: {}", path.display()));
            }
        };

        serde_json::from_str(&contents).map_err(|source| {
            StoreError::Corrupt {
                key: path.display().to_string(),
                source,
            }
            .into()
        })
    }

    fn remove(&self, run_tag: &RunTag, strategy_id: &StrategyId) -> Result<()> {
        let path = self.entry_path(run_tag, strategy_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove result file: {}", path.display())),
        }
    }

    fn purge_unreadable(&self, run_tag: &RunTag) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.area.path()).with_context(|| {
            format!("Failed to list output directory: {}", self.area.path().display())
        })? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if result_file_tag(name).as_ref() != Some(run_tag) || parse_result_file_name(name).is_some() {
                continue;
            }

            tracing::warn!(run_tag = %run_tag, file = %name, "removing result file with unparseable strategy id");
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove result file: {}", entry.path().display()));
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tag(s: &str) -> RunTag {
        RunTag::new(s).unwrap()
    }

    fn id(s: &str) -> StrategyId {
        StrategyId::parse(s).unwrap()
    }

    #[test]
    fn test_file_name_roundtrip() {
        let name = result_file_name(&tag("run-1"), &id("W-1-0"));
        assert_eq!(name, "strategy_run-1_W-1-0.json");
        assert_eq!(parse_result_file_name(&name), Some((tag("run-1"), id("W-1-0"))));
    }

    #[test]
    fn test_parse_ignores_foreign_files() {
        assert_eq!(parse_result_file_name("notes.txt"), None);
        assert_eq!(parse_result_file_name(".strategy_run-1_1.json.tmp"), None);
        assert_eq!(parse_result_file_name("strategy_run-1_1X.json"), None);
    }

    #[test]
    fn test_prefix_tags_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(OutputArea::prepare(temp_dir.path()).unwrap());

        store.put(&tag("run"), &id("1"), &StrategyResult::with_total(1.0)).unwrap();
        store.put(&tag("run-2"), &id("0"), &StrategyResult::with_total(2.0)).unwrap();

        assert_eq!(store.keys(&tag("run")).unwrap(), vec![id("1")]);
        assert_eq!(store.keys(&tag("run-2")).unwrap(), vec![id("0")]);
    }

    #[test]
    fn test_prepare_clears_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("strategy_old_1.json"), "{}").unwrap();
        fs::write(root.join(".strategy_old_2.json.tmp"), "{").unwrap();

        let area = OutputArea::prepare(&root).unwrap();
        assert_eq!(area.entry_count().unwrap(), 0);
        assert!(!root.join("strategy_old_1.json").exists());
        assert!(!root.join(".strategy_old_2.json.tmp").exists());
    }

    #[test]
    fn test_prepare_keeps_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("thesis.docx"), "chapter one").unwrap();
        fs::write(root.join("leftover.tmp"), "x").unwrap();
        fs::write(root.join("strategy_notes.json"), "{}").unwrap();
        fs::write(root.join("strategy_old_0-1.json"), "{}").unwrap();

        OutputArea::prepare(root).unwrap();

        assert_eq!(fs::read_to_string(root.join("thesis.docx")).unwrap(), "chapter one");
        assert!(root.join("leftover.tmp").exists());
        assert!(root.join("strategy_notes.json").exists());
        assert!(!root.join("strategy_old_0-1.json").exists());
    }

    #[test]
    fn test_is_store_file() {
        assert!(is_store_file("strategy_run-1_W-1.json"));
        assert!(is_store_file(".strategy_run-1_W-1.json.tmp"));
        assert!(!is_store_file("thesis.docx"));
        assert!(!is_store_file(".thesis.docx.tmp"));
        assert!(!is_store_file("strategy_run_1-X.json"));
    }

    #[test]
    fn test_purge_unreadable_only_touches_own_tag() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(OutputArea::prepare(temp_dir.path()).unwrap());
        fs::write(temp_dir.path().join("strategy_run_1-X.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("strategy_other_1-X.json"), "{}").unwrap();
        store.put(&tag("run"), &id("1"), &StrategyResult::with_total(1.0)).unwrap();

        assert_eq!(store.purge_unreadable(&tag("run")).unwrap(), 1);
        assert!(!temp_dir.path().join("strategy_run_1-X.json").exists());
        assert!(temp_dir.path().join("strategy_other_1-X.json").exists());
        assert_eq!(store.count(&tag("run")).unwrap(), 1);
    }

    #[test]
    fn test_prepare_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a").join("b");
        let area = OutputArea::prepare(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(area.path(), root.as_path());
    }

    #[test]
    fn test_put_load_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(OutputArea::prepare(temp_dir.path()).unwrap());

        let mut result = StrategyResult::with_total(12.5);
        result.score_per_period.insert(1, 12.5);
        store.put(&tag("t"), &id("1-0"), &result).unwrap();

        assert_eq!(store.count(&tag("t")).unwrap(), 1);
        assert_eq!(store.load(&tag("t"), &id("1-0")).unwrap(), result);
        // No temp files left behind
        assert_eq!(store.area().entry_count().unwrap(), 1);

        store.remove(&tag("t"), &id("1-0")).unwrap();
        assert_eq!(store.count(&tag("t")).unwrap(), 0);
        // Removing twice is fine
        store.remove(&tag("t"), &id("1-0")).unwrap();
    }

    #[test]
    fn test_load_corrupt_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(OutputArea::prepare(temp_dir.path()).unwrap());
        fs::write(temp_dir.path().join("strategy_t_2.json"), "{not json").unwrap();

        let err = store.load(&tag("t"), &id("2")).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_load_missing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileResultStore::new(OutputArea::prepare(temp_dir.path()).unwrap());
        let err = store.load(&tag("t"), &id("2")).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NotFound(_))));
    }
}
