//! Statistics persistence (`enhance_stats.json`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::stats::StatsDocument;

/// Durable home of the statistics document.
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, degrading to the empty default on a missing,
    /// unreadable or corrupt file. History is best-effort and must never
    /// block a run from starting.
    pub fn load(&self) -> StatsDocument {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), err = %err, "no readable stats file, starting empty");
                return StatsDocument::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(stats) => stats,
            Err(err) => {
                warn!(path = %self.path.display(), err = %err, "corrupt stats file, starting empty");
                StatsDocument::default()
            }
        }
    }

    /// Atomically write the document (temp file + rename).
    pub fn save(&self, stats: &StatsDocument) -> Result<()> {
        debug!(path = %self.path.display(), attempts = stats.total_attempts, "writing stats");
        let mut buf = serde_json::to_string_pretty(stats)?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    // A bare relative filename has an empty parent; nothing to create then.
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp stats {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace stats {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StatsStore::new(temp.path().join("enhance_stats.json"));

        let mut stats = StatsDocument::default();
        stats.record_success(4, 5);
        stats.record_destroy(5);

        store.save(&stats).expect("save");
        assert_eq!(store.load(), stats);
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StatsStore::new(temp.path().join("missing.json"));
        assert_eq!(store.load(), StatsDocument::default());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("enhance_stats.json");
        fs::write(&path, "{not json").expect("write");

        let store = StatsStore::new(&path);
        assert_eq!(store.load(), StatsDocument::default());
    }

    #[test]
    fn load_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = StatsStore::new(temp.path().join("enhance_stats.json"));

        let mut stats = StatsDocument::default();
        stats.record_success(0, 1);
        store.save(&stats).expect("save");

        assert_eq!(store.load(), store.load());
    }

    #[test]
    fn save_load_save_is_byte_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("enhance_stats.json");
        let store = StatsStore::new(&path);

        let mut stats = StatsDocument::default();
        stats.record_success(2, 3);
        stats.record_destroy(3);
        store.save(&stats).expect("first save");
        let first = fs::read(&path).expect("read");

        store.save(&store.load()).expect("second save");
        assert_eq!(fs::read(&path).expect("read"), first);
    }

    #[test]
    fn on_disk_level_keys_are_decimal_strings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("enhance_stats.json");
        let store = StatsStore::new(&path);

        let mut stats = StatsDocument::default();
        stats.record_destroy(7);
        store.save(&stats).expect("save");

        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\"7\""));
    }
}
