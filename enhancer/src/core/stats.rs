//! Per-level enhancement statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Success/fail counters for attempts made from one starting level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRecord {
    pub success: u64,
    pub fail: u64,
}

impl LevelRecord {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }
}

/// Persisted statistics document (`enhance_stats.json`).
///
/// `level_stats` keys serialize as canonical decimal strings at the JSON
/// boundary; in memory they are plain levels. The map is ordered so reports
/// and serialized output list levels ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsDocument {
    pub level_stats: BTreeMap<u32, LevelRecord>,
    pub total_attempts: u64,
    pub total_destroys: u64,
    pub max_level_reached: u32,
}

impl StatsDocument {
    /// Record a confirmed success `from -> to`.
    pub fn record_success(&mut self, from: u32, to: u32) {
        self.level_stats.entry(from).or_default().success += 1;
        self.total_attempts += 1;
        if to > self.max_level_reached {
            self.max_level_reached = to;
        }
    }

    /// Record a confirmed destruction of an item at `at_level`.
    pub fn record_destroy(&mut self, at_level: u32) {
        self.level_stats.entry(at_level).or_default().fail += 1;
        self.total_attempts += 1;
        self.total_destroys += 1;
    }

    /// Empirical success rate for attempts from `level`, or `None` without
    /// any recorded attempts there.
    pub fn success_rate(&self, level: u32) -> Option<f64> {
        let record = self.level_stats.get(&level)?;
        let total = record.total();
        if total == 0 {
            return None;
        }
        Some(record.success as f64 / total as f64)
    }
}
