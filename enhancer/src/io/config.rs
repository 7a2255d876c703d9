//! Macro configuration stored in `enhancer.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Enhancement macro configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable.
/// Missing fields default to the values the macro shipped with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnhancerConfig {
    /// Chat room to drive, matched against window titles. May be left empty
    /// and supplied per run on the command line.
    pub chat_room: String,

    /// Chat command that triggers one enhancement attempt.
    pub command: String,

    /// Level at which a run stops.
    pub target_level: u32,

    /// Stop when remaining gold drops below this; 0 disables the check.
    pub gold_floor: u64,

    /// Maximum deviation between a scanned level and the believed level
    /// before the scan is treated as a misread.
    pub trust_window: u32,

    /// Pause between sending the command and the first poll.
    pub settle_delay_ms: u64,

    /// Pause between response polls.
    pub poll_interval_ms: u64,

    /// Give up polling a round after this long.
    pub round_timeout_secs: u64,

    /// Statistics file location.
    pub stats_path: PathBuf,

    /// Recognizer command; the captured image path is appended as the last
    /// argument and recognized fragments are read one per stdout line.
    pub ocr_command: Vec<String>,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            chat_room: String::new(),
            command: "/강화".to_string(),
            target_level: 13,
            gold_floor: 0,
            trust_window: 3,
            settle_delay_ms: 300,
            poll_interval_ms: 400,
            round_timeout_secs: 5,
            stats_path: PathBuf::from("enhance_stats.json"),
            ocr_command: vec!["enhancer-ocr".to_string()],
        }
    }
}

impl EnhancerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(anyhow!("command must not be empty"));
        }
        if self.target_level == 0 {
            return Err(anyhow!("target_level must be > 0"));
        }
        if !(1..=10).contains(&self.trust_window) {
            return Err(anyhow!("trust_window must be between 1 and 10"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.round_timeout_secs == 0 {
            return Err(anyhow!("round_timeout_secs must be > 0"));
        }
        if self.ocr_command.is_empty() || self.ocr_command[0].trim().is_empty() {
            return Err(anyhow!("ocr_command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EnhancerConfig::default()`.
pub fn load_config(path: &Path) -> Result<EnhancerConfig> {
    if !path.exists() {
        let cfg = EnhancerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EnhancerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &EnhancerConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    // A bare relative filename has an empty parent; nothing to create then.
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
