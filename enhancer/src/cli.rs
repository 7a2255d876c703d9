//! CLI command implementations.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::cancel::{CancelToken, spawn_stop_listener};
use crate::core::simulate::{DEFAULT_GOAL, DEFAULT_TRIALS, simulate_to_target};
use crate::core::stats::StatsDocument;
use crate::core::sync::SyncAction;
use crate::core::types::RoundOutcome;
use crate::io::automation::{AutomationBackend, OsaScriptBackend};
use crate::io::config::{EnhancerConfig, load_config, write_config};
use crate::io::ocr::CaptureOcr;
use crate::io::stats_store::StatsStore;
use crate::round::RoundTiming;
use crate::session::{
    DEFAULT_JITTER, RoundEvent, Session, SessionConfig, SessionStop, WindowLostError,
};

/// Per-run overrides layered on top of the config file.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub room: Option<String>,
    pub target_level: Option<u32>,
    pub gold_floor: Option<u64>,
}

/// Run the enhancement loop until a stop condition fires.
pub fn run_macro(config_path: &Path, from: u32, overrides: RunOverrides) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, overrides);
    config.validate()?;
    if config.chat_room.is_empty() {
        bail!(
            "no chat room configured: set chat_room in {} or pass --room",
            config_path.display()
        );
    }
    if from >= config.target_level {
        bail!(
            "starting level +{from} is already at or past the target +{}",
            config.target_level
        );
    }

    let backend = OsaScriptBackend::default();
    let ocr = CaptureOcr::new(config.ocr_command.clone())?;

    let window = backend
        .locate(&config.chat_room)?
        .ok_or_else(|| WindowLostError {
            room: config.chat_room.clone(),
        })?;
    debug!(title = %window.title, "chat window located");
    backend.activate(&window).context("activate chat window")?;

    let store = StatsStore::new(&config.stats_path);
    let mut stats = store.load();

    let cancel = CancelToken::new();
    let _listener = spawn_stop_listener(cancel.clone());

    println!(
        "enhancing '{}' from +{from} toward +{}",
        config.chat_room, config.target_level
    );
    if config.gold_floor > 0 {
        println!("gold floor: stop under {}G", format_gold(config.gold_floor));
    } else {
        println!("gold floor: none");
    }
    println!("type 'stop' (or 's') and press enter to end\n");

    let session_config = SessionConfig {
        room: config.chat_room.clone(),
        command: config.command.clone(),
        target_level: config.target_level,
        gold_floor: config.gold_floor,
        trust_window: config.trust_window,
        timing: RoundTiming {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            round_timeout: Duration::from_secs(config.round_timeout_secs),
        },
        jitter: DEFAULT_JITTER,
    };

    let outcome = Session {
        backend: &backend,
        ocr: &ocr,
        store: &store,
        stats: &mut stats,
        window: &window,
        config: &session_config,
        cancel: &cancel,
    }
    .run(from, print_round)?;

    match outcome.stop {
        SessionStop::Cancelled => {
            println!("\nstopped by operator after {} rounds", outcome.rounds);
        }
        SessionStop::TargetReached { level } => {
            println!("\ntarget +{level} reached after {} rounds", outcome.rounds);
        }
        SessionStop::GoldFloor { gold, floor } => {
            println!(
                "\nstopped: {}G remaining is under the {}G floor",
                format_gold(gold),
                format_gold(floor)
            );
        }
    }
    print_stats(&stats);
    Ok(())
}

/// Show the persisted statistics table.
pub fn show_stats(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let stats = StatsStore::new(&config.stats_path).load();
    print_stats(&stats);
    Ok(())
}

/// Project the chance of reaching `goal` from the recorded rates.
pub fn simulate(config_path: &Path, goal: u32, trials: u32) -> Result<()> {
    if goal == 0 {
        bail!("goal must be at least +1");
    }
    if trials == 0 {
        bail!("trials must be at least 1");
    }
    let config = load_config(config_path)?;
    let stats = StatsStore::new(&config.stats_path).load();

    match simulate_to_target(&stats, goal, trials, &mut rand::thread_rng()) {
        Some(projection) => {
            println!(
                "reaching +{goal}: {:.4}% over {trials} trials",
                projection.reach_probability * 100.0
            );
            if let Some(mean) = projection.mean_attempts {
                println!(
                    "average attempts when reached: {}",
                    format_gold(mean.round() as u64)
                );
            }
        }
        None => println!("no statistics recorded yet"),
    }
    Ok(())
}

/// Wipe the persisted statistics.
pub fn reset_stats(config_path: &Path, yes: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let store = StatsStore::new(&config.stats_path);
    if !yes {
        bail!(
            "refusing to reset {} without --yes",
            store.path().display()
        );
    }
    store.save(&StatsDocument::default())?;
    println!("statistics reset: {}", store.path().display());
    Ok(())
}

/// Write a starter config file.
pub fn init_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &EnhancerConfig::default())?;
    println!(
        "wrote {}; set chat_room before running",
        config_path.display()
    );
    Ok(())
}

fn apply_overrides(config: &mut EnhancerConfig, overrides: RunOverrides) {
    if let Some(room) = overrides.room {
        config.chat_room = room;
    }
    if let Some(target) = overrides.target_level {
        config.target_level = target;
    }
    if let Some(floor) = overrides.gold_floor {
        config.gold_floor = floor;
    }
}

/// Per-round progress lines on stdout.
fn print_round(event: &RoundEvent) {
    match event.sync {
        SyncAction::Adopted { from, to } => {
            println!("level scan: +{to} on screen, adjusting +{from} -> +{to}");
        }
        SyncAction::Ignored { scanned, believed } => {
            println!("level scan: ignoring +{scanned} on screen (believed +{believed})");
        }
        SyncAction::Unchanged | SyncAction::Skipped => {}
    }

    let round = event.round;
    match event.report.outcome {
        RoundOutcome::Success {
            from: Some(from),
            to: Some(to),
        } => {
            println!("round {round}: +{from} -> +{to} success");
        }
        RoundOutcome::Success { .. } => {
            println!(
                "round {round}: success (estimated +{})",
                event.believed_after
            );
        }
        RoundOutcome::Destroy { at_level } => {
            println!(
                "round {round}: destroyed at +{}, back to +0",
                at_level.unwrap_or(event.believed_before)
            );
        }
        RoundOutcome::Keep { at_level } => {
            println!(
                "round {round}: level kept at +{}",
                at_level.unwrap_or(event.believed_before)
            );
        }
        RoundOutcome::Waiting | RoundOutcome::Unknown => {
            println!("round {round}: no confirmed outcome");
        }
    }
    if let Some(gold) = event.report.gold {
        println!("  remaining gold: {}G", format_gold(gold));
    }
}

/// Render the statistics table on stdout.
fn print_stats(stats: &StatsDocument) {
    let rule = "=".repeat(55);
    println!("\n{rule}");
    println!("  enhancement statistics");
    println!("{rule}");
    println!("  total attempts: {}", stats.total_attempts);
    println!("  total destroys: {}", stats.total_destroys);
    println!("  highest level: +{}", stats.max_level_reached);

    if !stats.level_stats.is_empty() {
        println!("\n  [success rate by level]");
        println!("  {}", "-".repeat(51));
        for (level, record) in &stats.level_stats {
            if *level >= DEFAULT_GOAL {
                continue;
            }
            let Some(rate) = stats.success_rate(*level) else {
                continue;
            };
            let pct = rate * 100.0;
            let filled = (pct / 5.0) as usize;
            println!(
                "  +{:2}->+{:2}: [{}{}] {:5.1}% ({}/{})",
                level,
                level + 1,
                "#".repeat(filled),
                "-".repeat(20 - filled),
                pct,
                record.success,
                record.total()
            );
        }

        println!("\n  [projection to +{DEFAULT_GOAL}]");
        if let Some(projection) =
            simulate_to_target(stats, DEFAULT_GOAL, DEFAULT_TRIALS, &mut rand::thread_rng())
            && projection.reach_probability > 0.0
            && let Some(mean) = projection.mean_attempts
        {
            println!(
                "  success rate: {:.4}%, average attempts: {}",
                projection.reach_probability * 100.0,
                format_gold(mean.round() as u64)
            );
        }
    }
    println!("{rule}\n");
}

/// Group digits in threes: `1234567` renders as `1,234,567`.
fn format_gold(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_gold_groups_digits() {
        assert_eq!(format_gold(0), "0");
        assert_eq!(format_gold(999), "999");
        assert_eq!(format_gold(1_000), "1,000");
        assert_eq!(format_gold(12_345), "12,345");
        assert_eq!(format_gold(1_234_567), "1,234,567");
    }

    #[test]
    fn overrides_replace_only_provided_fields() {
        let mut config = EnhancerConfig::default();
        apply_overrides(
            &mut config,
            RunOverrides {
                room: Some("강화방".to_string()),
                target_level: None,
                gold_floor: Some(5_000),
            },
        );

        assert_eq!(config.chat_room, "강화방");
        assert_eq!(config.target_level, EnhancerConfig::default().target_level);
        assert_eq!(config.gold_floor, 5_000);
    }

    #[test]
    fn empty_overrides_leave_config_untouched() {
        let mut config = EnhancerConfig {
            chat_room: "방".to_string(),
            ..EnhancerConfig::default()
        };
        apply_overrides(&mut config, RunOverrides::default());
        assert_eq!(config.chat_room, "방");
    }
}
