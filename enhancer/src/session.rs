//! Session loop: stop conditions, level synchronization, statistics.

use std::fmt;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::core::stats::StatsDocument;
use crate::core::sync::{LevelSync, SyncAction};
use crate::core::types::RoundOutcome;
use crate::io::automation::{AutomationBackend, WindowHandle};
use crate::io::ocr::{OcrService, observe_or_empty};
use crate::io::stats_store::StatsStore;
use crate::round::{RoundInput, RoundReport, RoundTiming, run_round};

/// Bounds of the randomized pause between rounds.
pub const DEFAULT_JITTER: (Duration, Duration) =
    (Duration::from_millis(300), Duration::from_millis(500));

/// The configured chat window could not be found or measured.
#[derive(Debug, Clone)]
pub struct WindowLostError {
    pub room: String,
}

impl fmt::Display for WindowLostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat window matching '{}' not found", self.room)
    }
}

impl std::error::Error for WindowLostError {}

/// Why a session ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStop {
    /// Operator requested a stop.
    Cancelled,
    /// Believed level reached the configured target.
    TargetReached { level: u32 },
    /// Sticky gold estimate fell below the configured floor.
    GoldFloor { gold: u64, floor: u64 },
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub rounds: u32,
    pub stop: SessionStop,
    pub final_level: u32,
    pub last_gold: Option<u64>,
}

/// Knobs for one session, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub room: String,
    pub command: String,
    pub target_level: u32,
    /// 0 disables the gold stop condition.
    pub gold_floor: u64,
    pub trust_window: u32,
    pub timing: RoundTiming,
    /// Inclusive bounds of the randomized inter-round pause.
    pub jitter: (Duration, Duration),
}

/// Per-round progress handed to the caller's callback.
#[derive(Debug, Clone)]
pub struct RoundEvent {
    /// 1-based round counter.
    pub round: u32,
    /// What the pre-round reconcile did.
    pub sync: SyncAction,
    /// Believed level when the command was sent (after reconcile).
    pub believed_before: u32,
    pub report: RoundReport,
    /// Believed level after outcome application and any timeout resync.
    pub believed_after: u32,
    /// Whether this round updated the statistics.
    pub recorded: bool,
}

/// One enhancement run against a located chat window.
///
/// Owns no collaborator; everything is borrowed so tests can script the
/// backend and recognizer and inspect the statistics afterwards.
pub struct Session<'a, A: AutomationBackend, O: OcrService> {
    pub backend: &'a A,
    pub ocr: &'a O,
    pub store: &'a StatsStore,
    pub stats: &'a mut StatsDocument,
    pub window: &'a WindowHandle,
    pub config: &'a SessionConfig,
    pub cancel: &'a CancelToken,
}

impl<A: AutomationBackend, O: OcrService> Session<'_, A, O> {
    /// Run rounds until a stop condition fires or the window is lost.
    ///
    /// Stop conditions are checked at the top of every round, so the
    /// outcome of the round that satisfied one is always applied and
    /// recorded first. Statistics are persisted after every terminal
    /// outcome; a persistence failure aborts the run.
    pub fn run<F>(mut self, start_level: u32, mut on_round: F) -> Result<SessionOutcome>
    where
        F: FnMut(&RoundEvent),
    {
        let mut sync = LevelSync::new(start_level, self.config.trust_window);
        let mut last_gold: Option<u64> = None;
        let mut rounds = 0u32;
        let mut rng = rand::thread_rng();

        info!(
            room = %self.config.room,
            target = self.config.target_level,
            start_level,
            "session started"
        );

        loop {
            if self.cancel.is_cancelled() {
                info!(rounds, "session cancelled by operator");
                return Ok(self.outcome(rounds, SessionStop::Cancelled, &sync, last_gold));
            }
            if sync.believed() >= self.config.target_level {
                return Ok(self.target_reached(rounds, &sync, last_gold));
            }
            if self.config.gold_floor > 0
                && let Some(gold) = last_gold
                && gold < self.config.gold_floor
            {
                info!(gold, floor = self.config.gold_floor, "gold floor reached");
                let stop = SessionStop::GoldFloor {
                    gold,
                    floor: self.config.gold_floor,
                };
                return Ok(self.outcome(rounds, stop, &sync, last_gold));
            }

            let bounds = self
                .backend
                .bounds(self.window)?
                .ok_or_else(|| WindowLostError {
                    room: self.config.room.clone(),
                })?;
            let region = bounds.chat_region();

            // Pre-round scan keeps the believed level honest before sending.
            let observation = observe_or_empty(self.ocr, &region);
            let action = sync.reconcile(&observation);
            match action {
                SyncAction::Adopted { from, to } => {
                    info!(from, to, "adopted forward level from screen scan");
                }
                SyncAction::Ignored { scanned, believed } => {
                    debug!(scanned, believed, "ignored backward scan, likely misread");
                }
                SyncAction::Skipped => {
                    debug!("skipped scan on the round after a destruction");
                }
                SyncAction::Unchanged => {}
            }

            if sync.believed() >= self.config.target_level {
                return Ok(self.target_reached(rounds, &sync, last_gold));
            }

            let believed_before = sync.believed();
            debug!(
                level = believed_before,
                gold = ?last_gold,
                "sending enhancement command"
            );
            let input = RoundInput {
                window: self.window,
                region,
                command: &self.config.command,
                snapshot: &observation,
                believed_level: believed_before,
            };
            let report = run_round(self.backend, self.ocr, &input, &self.config.timing)?;
            rounds += 1;

            if let Some(gold) = report.gold {
                info!(gold, "remaining gold");
                last_gold = Some(gold);
            }

            let recorded = self.apply_outcome(&mut sync, &report.outcome, believed_before)?;

            if let Some(level) = report.resync_level
                && level != sync.believed()
            {
                info!(
                    from = sync.believed(),
                    to = level,
                    "resynced level from bracket marker after timeout"
                );
                sync.force(level);
            }

            on_round(&RoundEvent {
                round: rounds,
                sync: action,
                believed_before,
                report,
                believed_after: sync.believed(),
                recorded,
            });

            if sync.believed() >= self.config.target_level {
                return Ok(self.target_reached(rounds, &sync, last_gold));
            }

            let (lo, hi) = self.config.jitter;
            thread::sleep(rng.gen_range(lo..=hi));
        }
    }

    /// Record a terminal outcome and move the believed level.
    ///
    /// Returns whether statistics were updated. A success without parsed
    /// levels moves the level one step but records nothing, since guessing
    /// the starting level would poison the per-level rates.
    fn apply_outcome(
        &mut self,
        sync: &mut LevelSync,
        outcome: &RoundOutcome,
        believed_before: u32,
    ) -> Result<bool> {
        let recorded = match outcome {
            RoundOutcome::Success {
                from: Some(from),
                to: Some(to),
            } => {
                self.stats.record_success(*from, *to);
                self.store.save(self.stats)?;
                info!(from, to, "enhancement succeeded");
                true
            }
            RoundOutcome::Success { .. } => {
                info!(
                    level = believed_before + 1,
                    "enhancement succeeded (estimated level)"
                );
                false
            }
            RoundOutcome::Destroy { at_level } => {
                let at = at_level.unwrap_or(believed_before);
                self.stats.record_destroy(at);
                self.store.save(self.stats)?;
                warn!(at_level = at, "item destroyed, level reset to 0");
                true
            }
            RoundOutcome::Keep { at_level } => {
                info!(
                    level = at_level.unwrap_or(believed_before),
                    "level kept"
                );
                false
            }
            RoundOutcome::Waiting | RoundOutcome::Unknown => {
                info!("round ended without a confirmed outcome");
                false
            }
        };
        sync.apply(outcome);
        Ok(recorded)
    }

    fn target_reached(
        &self,
        rounds: u32,
        sync: &LevelSync,
        last_gold: Option<u64>,
    ) -> SessionOutcome {
        info!(level = sync.believed(), rounds, "target level reached");
        self.outcome(
            rounds,
            SessionStop::TargetReached {
                level: sync.believed(),
            },
            sync,
            last_gold,
        )
    }

    fn outcome(
        &self,
        rounds: u32,
        stop: SessionStop,
        sync: &LevelSync,
        last_gold: Option<u64>,
    ) -> SessionOutcome {
        SessionOutcome {
            rounds,
            stop,
            final_level: sync.believed(),
            last_gold,
        }
    }
}
