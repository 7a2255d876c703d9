//! Believed-level synchronization against on-screen scans.
//!
//! The game's own display is authoritative when it shows forward progress.
//! A smaller scanned level is far more likely a misread digit than a real
//! regression, so the believed level never moves backward from a scan alone;
//! only a confirmed destruction resets it.

use crate::core::parse::scan_current_level;
use crate::core::types::RoundOutcome;

/// What a pre-round reconcile did, reported for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// The scan showed forward progress and the believed level adopted it.
    Adopted { from: u32, to: u32 },
    /// The scan produced a smaller level; kept the believed level.
    Ignored { scanned: u32, believed: u32 },
    /// The scan matched the believed level or produced no usable candidate.
    Unchanged,
    /// Reconcile was skipped for the round following a destruction.
    Skipped,
}

/// Best running estimate of the target item's enhancement level.
#[derive(Debug, Clone)]
pub struct LevelSync {
    believed: u32,
    trust_window: u32,
    skip_next_scan: bool,
}

impl LevelSync {
    pub fn new(start_level: u32, trust_window: u32) -> Self {
        Self {
            believed: start_level,
            trust_window,
            skip_next_scan: false,
        }
    }

    pub fn believed(&self) -> u32 {
        self.believed
    }

    /// Reconcile against a fresh pre-round observation.
    ///
    /// Skipped for exactly one call after a destruction: the destruction
    /// message still shows the pre-destruction level on screen and would
    /// cause a false forward adoption.
    pub fn reconcile(&mut self, observation: &[String]) -> SyncAction {
        if self.skip_next_scan {
            self.skip_next_scan = false;
            return SyncAction::Skipped;
        }
        let Some(scanned) =
            scan_current_level(observation, Some(self.believed), self.trust_window)
        else {
            return SyncAction::Unchanged;
        };
        if scanned > self.believed {
            let from = self.believed;
            self.believed = scanned;
            return SyncAction::Adopted { from, to: scanned };
        }
        if scanned < self.believed {
            return SyncAction::Ignored {
                scanned,
                believed: self.believed,
            };
        }
        SyncAction::Unchanged
    }

    /// Apply a resolved round outcome to the believed level.
    ///
    /// A success without a parsed target level counts as a single step
    /// forward; a destruction always resets to zero and arms the scan skip.
    pub fn apply(&mut self, outcome: &RoundOutcome) {
        match outcome {
            RoundOutcome::Success { to: Some(to), .. } => self.believed = *to,
            RoundOutcome::Success { to: None, .. } => self.believed += 1,
            RoundOutcome::Destroy { .. } => {
                self.believed = 0;
                self.skip_next_scan = true;
            }
            RoundOutcome::Keep { .. } | RoundOutcome::Waiting | RoundOutcome::Unknown => {}
        }
    }

    /// Unconditionally adopt a level recovered by the round-timeout resync.
    pub fn force(&mut self, level: u32) {
        self.believed = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fragments: &[&str]) -> Vec<String> {
        fragments.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn adopts_forward_scan() {
        let mut sync = LevelSync::new(3, 3);
        let action = sync.reconcile(&frame(&["무기 [+5]"]));
        assert_eq!(action, SyncAction::Adopted { from: 3, to: 5 });
        assert_eq!(sync.believed(), 5);
    }

    #[test]
    fn ignores_backward_scan() {
        let mut sync = LevelSync::new(5, 3);
        let action = sync.reconcile(&frame(&["무기 [+3]"]));
        assert_eq!(
            action,
            SyncAction::Ignored {
                scanned: 3,
                believed: 5
            }
        );
        assert_eq!(sync.believed(), 5);
    }

    #[test]
    fn matching_scan_is_unchanged() {
        let mut sync = LevelSync::new(4, 3);
        assert_eq!(sync.reconcile(&frame(&["[+4]"])), SyncAction::Unchanged);
        assert_eq!(sync.believed(), 4);
    }

    #[test]
    fn unusable_scan_is_unchanged() {
        let mut sync = LevelSync::new(4, 3);
        assert_eq!(sync.reconcile(&frame(&["잡담"])), SyncAction::Unchanged);
        // Outside the trust window entirely.
        assert_eq!(sync.reconcile(&frame(&["[+15]"])), SyncAction::Unchanged);
    }

    #[test]
    fn destruction_resets_and_skips_exactly_one_scan() {
        let mut sync = LevelSync::new(7, 3);
        sync.apply(&RoundOutcome::Destroy { at_level: Some(7) });
        assert_eq!(sync.believed(), 0);

        // The destruction screen still shows the old level; must not adopt.
        let stale = frame(&["무기 [+7] 강화 파괴", "+7 → +0"]);
        assert_eq!(sync.reconcile(&stale), SyncAction::Skipped);
        assert_eq!(sync.believed(), 0);

        // Next round scans normally again.
        assert_eq!(
            sync.reconcile(&frame(&["[+1]"])),
            SyncAction::Adopted { from: 0, to: 1 }
        );
    }

    #[test]
    fn success_with_level_adopts_it() {
        let mut sync = LevelSync::new(4, 3);
        sync.apply(&RoundOutcome::Success {
            from: Some(4),
            to: Some(5),
        });
        assert_eq!(sync.believed(), 5);
    }

    #[test]
    fn success_without_level_steps_forward() {
        let mut sync = LevelSync::new(4, 3);
        sync.apply(&RoundOutcome::Success {
            from: None,
            to: None,
        });
        assert_eq!(sync.believed(), 5);
    }

    #[test]
    fn keep_and_pending_outcomes_leave_level_alone() {
        let mut sync = LevelSync::new(4, 3);
        sync.apply(&RoundOutcome::Keep { at_level: Some(4) });
        sync.apply(&RoundOutcome::Waiting);
        sync.apply(&RoundOutcome::Unknown);
        assert_eq!(sync.believed(), 4);
    }

    #[test]
    fn force_overrides_in_both_directions() {
        let mut sync = LevelSync::new(9, 3);
        sync.force(2);
        assert_eq!(sync.believed(), 2);
        sync.force(11);
        assert_eq!(sync.believed(), 11);
    }
}
