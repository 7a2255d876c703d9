//! One enhancement round: send, settle, poll, classify.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::classify::classify;
use crate::core::diff::novel_fragments;
use crate::core::parse::{first_bracket_level, parse_remaining_gold};
use crate::core::types::RoundOutcome;
use crate::io::automation::{AutomationBackend, CaptureRegion, WindowHandle};
use crate::io::ocr::{OcrService, observe_or_empty};

/// Timing knobs for one round, taken from the loaded config.
#[derive(Debug, Clone, Copy)]
pub struct RoundTiming {
    pub settle_delay: Duration,
    pub poll_interval: Duration,
    pub round_timeout: Duration,
}

/// Everything a single round needs besides the collaborators.
#[derive(Debug)]
pub struct RoundInput<'a> {
    pub window: &'a WindowHandle,
    pub region: CaptureRegion,
    pub command: &'a str,
    /// Observation taken just before the round; the novelty baseline.
    pub snapshot: &'a [String],
    pub believed_level: u32,
}

/// Report of one completed round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub outcome: RoundOutcome,
    /// Raw bracket level recovered after a timeout, for resynchronization.
    /// Only set when the round ended still pending.
    pub resync_level: Option<u32>,
    /// Remaining gold parsed from this round's novel fragments, if shown.
    pub gold: Option<u64>,
    pub polls: u32,
    /// Time spent in the poll loop.
    pub elapsed: Duration,
}

/// Send the enhancement command, then poll the chat area until the
/// classifier resolves the round or the round times out. The timeout
/// covers only the polling phase: send and settle time is not counted,
/// so slow window automation cannot shrink the response window.
///
/// Sending is the only hard failure here; observation failures degrade to
/// empty frames and the poll simply continues.
pub fn run_round<A: AutomationBackend, O: OcrService>(
    backend: &A,
    ocr: &O,
    input: &RoundInput<'_>,
    timing: &RoundTiming,
) -> Result<RoundReport> {
    backend
        .send_text(input.window, input.command)
        .context("send enhancement command")?;
    thread::sleep(timing.settle_delay);

    let start = Instant::now();
    let mut outcome = RoundOutcome::Waiting;
    let mut observation = input.snapshot.to_vec();
    let mut polls = 0u32;
    while outcome.is_pending() && start.elapsed() < timing.round_timeout {
        thread::sleep(timing.poll_interval);
        observation = observe_or_empty(ocr, &input.region);
        outcome = classify(&observation, input.snapshot, input.believed_level);
        polls += 1;
        debug!(?outcome, polls, "round poll");
    }

    let novel = novel_fragments(&observation, input.snapshot);
    let gold = parse_remaining_gold(&novel);

    // Still pending past the deadline: the response may have scrolled by
    // unrecognized, so recover a level from a raw bracket marker if any.
    let resync_level = if outcome.is_pending() {
        first_bracket_level(&observation)
    } else {
        None
    };

    Ok(RoundReport {
        outcome,
        resync_level,
        gold,
        polls,
        elapsed: start.elapsed(),
    })
}
