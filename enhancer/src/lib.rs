//! Enhancement macro engine for a chat-game bot.
//!
//! Drives a send/observe loop against a messenger chat window the program
//! does not control: each round sends the enhancement command, captures the
//! chat area, recognizes its text, and infers the outcome purely from the
//! noisy recognized fragments. Outcomes feed per-level statistics and a
//! Monte Carlo projection of long-run prospects.
//!
//! The module layout enforces a strict separation:
//!
//! - [`core`]: pure, deterministic logic (text diffing, pattern parsing,
//!   event classification, level synchronization, statistics). No I/O.
//! - [`io`]: side-effecting adapters (window automation, screen capture and
//!   recognition, configuration, statistics persistence), kept behind traits
//!   so the loop can be scripted in tests.
//! - [`round`] and [`session`]: orchestration of one round and of the whole
//!   run, including stop conditions.
//! - [`cli`]: operator commands on top of the above.

pub mod cancel;
pub mod cli;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod round;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
