//! Deterministic, pure logic shared by the macro engine.
//!
//! Core modules must be free of I/O side effects. They operate on recognized
//! text and in-memory state and return deterministic outputs suitable for
//! tests.

pub mod classify;
pub mod diff;
pub mod parse;
pub mod simulate;
pub mod stats;
pub mod sync;
pub mod types;
