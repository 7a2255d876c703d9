//! Stable exit codes for enhancer CLI commands.

/// Command succeeded or a run ended on a clean stop condition.
pub const OK: i32 = 0;
/// Command failed due to invalid config/arguments, persistence failure, or other errors.
pub const INVALID: i32 = 1;
/// The target chat window could not be found or was lost mid-run.
pub const UNREACHABLE: i32 = 2;
