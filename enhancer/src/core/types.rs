//! Shared types and feedback markers for the enhancement core.

/// Literal phrase the game prints on a confirmed enhancement success.
pub const SUCCESS_MARKER: &str = "강화에 성공";

/// Literal phrase the game prints when the item is destroyed.
pub const DESTROY_MARKER: &str = "강화 파괴";

/// Literal phrase the game prints when the level is kept after a failure.
pub const KEEP_MARKER: &str = "의 레벨이 유지되었습니다";

/// Classified result of one enhancement round.
///
/// [`Waiting`](RoundOutcome::Waiting) and [`Unknown`](RoundOutcome::Unknown)
/// are pending states: the round controller keeps polling while the
/// classifier returns one of them. The other variants resolve the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The enhancement succeeded. Levels are absent when the feedback text
    /// confirmed success but the transition itself could not be parsed.
    Success { from: Option<u32>, to: Option<u32> },
    /// The item was destroyed. `at_level` is absent when no transition was
    /// parsed from the destruction message.
    Destroy { at_level: Option<u32> },
    /// The level survived a failed attempt unchanged.
    Keep { at_level: Option<u32> },
    /// Nothing novel since the round snapshot yet.
    Waiting,
    /// Novel fragments were seen but none of the rules matched.
    Unknown,
}

impl RoundOutcome {
    /// True while the round controller should keep polling.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Waiting | Self::Unknown)
    }
}
