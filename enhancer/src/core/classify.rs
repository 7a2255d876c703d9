//! Round outcome classification from recognized chat text.

use crate::core::diff::novel_fragments;
use crate::core::parse::parse_transition;
use crate::core::types::{DESTROY_MARKER, KEEP_MARKER, RoundOutcome, SUCCESS_MARKER};

/// Alternate success phrasings the game uses for streaks and notable levels.
const ALT_SUCCESS_MARKERS: [&str; 2] = ["강화 성공", "속보"];

/// Rendered level marker after a destruction.
const DESTROYED_BRACKET: &str = "[+0]";

/// Classify one round from the newest observation against the round snapshot.
///
/// Only fragments novel since `prior` are considered; an empty novel set is
/// [`RoundOutcome::Waiting`]. The rule order is a contract, most specific
/// signal first:
///
/// 1. explicit success marker
/// 2. explicit destruction marker
/// 3. keep marker
/// 4. alternate success phrasing (transition inferred from `believed_level`
///    when none was parsed)
/// 5. the `[+0]` destruction fallback
/// 6. a parsed strictly-forward transition
/// 7. the same, re-parsed from the full observation (fragments occasionally
///    vanish from the novel set between polls)
///
/// Anything else is [`RoundOutcome::Unknown`].
pub fn classify(new: &[String], prior: &[String], believed_level: u32) -> RoundOutcome {
    let novel = novel_fragments(new, prior);
    if novel.is_empty() {
        return RoundOutcome::Waiting;
    }
    let combined = novel.join(" ");
    let transition = parse_transition(&novel);
    let (from, to) = match transition {
        Some((from, to)) => (Some(from), Some(to)),
        None => (None, None),
    };

    if combined.contains(SUCCESS_MARKER) {
        return RoundOutcome::Success { from, to };
    }
    if combined.contains(DESTROY_MARKER) {
        return RoundOutcome::Destroy { at_level: from };
    }
    if combined.contains(KEEP_MARKER) {
        return RoundOutcome::Keep { at_level: from };
    }
    if ALT_SUCCESS_MARKERS
        .iter()
        .any(|marker| combined.contains(marker))
    {
        return match transition {
            Some((from, to)) => RoundOutcome::Success {
                from: Some(from),
                to: Some(to),
            },
            None => RoundOutcome::Success {
                from: Some(believed_level),
                to: Some(believed_level + 1),
            },
        };
    }
    if combined.contains(DESTROYED_BRACKET) {
        return RoundOutcome::Destroy { at_level: from };
    }
    if let Some((from, to)) = transition
        && to > from
    {
        return RoundOutcome::Success {
            from: Some(from),
            to: Some(to),
        };
    }
    if let Some((from, to)) = parse_transition(new)
        && to > from
    {
        return RoundOutcome::Success {
            from: Some(from),
            to: Some(to),
        };
    }
    RoundOutcome::Unknown
}
