//! Pattern parsers over recognized chat text.
//!
//! All parsers join their input fragments with a single space before
//! matching: recognition regularly splits one chat line into several
//! fragments, and a pattern straddling a split must still match.

use std::sync::LazyLock;

use crate::core::types::SUCCESS_MARKER;

/// Arrow renderings the recognizer produces for the same semantic arrow,
/// in match-precedence order.
static ARROW_PATTERNS: LazyLock<[regex::Regex; 3]> = LazyLock::new(|| {
    [
        regex::Regex::new(r"\+(\d+)\s*→\s*\+(\d+)").unwrap(),
        regex::Regex::new(r"\+(\d+)\s*->\s*\+(\d+)").unwrap(),
        regex::Regex::new(r"\+(\d+)\s*▶\s*\+(\d+)").unwrap(),
    ]
});

/// Bracketed level marker the game shows next to the item name, e.g. `[+7]`.
static BRACKET_LEVEL: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\[\+(\d+)\]").unwrap());

/// Remaining-gold line, tolerant of missing spaces and the fullwidth colon.
static REMAINING_GOLD: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"남은\s*골드\s*[:：]\s*([0-9,]+)\s*G").unwrap());

fn join<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capture_u32(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

/// Parse a level transition `+A <arrow> +B` from the fragments.
///
/// Arrow patterns are tried in precedence order; the first pattern that
/// matches anywhere wins, using its first match. When no arrow is present
/// but the text carries success phrasing next to a bracketed `[+N]` marker,
/// the transition is inferred as `(N-1, N)`.
pub fn parse_transition<S: AsRef<str>>(fragments: &[S]) -> Option<(u32, u32)> {
    let combined = join(fragments);
    for pattern in &*ARROW_PATTERNS {
        if let Some(caps) = pattern.captures(&combined) {
            let from = capture_u32(&caps, 1)?;
            let to = capture_u32(&caps, 2)?;
            return Some((from, to));
        }
    }
    if combined.contains(SUCCESS_MARKER) || combined.contains("성공하셨습니다") {
        let to = BRACKET_LEVEL
            .captures(&combined)
            .and_then(|caps| capture_u32(&caps, 1))?;
        let from = to.checked_sub(1)?;
        return Some((from, to));
    }
    None
}

/// Scan an observation for the current enhancement level.
///
/// Arrow expressions are the strongest signal: the last right-hand value
/// across all arrow patterns is the candidate, and it is discarded outright
/// when it deviates from `reference` by more than `trust_window` (likely a
/// digit misread; deliberately no bracket fallback in that case). Without
/// any arrow, the maximum surviving `[+N]` marker is used instead, after
/// dropping candidates outside the trust window. An empty survivor set
/// yields `None` rather than a guess.
pub fn scan_current_level<S: AsRef<str>>(
    fragments: &[S],
    reference: Option<u32>,
    trust_window: u32,
) -> Option<u32> {
    let combined = join(fragments);

    let mut arrow_to = None;
    for pattern in &*ARROW_PATTERNS {
        for caps in pattern.captures_iter(&combined) {
            if let Some(to) = capture_u32(&caps, 2) {
                arrow_to = Some(to);
            }
        }
    }
    if let Some(to) = arrow_to {
        if let Some(current) = reference
            && to.abs_diff(current) > trust_window
        {
            return None;
        }
        return Some(to);
    }

    let mut candidates: Vec<u32> = BRACKET_LEVEL
        .captures_iter(&combined)
        .filter_map(|caps| capture_u32(&caps, 1))
        .collect();
    if let Some(current) = reference {
        candidates.retain(|&level| level.abs_diff(current) <= trust_window);
    }
    candidates.into_iter().max()
}

/// First `[+N]` marker in the fragments, with no trust filtering.
///
/// Used by the round-timeout resync, where the believed level itself may be
/// stale and filtering against it would defeat the recovery.
pub fn first_bracket_level<S: AsRef<str>>(fragments: &[S]) -> Option<u32> {
    let combined = join(fragments);
    BRACKET_LEVEL
        .captures(&combined)
        .and_then(|caps| capture_u32(&caps, 1))
}

/// Parse the remaining-gold line (`남은 골드: 273,400,000G`), stripping the
/// grouping separators.
pub fn parse_remaining_gold<S: AsRef<str>>(fragments: &[S]) -> Option<u64> {
    let combined = join(fragments);
    let caps = REMAINING_GOLD.captures(&combined)?;
    caps.get(1)?.as_str().replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_parses_unicode_arrow() {
        assert_eq!(parse_transition(&["+3 → +4"]), Some((3, 4)));
    }

    #[test]
    fn transition_parses_ascii_and_triangle_arrows() {
        assert_eq!(parse_transition(&["+3 -> +4"]), Some((3, 4)));
        assert_eq!(parse_transition(&["+7▶+8"]), Some((7, 8)));
    }

    #[test]
    fn transition_spans_fragment_boundaries() {
        // Recognition often splits the expression around the arrow.
        assert_eq!(parse_transition(&["+3", "→ +4"]), Some((3, 4)));
    }

    #[test]
    fn transition_prefers_earlier_arrow_pattern() {
        // The unicode arrow pattern is tried first even when an ascii arrow
        // appears earlier in the text.
        assert_eq!(
            parse_transition(&["+1 -> +2 그리고 +5 → +6"]),
            Some((5, 6))
        );
    }

    #[test]
    fn transition_inferred_from_success_phrase_and_bracket() {
        assert_eq!(
            parse_transition(&["강화에 성공했습니다!", "무기 [+5]"]),
            Some((4, 5))
        );
        assert_eq!(
            parse_transition(&["+6 강화에 성공하셨습니다 [+6]"]),
            Some((5, 6))
        );
    }

    #[test]
    fn transition_bracket_without_success_phrase_is_no_match() {
        assert_eq!(parse_transition(&["무기 [+5]"]), None);
    }

    #[test]
    fn transition_absent_returns_none() {
        assert_eq!(parse_transition(&["강화 실패"]), None);
        assert_eq!(parse_transition::<&str>(&[]), None);
    }

    #[test]
    fn scan_uses_last_arrow_target() {
        let fragments = ["+2 → +3", "+3 → +4"];
        assert_eq!(scan_current_level(&fragments, Some(3), 3), Some(4));
    }

    #[test]
    fn scan_discards_arrow_outside_trust_window() {
        // An arrow target far from the believed level is a misread; no
        // bracket fallback applies on this path.
        let fragments = ["+17 → +18", "무기 [+3]"];
        assert_eq!(scan_current_level(&fragments, Some(3), 3), None);
    }

    #[test]
    fn scan_falls_back_to_max_bracket() {
        let fragments = ["무기 [+2]", "방어구 [+4]"];
        assert_eq!(scan_current_level(&fragments, Some(3), 3), Some(4));
    }

    #[test]
    fn scan_filters_brackets_by_trust_window() {
        // Reference 3 with window 3 keeps 2 and drops 9.
        let fragments = ["[+2]", "[+9]"];
        assert_eq!(scan_current_level(&fragments, Some(3), 3), Some(2));
    }

    #[test]
    fn scan_without_reference_keeps_all_candidates() {
        let fragments = ["[+2]", "[+9]"];
        assert_eq!(scan_current_level(&fragments, None, 3), Some(9));
    }

    #[test]
    fn scan_with_no_survivors_returns_none() {
        assert_eq!(scan_current_level(&["[+19]"], Some(3), 3), None);
        assert_eq!(scan_current_level(&["아무 텍스트"], Some(3), 3), None);
    }

    #[test]
    fn first_bracket_ignores_trust_window() {
        assert_eq!(first_bracket_level(&["[+19]", "[+2]"]), Some(19));
        assert_eq!(first_bracket_level(&["없음"]), None);
    }

    #[test]
    fn gold_parses_with_separators_and_spacing() {
        assert_eq!(
            parse_remaining_gold(&["남은 골드: 273,400,000G"]),
            Some(273_400_000)
        );
        assert_eq!(parse_remaining_gold(&["남은골드:1000G"]), Some(1000));
        assert_eq!(
            parse_remaining_gold(&["남은 골드 ： 12,345 G"]),
            Some(12_345)
        );
    }

    #[test]
    fn gold_absent_returns_none() {
        assert_eq!(parse_remaining_gold(&["골드가 없습니다"]), None);
    }
}
