//! Novel-text extraction between successive observations.

/// Fragments present in `new` but absent from `prior`.
///
/// Order follows `new` (recognition order) and duplicates in `new` are kept:
/// the game repeats identical lines and a repeated line since the snapshot is
/// still novel information. Matching is whole-fragment equality; recognition
/// noise is tolerated downstream by substring matchers, not here.
pub fn novel_fragments<'a>(new: &'a [String], prior: &[String]) -> Vec<&'a str> {
    new.iter()
        .filter(|fragment| !prior.contains(*fragment))
        .map(String::as_str)
        .collect()
}
