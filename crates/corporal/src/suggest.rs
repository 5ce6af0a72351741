//! "Did you mean" lookup for unknown options.

use strsim::levenshtein;

/// Candidates further away than this are never suggested.
pub const MAX_DISTANCE: usize = 2;

/// Candidates within [`MAX_DISTANCE`] edits of `input`, closest first.
/// Ties keep the order in which candidates were given.
pub fn suggestions<'a, I>(input: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein(input, c), c))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .collect();
    scored.sort_by_key(|(distance, _)| *distance);
    scored.into_iter().map(|(_, c)| c.to_string()).collect()
}

/// Render `to`, passing every character that differs from `from` at the same
/// position through `mark`.
pub fn highlight_diff<F>(from: &str, to: &str, mark: F) -> String
where
    F: Fn(char) -> String,
{
    let mut from_chars = from.chars();
    let mut out = String::with_capacity(to.len());
    for c in to.chars() {
        if from_chars.next() == Some(c) {
            out.push(c);
        } else {
            out.push_str(&mark(c));
        }
    }
    out
}
