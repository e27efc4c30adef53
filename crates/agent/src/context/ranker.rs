//! Relevance ranking of past exchanges against a new user message.

use devpilot_core::history::HistoryEntry;
use similar::TextDiff;

/// Entries must score strictly above this to be recalled.
pub const SIMILARITY_THRESHOLD: f32 = 0.5;

/// At most this many entries are recalled, newest kept.
pub const MAX_RANKED: usize = 10;

/// Character-level similarity in `[0, 1]`: twice the matched length over the
/// combined length.
pub fn similarity(a: &str, b: &str) -> f32 {
    // Order the pair so the score is symmetric.
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    TextDiff::from_chars(a, b).ratio()
}

/// Entries whose user message is similar to `new_message`, in their original
/// chronological order, capped to the [`MAX_RANKED`] most recent.
pub fn rank<'a, I>(new_message: &str, history: I) -> Vec<&'a HistoryEntry>
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut ranked: Vec<&HistoryEntry> = history
        .into_iter()
        .filter(|entry| similarity(new_message, &entry.user_message) > SIMILARITY_THRESHOLD)
        .collect();

    if ranked.len() > MAX_RANKED {
        ranked = ranked.split_off(ranked.len() - MAX_RANKED);
    }
    ranked
}
