//! Word-set similarity for search candidate ranking

use std::collections::HashSet;

/// Both title and artist similarity must exceed this for a confident match
pub const MATCH_THRESHOLD: f64 = 0.7;

/// Artist similarity required by artist-only exploratory search
pub const ARTIST_ONLY_THRESHOLD: f64 = 0.6;

/// Title similarity required by title-only exploratory search
pub const TITLE_ONLY_THRESHOLD: f64 = 0.5;

/// Jaccard similarity of the lower-cased whitespace-separated word sets
///
/// Returns 1.0 when both inputs have no words and 0.0 when exactly one does.
/// Symmetric in its arguments.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let words_a: HashSet<&str> = a_lower.split_whitespace().collect();
    let words_b: HashSet<&str> = b_lower.split_whitespace().collect();

    match (words_a.is_empty(), words_b.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        _ => {}
    }

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    intersection as f64 / union as f64
}

/// Candidate scores against a requested title and artist
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub title: f64,
    pub artist: f64,
}

impl MatchScore {
    pub fn compute(wanted_title: &str, wanted_artist: &str, title: &str, artist: &str) -> Self {
        Self {
            title: similarity(wanted_title, title),
            artist: similarity(wanted_artist, artist),
        }
    }

    /// Both scores strictly above [`MATCH_THRESHOLD`]
    pub fn is_confident(&self) -> bool {
        self.title > MATCH_THRESHOLD && self.artist > MATCH_THRESHOLD
    }
}
