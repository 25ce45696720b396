//! Text helpers for caption pace analysis.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_WORD_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());

/// Count words by splitting on runs of whitespace or hyphens.
pub fn count_words(text: &str) -> usize {
    RE_WORD_SEPARATORS
        .split(text)
        .filter(|token| !token.is_empty())
        .count()
}

/// Caption cues that only mark background music carry no speech. The match
/// is exact; transcripts trim cue text at ingestion.
pub fn is_music_marker(text: &str) -> bool {
    matches!(text, "[Music]" | "[music]")
}
