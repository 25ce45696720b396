//! Speaking-pace analysis over a lookahead window of caption cues.
//!
//! The recommendation targets upcoming speech density: the window starts at
//! the first cue at or after the playback position, so a dense passage that
//! is about to start slows playback before it arrives.

use crate::config::AppConfig;
use crate::text_utils::{count_words, is_music_marker};
use crate::transcript::TranscriptSegment;

/// Number of upcoming cues analyzed per call.
pub const LOOKAHEAD: usize = 12;
/// Reference speaking rate, in words per second, that content is normalized to.
pub const BASELINE_WPS: f64 = 2.45;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    pub words_per_sec: f64,
    /// Quantized to 0.05 but not clamped; callers apply their own bounds.
    pub recommended_speed: f64,
    pub segments_analyzed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceAnalyzer {
    baseline_wps: f64,
    lookahead: usize,
}

impl Default for PaceAnalyzer {
    fn default() -> Self {
        Self {
            baseline_wps: BASELINE_WPS,
            lookahead: LOOKAHEAD,
        }
    }
}

impl PaceAnalyzer {
    pub fn new(baseline_wps: f64, lookahead: usize) -> Self {
        let baseline_wps = if baseline_wps.is_finite() && baseline_wps > 0.0 {
            baseline_wps
        } else {
            BASELINE_WPS
        };
        Self {
            baseline_wps,
            lookahead: lookahead.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.baseline_wps, config.lookahead_segments)
    }

    /// Result reported when there is nothing to measure.
    pub fn baseline(&self) -> AnalysisResult {
        AnalysisResult {
            words_per_sec: self.baseline_wps,
            recommended_speed: 1.0,
            segments_analyzed: 0,
        }
    }

    /// Recommend a playback speed for `current_time`.
    ///
    /// `segments` must be ordered by `start_sec`; [`crate::transcript::Transcript`]
    /// guarantees this.
    pub fn analyze(&self, segments: &[TranscriptSegment], current_time: f64) -> AnalysisResult {
        let window = lookahead_window(segments, current_time, self.lookahead);
        let spoken: Vec<&TranscriptSegment> = window
            .iter()
            .filter(|seg| !is_music_marker(&seg.text))
            .collect();
        if spoken.is_empty() {
            return self.baseline();
        }

        let total_words: usize = spoken.iter().map(|seg| count_words(&seg.text)).sum();
        let mut total_duration: f64 = effective_durations(&spoken).iter().sum();
        if total_duration <= 0.0 {
            total_duration = 1.0;
        }

        let words_per_sec = total_words as f64 / total_duration;
        if words_per_sec <= 0.0 {
            return AnalysisResult {
                segments_analyzed: spoken.len(),
                ..self.baseline()
            };
        }

        AnalysisResult {
            words_per_sec,
            recommended_speed: round_to_twentieth(self.baseline_wps / words_per_sec),
            segments_analyzed: spoken.len(),
        }
    }
}

/// Up to `lookahead` cues starting at the first one at or after
/// `current_time`; past the last cue, the final `lookahead` cues instead.
pub fn lookahead_window(
    segments: &[TranscriptSegment],
    current_time: f64,
    lookahead: usize,
) -> &[TranscriptSegment] {
    match segments.iter().position(|seg| seg.start_sec >= current_time) {
        Some(start) => {
            let end = (start + lookahead).min(segments.len());
            &segments[start..end]
        }
        None => &segments[segments.len().saturating_sub(lookahead)..],
    }
}

/// Durations clipped to the gap before the next cue so overlapping cues are
/// not counted twice. The last cue keeps its raw duration.
fn effective_durations(spoken: &[&TranscriptSegment]) -> Vec<f64> {
    spoken
        .iter()
        .enumerate()
        .map(|(idx, seg)| {
            let raw = seg.duration_sec;
            match spoken.get(idx + 1) {
                Some(next) => {
                    let gap = next.start_sec - seg.start_sec;
                    if gap > 0.0 && gap < raw { gap } else { raw }
                }
                None => raw,
            }
        })
        .collect()
}

/// Quantize to the nearest 0.05.
pub fn round_to_twentieth(value: f64) -> f64 {
    (value * 20.0).round() / 20.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64, duration: f64) -> TranscriptSegment {
        TranscriptSegment::new(text, start, duration)
    }

    fn two_cues() -> Vec<TranscriptSegment> {
        vec![seg("hello world", 0.0, 2.0), seg("foo bar baz", 2.0, 2.0)]
    }

    #[test]
    fn analyzes_upcoming_window() {
        let result = PaceAnalyzer::default().analyze(&two_cues(), 0.0);
        assert_eq!(result.segments_analyzed, 2);
        assert!((result.words_per_sec - 1.25).abs() < 1e-12);
        // 2.45 / 1.25 = 1.96, nearest 0.05 step.
        assert!((result.recommended_speed - 1.95).abs() < 1e-12);
    }

    #[test]
    fn past_the_end_uses_trailing_cues() {
        let segments = two_cues();
        let window = lookahead_window(&segments, 100.0, LOOKAHEAD);
        assert_eq!(window.len(), 2);
        let result = PaceAnalyzer::default().analyze(&segments, 100.0);
        assert_eq!(result, PaceAnalyzer::default().analyze(&segments, 0.0));
    }

    #[test]
    fn window_starts_at_first_cue_not_before_position() {
        let segments = vec![
            seg("one", 0.0, 1.0),
            seg("two three", 1.0, 1.0),
            seg("four five six", 2.0, 1.0),
        ];
        let window = lookahead_window(&segments, 1.5, LOOKAHEAD);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].text, "four five six");
    }

    #[test]
    fn never_analyzes_more_than_lookahead() {
        let segments: Vec<TranscriptSegment> = (0..40)
            .map(|i| seg("some spoken words", i as f64 * 2.0, 2.0))
            .collect();
        for time in [0.0, 10.0, 50.0, 1000.0] {
            let result = PaceAnalyzer::default().analyze(&segments, time);
            assert!(result.segments_analyzed <= LOOKAHEAD);
        }
        assert_eq!(
            PaceAnalyzer::new(BASELINE_WPS, 3)
                .analyze(&segments, 0.0)
                .segments_analyzed,
            3
        );
    }

    #[test]
    fn music_cues_are_ignored() {
        let segments = vec![
            seg("hello world", 0.0, 2.0),
            seg("[Music]", 2.0, 30.0),
            seg("foo bar baz", 2.0, 2.0),
        ];
        let result = PaceAnalyzer::default().analyze(&segments, 0.0);
        assert_eq!(result.segments_analyzed, 2);
        assert!((result.words_per_sec - 1.25).abs() < 1e-12);
    }

    #[test]
    fn only_music_yields_baseline() {
        let segments = vec![seg("[music]", 0.0, 5.0), seg("[Music]", 5.0, 5.0)];
        let result = PaceAnalyzer::default().analyze(&segments, 0.0);
        assert_eq!(result, PaceAnalyzer::default().baseline());
    }

    #[test]
    fn overlapping_cues_are_clipped_but_gaps_are_kept() {
        let overlapping = vec![seg("a b c d", 0.0, 5.0), seg("e f", 2.0, 2.0)];
        let result = PaceAnalyzer::default().analyze(&overlapping, 0.0);
        assert!((result.words_per_sec - 1.5).abs() < 1e-12);

        let gapped = vec![seg("a b", 0.0, 1.0), seg("c d", 10.0, 1.0)];
        let result = PaceAnalyzer::default().analyze(&gapped, 0.0);
        assert!((result.words_per_sec - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_is_treated_as_one_second() {
        let segments = vec![seg("a b", 0.0, 0.0), seg("c d", 0.0, 0.0)];
        let result = PaceAnalyzer::default().analyze(&segments, 0.0);
        assert!((result.words_per_sec - 4.0).abs() < 1e-12);
        // Fast speech may recommend below 1.0; clamping happens later.
        assert!((result.recommended_speed - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_input_yields_baseline() {
        let result = PaceAnalyzer::default().analyze(&[], 12.0);
        assert_eq!(result.recommended_speed, 1.0);
        assert_eq!(result.segments_analyzed, 0);
        assert_eq!(result.words_per_sec, BASELINE_WPS);
    }

    #[test]
    fn rounding_uses_twentieths() {
        assert_eq!(round_to_twentieth(1.96), 1.95);
        assert_eq!(round_to_twentieth(1.98), 2.0);
        assert_eq!(round_to_twentieth(0.6125), 0.6);
    }
}
