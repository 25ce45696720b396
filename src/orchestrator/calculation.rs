use super::Orchestrator;
use super::state::Phase;
use super::transitions::RecalcReason;
use crate::probe::PaceStats;
use crate::rate::normalize;
use tracing::{debug, info};

impl Orchestrator {
    /// Analyze the upcoming transcript window and apply the scaled speed.
    ///
    /// Returns whether a calculation ran. When it does not, neither the
    /// playback resource nor the session is touched.
    pub(crate) fn perform_speed_calculation(&mut self, reason: RecalcReason) -> bool {
        let session = &self.session;
        if !session.has_transcript()
            || !session.enabled
            || session.manual_override_active()
            || matches!(session.phase, Phase::AdPlaying { .. })
        {
            debug!(
                ?reason,
                has_transcript = session.has_transcript(),
                enabled = session.enabled,
                manual_override = session.manual_override_active(),
                "Skipping speed calculation"
            );
            return false;
        }
        if !self.player.is_available() || self.player.is_ad_showing() {
            debug!(?reason, "Playback target not ready for calculation");
            return false;
        }

        let current_time = self.player.current_time();
        let Some(transcript) = self.session.transcript.as_ref() else {
            return false;
        };
        let pace = self.analyzer.analyze(transcript.segments(), current_time);
        let target = normalize(pace.recommended_speed * self.preferences.target_multiplier);
        let outcome = self.rate.set_speed(&mut *self.player, target);
        let applied = outcome.speed();

        self.session.current_speed = applied;
        self.session.speaking_pace = Some(pace.words_per_sec);
        self.session.last_calc_video_time = current_time;
        info!(
            ?reason,
            video_time = current_time,
            words_per_sec = pace.words_per_sec,
            recommended = pace.recommended_speed,
            multiplier = self.preferences.target_multiplier,
            applied,
            wrote = outcome.wrote(),
            segments = pace.segments_analyzed,
            "Recalculated playback speed"
        );

        self.display.show_speed(applied);
        self.display.show_stats(Some(PaceStats {
            base_pace: pace.words_per_sec,
            adjusted_pace: pace.words_per_sec * applied,
            actual_speed: applied,
        }));
        true
    }
}
