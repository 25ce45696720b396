//! Tick transition table.
//!
//! Pure decision over the session and one observation of the page; the
//! reducer applies the outcome.

use super::state::{Phase, Session};
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecalcPolicy {
    pub recalc_interval_secs: f64,
    pub seek_back_threshold_secs: f64,
}

impl Default for RecalcPolicy {
    fn default() -> Self {
        Self {
            recalc_interval_secs: 16.0,
            seek_back_threshold_secs: 2.0,
        }
    }
}

impl RecalcPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            recalc_interval_secs: config.recalc_interval_secs,
            seek_back_threshold_secs: config.seek_back_threshold_secs.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcReason {
    Initial,
    AdEnded,
    FirstPlayback,
    Interval,
    SeekBack,
    UserAction,
    PreferencesChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TickObservation {
    pub(crate) watch_video_id: Option<String>,
    pub(crate) player_available: bool,
    pub(crate) ad_showing: bool,
    pub(crate) playing: bool,
    pub(crate) current_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TickDecision {
    TearDown,
    Renavigate(String),
    Idle,
    EnterAd { time_before_ad: f64 },
    HoldAd,
    Recalculate(RecalcReason),
}

pub(crate) fn decide_tick(
    session: &Session,
    observed: &TickObservation,
    policy: &RecalcPolicy,
) -> TickDecision {
    if !session.is_live() {
        return TickDecision::Idle;
    }
    let Some(watch_id) = observed.watch_video_id.as_deref() else {
        return TickDecision::TearDown;
    };
    if session.video_id() != Some(watch_id) {
        return TickDecision::Renavigate(watch_id.to_string());
    }
    if !observed.player_available {
        return TickDecision::Idle;
    }

    if observed.ad_showing {
        return match session.phase {
            Phase::AdPlaying { .. } => TickDecision::HoldAd,
            _ => TickDecision::EnterAd {
                time_before_ad: observed.current_time,
            },
        };
    }
    if matches!(session.phase, Phase::AdPlaying { .. }) {
        return TickDecision::Recalculate(RecalcReason::AdEnded);
    }
    if !session.first_calc_done() && observed.current_time > 0.0 {
        return TickDecision::Recalculate(RecalcReason::FirstPlayback);
    }
    if !session.has_transcript() || !observed.playing {
        return TickDecision::Idle;
    }

    let delta = observed.current_time - session.last_calc_video_time;
    if delta >= policy.recalc_interval_secs {
        TickDecision::Recalculate(RecalcReason::Interval)
    } else if delta < -policy.seek_back_threshold_secs {
        TickDecision::Recalculate(RecalcReason::SeekBack)
    } else {
        TickDecision::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Transcript, TranscriptSegment};

    fn live_session() -> Session {
        let mut session = Session::for_video("abc".to_string(), true, 1);
        session.phase = Phase::Monitoring;
        session.transcript = Some(Transcript::from_segments(vec![TranscriptSegment::new(
            "hello", 0.0, 1.0,
        )]));
        session.mark_first_calc_done();
        session.last_calc_video_time = 30.0;
        session
    }

    fn watching(current_time: f64) -> TickObservation {
        TickObservation {
            watch_video_id: Some("abc".to_string()),
            player_available: true,
            ad_showing: false,
            playing: true,
            current_time,
        }
    }

    fn decide(session: &Session, observed: &TickObservation) -> TickDecision {
        decide_tick(session, observed, &RecalcPolicy::default())
    }

    #[test]
    fn interval_and_seek_thresholds() {
        let session = live_session();
        assert_eq!(decide(&session, &watching(45.9)), TickDecision::Idle);
        assert_eq!(
            decide(&session, &watching(46.0)),
            TickDecision::Recalculate(RecalcReason::Interval)
        );
        assert_eq!(decide(&session, &watching(28.5)), TickDecision::Idle);
        assert_eq!(
            decide(&session, &watching(27.9)),
            TickDecision::Recalculate(RecalcReason::SeekBack)
        );
    }

    #[test]
    fn ads_enter_hold_and_release() {
        let mut session = live_session();
        let mut observed = watching(50.0);
        observed.ad_showing = true;
        assert_eq!(
            decide(&session, &observed),
            TickDecision::EnterAd {
                time_before_ad: 50.0
            }
        );
        session.phase = Phase::AdPlaying {
            time_before_ad: 50.0,
        };
        assert_eq!(decide(&session, &observed), TickDecision::HoldAd);
        observed.ad_showing = false;
        assert_eq!(
            decide(&session, &observed),
            TickDecision::Recalculate(RecalcReason::AdEnded)
        );
    }

    #[test]
    fn first_playback_forces_calculation_without_transcript() {
        let mut session = Session::for_video("abc".to_string(), true, 1);
        session.phase = Phase::Monitoring;
        assert_eq!(decide(&session, &watching(0.0)), TickDecision::Idle);
        assert_eq!(
            decide(&session, &watching(3.0)),
            TickDecision::Recalculate(RecalcReason::FirstPlayback)
        );
        session.mark_first_calc_done();
        assert_eq!(decide(&session, &watching(40.0)), TickDecision::Idle);
    }

    #[test]
    fn paused_playback_is_idle() {
        let session = live_session();
        let mut observed = watching(80.0);
        observed.playing = false;
        assert_eq!(decide(&session, &observed), TickDecision::Idle);
    }

    #[test]
    fn page_changes_win_over_everything() {
        let session = live_session();
        let mut observed = watching(80.0);
        observed.watch_video_id = None;
        assert_eq!(decide(&session, &observed), TickDecision::TearDown);
        observed.watch_video_id = Some("def".to_string());
        assert_eq!(
            decide(&session, &observed),
            TickDecision::Renavigate("def".to_string())
        );
        assert_eq!(decide(&Session::new(true), &observed), TickDecision::Idle);
    }
}
