use crate::error::PaceError;
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitStage {
    AwaitingPlayer { attempt: u32 },
    FetchingTranscript,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Uninitialized,
    Initializing { request_id: u64, stage: InitStage },
    Monitoring,
    AdPlaying { time_before_ad: f64 },
}

/// Who owns the playback rate. A manual override holds until the user acts
/// on our own controls or the session is replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Automatic { first_calc_done: bool },
    ManualOverride { speed: f64 },
}

/// Per-video state. Only `enabled` survives a change of video.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) video_id: Option<String>,
    pub(crate) phase: Phase,
    pub(crate) control: Control,
    pub(crate) enabled: bool,
    pub(crate) transcript: Option<Transcript>,
    pub(crate) current_speed: f64,
    pub(crate) speaking_pace: Option<f64>,
    pub(crate) last_calc_video_time: f64,
    pub(crate) error: Option<PaceError>,
}

impl Session {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            video_id: None,
            phase: Phase::Uninitialized,
            control: Control::Automatic {
                first_calc_done: false,
            },
            enabled,
            transcript: None,
            current_speed: 1.0,
            speaking_pace: None,
            last_calc_video_time: 0.0,
            error: None,
        }
    }

    pub(crate) fn for_video(video_id: String, enabled: bool, request_id: u64) -> Self {
        Self {
            video_id: Some(video_id),
            phase: Phase::Initializing {
                request_id,
                stage: InitStage::AwaitingPlayer { attempt: 0 },
            },
            ..Self::new(enabled)
        }
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript.is_some()
    }

    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn speaking_pace(&self) -> Option<f64> {
        self.speaking_pace
    }

    pub fn last_calc_video_time(&self) -> f64 {
        self.last_calc_video_time
    }

    pub fn error(&self) -> Option<&PaceError> {
        self.error.as_ref()
    }

    pub fn manual_override_active(&self) -> bool {
        matches!(self.control, Control::ManualOverride { .. })
    }

    pub fn first_calc_done(&self) -> bool {
        match self.control {
            Control::Automatic { first_calc_done } => first_calc_done,
            Control::ManualOverride { .. } => true,
        }
    }

    /// Receiving ticks.
    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Monitoring | Phase::AdPlaying { .. })
    }

    pub(crate) fn mark_first_calc_done(&mut self) {
        if let Control::Automatic { first_calc_done } = &mut self.control {
            *first_calc_done = true;
        }
    }

    pub(crate) fn initializing_request(&self) -> Option<(u64, InitStage)> {
        match self.phase {
            Phase::Initializing { request_id, stage } => Some((request_id, stage)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_video_session_keeps_only_enabled() {
        let session = Session::for_video("abc".to_string(), false, 7);
        assert!(!session.enabled());
        assert_eq!(session.video_id(), Some("abc"));
        assert_eq!(
            session.initializing_request(),
            Some((7, InitStage::AwaitingPlayer { attempt: 0 }))
        );
        assert!(!session.has_transcript());
        assert_eq!(session.current_speed(), 1.0);
        assert!(!session.first_calc_done());
        assert!(!session.is_live());
    }

    #[test]
    fn manual_override_counts_as_calculated() {
        let mut session = Session::new(true);
        session.mark_first_calc_done();
        assert!(session.first_calc_done());
        session.control = Control::ManualOverride { speed: 1.5 };
        session.mark_first_calc_done();
        assert_eq!(session.control(), Control::ManualOverride { speed: 1.5 });
        assert!(session.first_calc_done());
    }
}
