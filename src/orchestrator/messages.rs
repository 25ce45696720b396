use crate::error::PaceError;
use crate::preferences::UserPreferences;
use crate::transcript::Transcript;

/// Inputs to the orchestrator: host signals, timer callbacks and async results.
#[derive(Debug, Clone)]
pub enum Event {
    /// The active video identity changed; `None` means the page left watch view.
    Navigated {
        video_id: Option<String>,
    },
    NavigationSettled {
        nav_seq: u64,
    },
    PlayerProbe {
        request_id: u64,
        attempt: u32,
    },
    TranscriptLoaded {
        video_id: String,
        request_id: u64,
        result: Result<Transcript, PaceError>,
    },
    Tick,
    /// The playback resource reported a rate change, possibly our own write.
    RateChanged {
        rate: f64,
    },
    SetEnabled(bool),
    SetTargetMultiplier(f64),
    /// Preferences were changed from another context.
    PreferencesChanged(UserPreferences),
    PanelOpened,
    PanelAutoClose {
        panel_seq: u64,
    },
    Shutdown,
}
