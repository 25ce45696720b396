//! Playback orchestration.
//!
//! [`Orchestrator::handle`] is the single entry point: it applies one
//! [`Event`] to the session, talks to the synchronous collaborators and
//! returns the [`Effect`]s the runtime must schedule. Nothing in here
//! sleeps or blocks.

mod calculation;
mod messages;
mod reducer;
mod state;
mod transitions;


pub use messages::Event;
pub use state::{Control, InitStage, Phase, Session};
pub use transitions::{RecalcPolicy, RecalcReason};

use crate::analyzer::PaceAnalyzer;
use crate::config::AppConfig;
use crate::preferences::{PreferenceStore, UserPreferences};
use crate::probe::{DisplaySink, PageProbe, PlaybackProbe, RateChangeCallback};
use crate::rate::RateController;
use std::time::Duration;

/// Host capabilities the orchestrator drives.
pub struct Collaborators {
    pub player: Box<dyn PlaybackProbe + Send>,
    pub page: Box<dyn PageProbe + Send>,
    pub store: Box<dyn PreferenceStore + Send>,
    pub display: Box<dyn DisplaySink + Send>,
}

/// Work the runtime performs on the orchestrator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTicker,
    StopTicker,
    /// Deliver [`Event::NavigationSettled`] after `delay`.
    ScheduleNavigationSettle { nav_seq: u64, delay: Duration },
    /// Deliver [`Event::PlayerProbe`] after `delay`.
    RetryPlayerProbe {
        request_id: u64,
        attempt: u32,
        delay: Duration,
    },
    /// Fetch off the event loop and deliver [`Event::TranscriptLoaded`].
    FetchTranscript { video_id: String, request_id: u64 },
    /// Deliver [`Event::PanelAutoClose`] after `delay`.
    SchedulePanelClose { panel_seq: u64, delay: Duration },
}

pub struct Orchestrator {
    session: Session,
    preferences: UserPreferences,
    analyzer: PaceAnalyzer,
    rate: RateController,
    policy: RecalcPolicy,
    navigation_settle: Duration,
    player_ready_backoff: Duration,
    player_ready_max_attempts: u32,
    panel_auto_close: Duration,
    player: Box<dyn PlaybackProbe + Send>,
    page: Box<dyn PageProbe + Send>,
    store: Box<dyn PreferenceStore + Send>,
    display: Box<dyn DisplaySink + Send>,
    next_request_id: u64,
    nav_seq: u64,
    pending_video_id: Option<String>,
    panel_seq: u64,
    panel_open: bool,
    ticking: bool,
}

impl Orchestrator {
    pub fn new(config: &AppConfig, collaborators: Collaborators) -> Self {
        let preferences = config.default_preferences();
        Self {
            session: Session::new(preferences.enabled),
            preferences,
            analyzer: PaceAnalyzer::from_config(config),
            rate: RateController::new(),
            policy: RecalcPolicy::from_config(config),
            navigation_settle: config.navigation_settle(),
            player_ready_backoff: config.player_ready_backoff(),
            player_ready_max_attempts: config.player_ready_max_attempts.max(1),
            panel_auto_close: config.panel_auto_close(),
            player: collaborators.player,
            page: collaborators.page,
            store: collaborators.store,
            display: collaborators.display,
            next_request_id: 0,
            nav_seq: 0,
            pending_video_id: None,
            panel_seq: 0,
            panel_open: false,
            ticking: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn preferences(&self) -> UserPreferences {
        self.preferences
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Speed as the playback resource reports it right now.
    pub fn current_rate(&self) -> f64 {
        self.rate.get_speed(&*self.player)
    }

    /// Route the resource's rate-change notifications back in as events.
    pub fn listen_for_rate_changes(&mut self, callback: RateChangeCallback) {
        self.player.on_rate_changed_externally(callback);
    }
}
