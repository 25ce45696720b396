use super::messages::Event;
use super::state::{Control, InitStage, Phase, Session};
use super::transitions::{RecalcReason, TickDecision, TickObservation, decide_tick};
use super::{Effect, Orchestrator};
use crate::error::PaceError;
use crate::preferences::{UserPreferences, normalize_multiplier};
use crate::rate::DEAD_BAND;
use crate::transcript::Transcript;
use tracing::{debug, info, warn};

impl Orchestrator {
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match event {
            Event::Navigated { video_id } => self.handle_navigated(video_id, &mut effects),
            Event::NavigationSettled { nav_seq } => {
                self.handle_navigation_settled(nav_seq, &mut effects)
            }
            Event::PlayerProbe {
                request_id,
                attempt,
            } => self.handle_player_probe(request_id, attempt, &mut effects),
            Event::TranscriptLoaded {
                video_id,
                request_id,
                result,
            } => self.handle_transcript_loaded(video_id, request_id, result, &mut effects),
            Event::Tick => self.handle_tick(&mut effects),
            Event::RateChanged { rate } => self.handle_rate_changed(rate),
            Event::SetEnabled(enabled) => self.handle_set_enabled(enabled, &mut effects),
            Event::SetTargetMultiplier(multiplier) => {
                self.handle_set_target_multiplier(multiplier, &mut effects)
            }
            Event::PreferencesChanged(preferences) => {
                self.handle_preferences_changed(preferences)
            }
            Event::PanelOpened => self.handle_panel_opened(&mut effects),
            Event::PanelAutoClose { panel_seq } => self.handle_panel_auto_close(panel_seq),
            Event::Shutdown => self.handle_shutdown(&mut effects),
        }

        effects
    }

    fn handle_navigated(&mut self, video_id: Option<String>, effects: &mut Vec<Effect>) {
        if video_id.is_some() && video_id.as_deref() == self.session.video_id() {
            debug!(video_id = ?video_id, "Navigation to the active video ignored");
            return;
        }
        if video_id.is_some() && video_id == self.pending_video_id {
            debug!(video_id = ?video_id, "Navigation already settling");
            return;
        }

        info!(
            from = ?self.session.video_id(),
            to = ?video_id,
            "Video changed; resetting playback speed"
        );
        self.rate.set_speed(&mut *self.player, 1.0);
        self.display.show_speed(1.0);
        self.display.show_stats(None);
        self.reset_session(effects);

        if let Some(video_id) = video_id {
            self.pending_video_id = Some(video_id);
            effects.push(Effect::ScheduleNavigationSettle {
                nav_seq: self.nav_seq,
                delay: self.navigation_settle,
            });
        }
    }

    /// Drop the live session, keeping only `enabled`.
    fn reset_session(&mut self, effects: &mut Vec<Effect>) {
        self.session = Session::new(self.session.enabled);
        self.nav_seq += 1;
        self.pending_video_id = None;
        if self.ticking {
            self.ticking = false;
            effects.push(Effect::StopTicker);
        }
    }

    fn handle_navigation_settled(&mut self, nav_seq: u64, effects: &mut Vec<Effect>) {
        if nav_seq != self.nav_seq {
            debug!(nav_seq, current = self.nav_seq, "Ignoring stale navigation settle");
            return;
        }
        let Some(video_id) = self.pending_video_id.take() else {
            return;
        };
        self.begin_initialization(video_id, effects);
    }

    fn begin_initialization(&mut self, video_id: String, effects: &mut Vec<Effect>) {
        match self.store.get() {
            Ok(Some(stored)) => self.preferences = stored,
            Ok(None) => debug!("No stored preferences; keeping current values"),
            Err(err) => warn!("Failed to load preferences: {err:#}"),
        }
        self.preferences.target_multiplier =
            normalize_multiplier(self.preferences.target_multiplier);

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.session = Session::for_video(video_id.clone(), self.preferences.enabled, request_id);
        info!(
            video_id = %video_id,
            request_id,
            enabled = self.preferences.enabled,
            multiplier = self.preferences.target_multiplier,
            "Initializing session"
        );
        self.display.show_enabled(self.session.enabled);
        self.display.show_stats(None);
        self.probe_player(request_id, 0, effects);
    }

    fn probe_player(&mut self, request_id: u64, attempt: u32, effects: &mut Vec<Effect>) {
        let Some(video_id) = self.session.video_id.clone() else {
            return;
        };
        if self.player.is_available() {
            debug!(request_id, attempt, "Playback target ready");
            self.start_transcript_fetch(video_id, request_id, effects);
            return;
        }

        let next = attempt + 1;
        if next < self.player_ready_max_attempts {
            self.session.phase = Phase::Initializing {
                request_id,
                stage: InitStage::AwaitingPlayer { attempt: next },
            };
            effects.push(Effect::RetryPlayerProbe {
                request_id,
                attempt: next,
                delay: self.player_ready_backoff,
            });
            return;
        }

        warn!(
            request_id,
            attempts = self.player_ready_max_attempts,
            "Playback target never became ready"
        );
        self.session.error = Some(PaceError::NoPlaybackTarget);
        self.start_transcript_fetch(video_id, request_id, effects);
    }

    fn start_transcript_fetch(
        &mut self,
        video_id: String,
        request_id: u64,
        effects: &mut Vec<Effect>,
    ) {
        self.session.phase = Phase::Initializing {
            request_id,
            stage: InitStage::FetchingTranscript,
        };
        effects.push(Effect::FetchTranscript {
            video_id,
            request_id,
        });
    }

    fn handle_player_probe(&mut self, request_id: u64, attempt: u32, effects: &mut Vec<Effect>) {
        match self.session.initializing_request() {
            Some((current, InitStage::AwaitingPlayer { attempt: expected }))
                if current == request_id && expected == attempt =>
            {
                self.probe_player(request_id, attempt, effects);
            }
            _ => debug!(request_id, attempt, "Ignoring stale player probe"),
        }
    }

    fn handle_transcript_loaded(
        &mut self,
        video_id: String,
        request_id: u64,
        result: Result<Transcript, PaceError>,
        effects: &mut Vec<Effect>,
    ) {
        let expected = matches!(
            self.session.initializing_request(),
            Some((current, InitStage::FetchingTranscript)) if current == request_id
        );
        if !expected || self.session.video_id() != Some(video_id.as_str()) {
            debug!(
                video_id = %video_id,
                request_id,
                "Ignoring stale transcript result"
            );
            return;
        }

        let transcript = match result {
            Ok(transcript) if !transcript.is_empty() => Some(transcript),
            Ok(_) => {
                self.record_session_error(PaceError::NoTranscript {
                    video_id: video_id.clone(),
                    detail: Some("transcript is empty".to_string()),
                });
                None
            }
            Err(err) => {
                self.record_session_error(err.into_session_error(&video_id));
                None
            }
        };

        self.session.phase = Phase::Monitoring;
        if let Some(transcript) = transcript {
            info!(
                video_id = %video_id,
                segments = transcript.len(),
                duration_secs = transcript.duration_secs(),
                "Transcript loaded"
            );
            self.session.transcript = Some(transcript);
            self.perform_speed_calculation(RecalcReason::Initial);
            self.session.mark_first_calc_done();
        }

        if !self.ticking {
            self.ticking = true;
            effects.push(Effect::StartTicker);
        }
    }

    fn record_session_error(&mut self, error: PaceError) {
        warn!("{error}");
        self.display.show_error(&error);
        self.display.show_stats(None);
        self.session.error = Some(error);
    }

    fn handle_tick(&mut self, effects: &mut Vec<Effect>) {
        let observed = TickObservation {
            watch_video_id: self.page.watch_video_id(),
            player_available: self.player.is_available(),
            ad_showing: self.player.is_ad_showing(),
            playing: self.player.is_playing(),
            current_time: self.player.current_time(),
        };

        match decide_tick(&self.session, &observed, &self.policy) {
            TickDecision::Idle | TickDecision::HoldAd => {}
            TickDecision::TearDown => {
                info!(video_id = ?self.session.video_id(), "Left the watch page; stopping");
                self.reset_session(effects);
            }
            TickDecision::Renavigate(video_id) => {
                self.handle_navigated(Some(video_id), effects);
            }
            TickDecision::EnterAd { time_before_ad } => {
                info!(time_before_ad, "Ad detected; pausing recalculation");
                self.session.phase = Phase::AdPlaying { time_before_ad };
            }
            TickDecision::Recalculate(reason) => {
                if let Phase::AdPlaying { time_before_ad } = self.session.phase {
                    info!(
                        time_before_ad,
                        resumed_at = observed.current_time,
                        "Ad finished; resuming"
                    );
                    self.session.phase = Phase::Monitoring;
                }
                self.perform_speed_calculation(reason);
                if matches!(reason, RecalcReason::AdEnded | RecalcReason::FirstPlayback) {
                    self.session.mark_first_calc_done();
                }
            }
        }
    }

    fn handle_rate_changed(&mut self, rate: f64) {
        if !self.session.is_live() {
            self.rate.observe(rate);
            return;
        }
        if !self.player.is_available() {
            return;
        }
        // Notifications are queued; only the rate the resource holds now counts.
        let live = self.player.rate();
        if (rate - live).abs() >= DEAD_BAND {
            debug!(reported = rate, live, "Ignoring stale rate notification");
            return;
        }
        if (live - self.session.current_speed).abs() < DEAD_BAND {
            return;
        }
        let rate = live;
        self.rate.observe(rate);

        match self.session.control {
            Control::Automatic {
                first_calc_done: true,
            } if self.session.enabled => {
                info!(
                    expected = self.session.current_speed,
                    observed = rate,
                    "Manual speed change detected; automatic control suspended"
                );
                self.session.control = Control::ManualOverride { speed: rate };
            }
            Control::ManualOverride { .. } => {
                self.session.control = Control::ManualOverride { speed: rate };
            }
            Control::Automatic { .. } => {
                debug!(rate, "External rate change before automatic control");
            }
        }
        self.session.current_speed = rate;
        self.display.show_speed(rate);
    }

    fn clear_manual_override(&mut self) {
        if self.session.manual_override_active() {
            info!("Manual override cleared by user action");
            self.session.control = Control::Automatic {
                first_calc_done: true,
            };
        }
    }

    fn handle_set_enabled(&mut self, enabled: bool, effects: &mut Vec<Effect>) {
        self.clear_manual_override();
        self.session.enabled = enabled;
        self.preferences.enabled = enabled;
        self.persist_preferences();
        self.display.show_enabled(enabled);
        info!(enabled, "Automatic pacing toggled");

        if enabled {
            self.perform_speed_calculation(RecalcReason::UserAction);
        } else {
            self.force_native_speed();
        }
        self.touch_panel(effects);
    }

    fn handle_set_target_multiplier(&mut self, multiplier: f64, effects: &mut Vec<Effect>) {
        let multiplier = normalize_multiplier(multiplier);
        self.clear_manual_override();
        self.preferences.target_multiplier = multiplier;
        if !self.session.enabled {
            self.session.enabled = true;
            self.preferences.enabled = true;
            self.display.show_enabled(true);
        }
        self.persist_preferences();
        info!(multiplier, "Target multiplier changed");

        self.perform_speed_calculation(RecalcReason::UserAction);
        self.touch_panel(effects);
    }

    fn handle_preferences_changed(&mut self, preferences: UserPreferences) {
        let was_enabled = self.session.enabled;
        self.preferences = UserPreferences {
            enabled: preferences.enabled,
            target_multiplier: normalize_multiplier(preferences.target_multiplier),
        };
        self.session.enabled = preferences.enabled;
        if was_enabled != preferences.enabled {
            self.display.show_enabled(preferences.enabled);
        }
        debug!(
            enabled = self.preferences.enabled,
            multiplier = self.preferences.target_multiplier,
            "Preferences changed elsewhere"
        );

        if !preferences.enabled {
            if was_enabled {
                self.force_native_speed();
            }
            return;
        }
        self.perform_speed_calculation(RecalcReason::PreferencesChanged);
    }

    fn force_native_speed(&mut self) {
        let outcome = self.rate.set_speed(&mut *self.player, 1.0);
        self.session.current_speed = outcome.speed();
        self.display.show_speed(outcome.speed());
    }

    /// Write every field so a store with nothing saved yet does not fill the
    /// rest from its own defaults.
    fn persist_preferences(&mut self) {
        if let Err(err) = self.store.set(self.preferences.as_patch()) {
            warn!("Failed to persist preferences: {err:#}");
        }
    }

    fn touch_panel(&mut self, effects: &mut Vec<Effect>) {
        if self.panel_open {
            self.schedule_panel_close(effects);
        }
    }

    fn handle_panel_opened(&mut self, effects: &mut Vec<Effect>) {
        if !self.panel_open {
            self.panel_open = true;
            self.display.set_panel_visible(true);
        }
        self.schedule_panel_close(effects);
    }

    fn schedule_panel_close(&mut self, effects: &mut Vec<Effect>) {
        self.panel_seq += 1;
        effects.push(Effect::SchedulePanelClose {
            panel_seq: self.panel_seq,
            delay: self.panel_auto_close,
        });
    }

    fn handle_panel_auto_close(&mut self, panel_seq: u64) {
        if !self.panel_open || panel_seq != self.panel_seq {
            debug!(panel_seq, current = self.panel_seq, "Ignoring stale panel close");
            return;
        }
        self.panel_open = false;
        self.display.set_panel_visible(false);
    }

    fn handle_shutdown(&mut self, effects: &mut Vec<Effect>) {
        info!(video_id = ?self.session.video_id(), "Shutting down");
        self.nav_seq += 1;
        self.pending_video_id = None;
        if self.ticking {
            self.ticking = false;
            effects.push(Effect::StopTicker);
        }
    }
}
