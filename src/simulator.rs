//! In-process stand-in for a watch page and its video element.
//!
//! Content time advances by `real_secs * rate` while playing. Ad breaks
//! freeze content time for their length in real seconds. Every rate change,
//! including writes made through [`PlaybackProbe::set_rate`], is reported to
//! the registered callback the way a media element fires `ratechange`.

use crate::cancellation::CancellationToken;
use crate::orchestrator::Event;
use crate::probe::{PageProbe, PlaybackProbe, RateChangeCallback};
use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdBreak {
    pub at_secs: f64,
    pub length_secs: f64,
}

struct SimState {
    available: bool,
    video_id: Option<String>,
    position: f64,
    duration: f64,
    rate: f64,
    playing: bool,
    ad_remaining: f64,
    pending_ads: Vec<AdBreak>,
    rate_writes: Vec<f64>,
    callback: Option<RateChangeCallback>,
}

#[derive(Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<SimState>>,
}

/// Page view over the same simulated state.
#[derive(Clone)]
pub struct SimulatedPage {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                available: true,
                video_id: None,
                position: 0.0,
                duration: 0.0,
                rate: 1.0,
                playing: false,
                ad_remaining: 0.0,
                pending_ads: Vec::new(),
                rate_writes: Vec::new(),
                callback: None,
            })),
        }
    }

    pub fn page(&self) -> SimulatedPage {
        SimulatedPage {
            state: Arc::clone(&self.state),
        }
    }

    /// Open a watch page and start playing from the beginning.
    pub fn load(&self, video_id: &str, duration: f64, mut ads: Vec<AdBreak>) {
        ads.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        let mut state = lock(&self.state);
        state.video_id = Some(video_id.to_string());
        state.position = 0.0;
        state.duration = duration.max(0.0);
        state.playing = true;
        state.ad_remaining = 0.0;
        state.pending_ads = ads;
        debug!(video_id, duration, "Simulated page loaded");
    }

    /// Navigate away from watch pages.
    pub fn leave(&self) {
        let mut state = lock(&self.state);
        state.video_id = None;
        state.playing = false;
        state.ad_remaining = 0.0;
        state.pending_ads.clear();
    }

    pub fn advance(&self, real_secs: f64) {
        let mut state = lock(&self.state);
        if !state.playing || real_secs <= 0.0 {
            return;
        }
        if state.ad_remaining > 0.0 {
            state.ad_remaining = (state.ad_remaining - real_secs).max(0.0);
            return;
        }
        let next = state.position + real_secs * state.rate;
        if let Some(ad) = state.pending_ads.first().copied() {
            if ad.at_secs <= next {
                state.pending_ads.remove(0);
                state.position = ad.at_secs.max(state.position);
                state.ad_remaining = ad.length_secs;
                debug!(at = ad.at_secs, length = ad.length_secs, "Simulated ad started");
                return;
            }
        }
        state.position = next.min(state.duration);
        if state.position >= state.duration {
            state.playing = false;
        }
    }

    pub fn seek(&self, position: f64) {
        lock(&self.state).position = position.max(0.0);
    }

    pub fn set_playing(&self, playing: bool) {
        lock(&self.state).playing = playing;
    }

    pub fn set_available(&self, available: bool) {
        lock(&self.state).available = available;
    }

    /// Show an ad immediately for `length_secs` real seconds.
    pub fn start_ad(&self, length_secs: f64) {
        lock(&self.state).ad_remaining = length_secs;
    }

    /// Change the rate the way a user or another extension would.
    pub fn user_set_rate(&self, rate: f64) {
        let callback = {
            let mut state = lock(&self.state);
            state.rate = rate;
            state.callback.clone()
        };
        if let Some(callback) = callback {
            callback(rate);
        }
    }

    /// Rates written through the probe, in order.
    pub fn rate_writes(&self) -> Vec<f64> {
        lock(&self.state).rate_writes.clone()
    }

    pub fn is_finished(&self) -> bool {
        let state = lock(&self.state);
        state.video_id.is_some() && !state.playing && state.position >= state.duration
    }
}

impl PlaybackProbe for SimulatedPlayer {
    fn is_available(&self) -> bool {
        let state = lock(&self.state);
        state.available && state.video_id.is_some()
    }

    fn current_time(&self) -> f64 {
        lock(&self.state).position
    }

    fn is_playing(&self) -> bool {
        let state = lock(&self.state);
        state.playing && state.ad_remaining <= 0.0
    }

    fn is_ad_showing(&self) -> bool {
        lock(&self.state).ad_remaining > 0.0
    }

    fn rate(&self) -> f64 {
        lock(&self.state).rate
    }

    fn set_rate(&mut self, rate: f64) {
        let callback = {
            let mut state = lock(&self.state);
            state.rate = rate;
            state.rate_writes.push(rate);
            state.callback.clone()
        };
        if let Some(callback) = callback {
            callback(rate);
        }
    }

    fn on_rate_changed_externally(&mut self, callback: RateChangeCallback) {
        lock(&self.state).callback = Some(callback);
    }
}

impl PageProbe for SimulatedPage {
    fn watch_video_id(&self) -> Option<String> {
        lock(&self.state).video_id.clone()
    }
}

/// One video to play through the simulated page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub video_id: String,
    pub duration_secs: f64,
    pub ads: Vec<AdBreak>,
}

/// Play each entry to the end, announcing every page change on `events`,
/// then leave the watch page and request shutdown.
///
/// Every `step` of wall time advances the player by `step * time_scale`
/// seconds.
pub async fn run_playlist(
    player: SimulatedPlayer,
    events: UnboundedSender<Event>,
    playlist: Vec<PlaylistEntry>,
    step: Duration,
    time_scale: f64,
    shutdown: CancellationToken,
) -> Result<()> {
    let send = |event: Event| {
        events
            .send(event)
            .map_err(|_| anyhow!("event loop closed before the playlist finished"))
    };
    let sim_step = step.as_secs_f64() * time_scale.max(0.0);

    for entry in playlist {
        shutdown.check_cancelled("playlist")?;
        info!(
            video_id = %entry.video_id,
            duration_secs = entry.duration_secs,
            ads = entry.ads.len(),
            "Opening video"
        );
        player.load(&entry.video_id, entry.duration_secs, entry.ads);
        send(Event::Navigated {
            video_id: Some(entry.video_id.clone()),
        })?;

        while !player.is_finished() {
            shutdown.check_cancelled("playback")?;
            tokio::time::sleep(step).await;
            player.advance(sim_step);
        }
        info!(video_id = %entry.video_id, "Video finished");
    }

    player.leave();
    send(Event::Navigated { video_id: None })?;
    send(Event::Shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_time_scales_with_rate() {
        let mut player = SimulatedPlayer::new();
        player.load("abc", 100.0, Vec::new());
        player.set_rate(2.0);
        player.advance(3.0);
        assert_eq!(player.current_time(), 6.0);
        assert_eq!(player.page().watch_video_id().as_deref(), Some("abc"));
    }

    #[test]
    fn ad_break_freezes_content() {
        let player = SimulatedPlayer::new();
        player.load(
            "abc",
            100.0,
            vec![AdBreak {
                at_secs: 5.0,
                length_secs: 3.0,
            }],
        );
        player.advance(10.0);
        assert!(player.is_ad_showing());
        assert_eq!(player.current_time(), 5.0);
        player.advance(2.0);
        assert!(player.is_ad_showing());
        player.advance(1.0);
        assert!(!player.is_ad_showing());
        player.advance(1.0);
        assert_eq!(player.current_time(), 6.0);
    }

    #[test]
    fn playback_stops_at_duration() {
        let player = SimulatedPlayer::new();
        player.load("abc", 4.0, Vec::new());
        player.advance(10.0);
        assert!(!player.is_playing());
        assert!(player.is_finished());
        player.leave();
        assert!(!player.is_available());
        assert_eq!(player.page().watch_video_id(), None);
    }

    #[test]
    fn rate_changes_reach_the_callback() {
        let mut player = SimulatedPlayer::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        player.on_rate_changed_externally(Arc::new(move |rate| {
            sink.lock().unwrap().push(rate);
        }));
        player.set_rate(1.5);
        player.user_set_rate(1.25);
        assert_eq!(*seen.lock().unwrap(), vec![1.5, 1.25]);
        assert_eq!(player.rate_writes(), vec![1.5]);
    }

    #[tokio::test]
    async fn playlist_announces_each_page_then_shuts_down() {
        let player = SimulatedPlayer::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let playlist = ["abc", "def"]
            .into_iter()
            .map(|id| PlaylistEntry {
                video_id: id.to_string(),
                duration_secs: 1.0,
                ads: Vec::new(),
            })
            .collect();

        run_playlist(
            player.clone(),
            tx,
            playlist,
            Duration::from_millis(1),
            500.0,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut pages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                Event::Navigated { video_id } => pages.push(video_id),
                Event::Shutdown => pages.push(Some("<shutdown>".to_string())),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(
            pages,
            vec![
                Some("abc".to_string()),
                Some("def".to_string()),
                None,
                Some("<shutdown>".to_string()),
            ]
        );
        assert!(!player.is_available());
    }

    #[tokio::test]
    async fn cancelled_playlist_stops_early() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let entry = PlaylistEntry {
            video_id: "abc".to_string(),
            duration_secs: 100.0,
            ads: Vec::new(),
        };
        let result = run_playlist(
            SimulatedPlayer::new(),
            tx,
            vec![entry],
            Duration::from_millis(1),
            1.0,
            shutdown,
        )
        .await;
        assert!(result.is_err());
    }
}
