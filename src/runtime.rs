//! Single-threaded driver for the orchestrator.
//!
//! Owns the event channel, the recalculation ticker and every deferred task
//! (navigation settle, readiness retries, panel close, transcript fetch).
//! Deferred work re-enters the loop as an [`Event`]; the orchestrator
//! discards the ones that are stale by the time they arrive.

use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::error::PaceError;
use crate::orchestrator::{Effect, Event, Orchestrator};
use crate::transcript::TranscriptProvider;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct Runtime {
    orchestrator: Orchestrator,
    provider: Arc<dyn TranscriptProvider>,
    tick_interval: Duration,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
    shutdown: CancellationToken,
}

impl Runtime {
    pub fn new(
        mut orchestrator: Orchestrator,
        provider: Arc<dyn TranscriptProvider>,
        config: &AppConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let rate_tx = tx.clone();
        orchestrator.listen_for_rate_changes(Arc::new(move |rate| {
            // Closed only after the loop has exited.
            let _ = rate_tx.send(Event::RateChanged { rate });
        }));
        Self {
            orchestrator,
            provider,
            tick_interval: config.tick_interval(),
            tx,
            rx,
            shutdown,
        }
    }

    /// Handle for host signals: navigation, user actions, shutdown.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Process events until [`Event::Shutdown`] or cancellation, then hand
    /// the orchestrator back for inspection.
    pub async fn run(mut self) -> Result<Orchestrator> {
        let mut ticker = time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticking = false;
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            "Event loop started"
        );

        loop {
            let event = if self.shutdown.is_cancelled() {
                Event::Shutdown
            } else {
                tokio::select! {
                    biased;
                    received = self.rx.recv() => match received {
                        Some(event) => event,
                        None => Event::Shutdown,
                    },
                    _ = ticker.tick(), if ticking => Event::Tick,
                }
            };

            let stop = matches!(event, Event::Shutdown);
            for effect in self.orchestrator.handle(event) {
                self.run_effect(effect, &mut ticker, &mut ticking);
            }
            if stop {
                break;
            }
        }

        info!("Event loop stopped");
        Ok(self.orchestrator)
    }

    fn run_effect(&self, effect: Effect, ticker: &mut Interval, ticking: &mut bool) {
        match effect {
            Effect::StartTicker => {
                ticker.reset();
                *ticking = true;
                debug!("Ticker started");
            }
            Effect::StopTicker => {
                *ticking = false;
                debug!("Ticker stopped");
            }
            Effect::ScheduleNavigationSettle { nav_seq, delay } => {
                self.send_after(delay, Event::NavigationSettled { nav_seq });
            }
            Effect::RetryPlayerProbe {
                request_id,
                attempt,
                delay,
            } => {
                self.send_after(
                    delay,
                    Event::PlayerProbe {
                        request_id,
                        attempt,
                    },
                );
            }
            Effect::SchedulePanelClose { panel_seq, delay } => {
                self.send_after(delay, Event::PanelAutoClose { panel_seq });
            }
            Effect::FetchTranscript {
                video_id,
                request_id,
            } => self.fetch_transcript(video_id, request_id),
        }
    }

    fn send_after(&self, delay: Duration, event: Event) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            if tx.send(event).is_err() {
                debug!("Event loop closed; dropping delayed event");
            }
        });
    }

    fn fetch_transcript(&self, video_id: String, request_id: u64) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        info!(video_id = %video_id, request_id, "Fetching transcript");
        tokio::spawn(async move {
            let lookup = video_id.clone();
            let result = tokio::task::spawn_blocking(move || provider.fetch(&lookup))
                .await
                .unwrap_or_else(|err| {
                    warn!(request_id, "Transcript fetch task failed: {err}");
                    Err(PaceError::ProviderError {
                        message: format!("fetch task failed: {err}"),
                    })
                });
            if tx
                .send(Event::TranscriptLoaded {
                    video_id,
                    request_id,
                    result,
                })
                .is_err()
            {
                debug!(request_id, "Event loop closed; dropping transcript");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Collaborators;
    use crate::preferences::MemoryPreferenceStore;
    use crate::probe::TracingDisplay;
    use crate::simulator::SimulatedPlayer;
    use crate::transcript::{Transcript, TranscriptSegment};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StaticProvider {
        transcripts: HashMap<String, Transcript>,
        fetched: Mutex<Vec<String>>,
    }

    impl StaticProvider {
        fn with(ids: &[&str]) -> Self {
            let transcript = Transcript::from_segments(vec![
                TranscriptSegment::new("hello world", 0.0, 2.0),
                TranscriptSegment::new("foo bar baz", 2.0, 2.0),
            ]);
            Self {
                transcripts: ids
                    .iter()
                    .map(|id| (id.to_string(), transcript.clone()))
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl TranscriptProvider for StaticProvider {
        fn fetch(&self, video_id: &str) -> Result<Transcript, PaceError> {
            self.fetched.lock().unwrap().push(video_id.to_string());
            self.transcripts
                .get(video_id)
                .cloned()
                .ok_or_else(|| PaceError::NoTranscript {
                    video_id: video_id.to_string(),
                    detail: None,
                })
        }
    }

    fn fast_config() -> AppConfig {
        AppConfig {
            tick_interval_ms: 10,
            navigation_settle_ms: 10,
            panel_auto_close_ms: 20,
            player_ready_backoff_ms: 10,
            ..AppConfig::default()
        }
    }

    fn runtime(player: &SimulatedPlayer, provider: Arc<StaticProvider>) -> Runtime {
        let config = fast_config();
        let orchestrator = Orchestrator::new(
            &config,
            Collaborators {
                player: Box::new(player.clone()),
                page: Box::new(player.page()),
                store: Box::new(MemoryPreferenceStore::new()),
                display: Box::new(TracingDisplay),
            },
        );
        Runtime::new(orchestrator, provider, &config, CancellationToken::new())
    }

    fn shutdown_after(tx: UnboundedSender<Event>, delay: Duration) {
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(Event::Shutdown);
        });
    }

    #[tokio::test]
    async fn navigation_initializes_and_applies_speed() {
        let player = SimulatedPlayer::new();
        let provider = Arc::new(StaticProvider::with(&["abc"]));
        player.load("abc", 600.0, Vec::new());

        let runtime = runtime(&player, Arc::clone(&provider));
        let tx = runtime.sender();
        tx.send(Event::Navigated {
            video_id: Some("abc".to_string()),
        })
        .unwrap();
        shutdown_after(tx, Duration::from_millis(200));

        let orchestrator = runtime.run().await.unwrap();
        assert_eq!(player.rate_writes(), vec![1.95]);
        assert!(orchestrator.session().has_transcript());
        assert!(!orchestrator.session().manual_override_active());
        assert!(!orchestrator.is_ticking());
        assert_eq!(provider.fetched(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn rapid_navigation_initializes_only_the_last_video() {
        let player = SimulatedPlayer::new();
        let provider = Arc::new(StaticProvider::with(&["abc", "def"]));
        let runtime = runtime(&player, Arc::clone(&provider));
        let tx = runtime.sender();

        player.load("abc", 600.0, Vec::new());
        tx.send(Event::Navigated {
            video_id: Some("abc".to_string()),
        })
        .unwrap();
        player.load("def", 600.0, Vec::new());
        tx.send(Event::Navigated {
            video_id: Some("def".to_string()),
        })
        .unwrap();
        shutdown_after(tx, Duration::from_millis(200));

        let orchestrator = runtime.run().await.unwrap();
        assert_eq!(orchestrator.session().video_id(), Some("def"));
        assert_eq!(provider.fetched(), vec!["def".to_string()]);
    }

    #[tokio::test]
    async fn external_rate_change_becomes_manual_override() {
        let player = SimulatedPlayer::new();
        let provider = Arc::new(StaticProvider::with(&["abc"]));
        player.load("abc", 600.0, Vec::new());
        let runtime = runtime(&player, provider);
        let tx = runtime.sender();
        tx.send(Event::Navigated {
            video_id: Some("abc".to_string()),
        })
        .unwrap();

        let user = player.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            user.user_set_rate(1.5);
        });
        shutdown_after(tx, Duration::from_millis(250));

        let orchestrator = runtime.run().await.unwrap();
        assert!(orchestrator.session().manual_override_active());
        assert_eq!(orchestrator.session().current_speed(), 1.5);
        assert_eq!(player.rate_writes(), vec![1.95]);
    }

    #[tokio::test]
    async fn quick_toggles_do_not_trigger_manual_override() {
        let player = SimulatedPlayer::new();
        let provider = Arc::new(StaticProvider::with(&["abc"]));
        player.load("abc", 600.0, Vec::new());
        let runtime = runtime(&player, provider);
        let tx = runtime.sender();
        tx.send(Event::Navigated {
            video_id: Some("abc".to_string()),
        })
        .unwrap();

        let user = tx.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(100)).await;
            let _ = user.send(Event::SetEnabled(false));
            let _ = user.send(Event::SetEnabled(true));
        });
        shutdown_after(tx, Duration::from_millis(250));

        let orchestrator = runtime.run().await.unwrap();
        assert_eq!(player.rate_writes(), vec![1.95, 1.0, 1.95]);
        assert!(!orchestrator.session().manual_override_active());
        assert_eq!(orchestrator.session().current_speed(), 1.95);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let player = SimulatedPlayer::new();
        let shutdown = CancellationToken::new();
        let config = fast_config();
        let orchestrator = Orchestrator::new(
            &config,
            Collaborators {
                player: Box::new(player.clone()),
                page: Box::new(player.page()),
                store: Box::new(MemoryPreferenceStore::new()),
                display: Box::new(TracingDisplay),
            },
        );
        let runtime = Runtime::new(
            orchestrator,
            Arc::new(StaticProvider::default()),
            &config,
            shutdown.clone(),
        );
        shutdown.cancel();

        let orchestrator = runtime.run().await.unwrap();
        assert!(!orchestrator.is_ticking());
    }
}
