//! Capabilities the orchestrator consumes from its host environment.
//!
//! The playback resource is shared with the user and with other agents, so
//! its rate is always read back live rather than trusted from the last write.

use crate::error::PaceError;
use std::sync::Arc;
use tracing::{info, warn};

/// Invoked with the new rate whenever the resource's rate changes, whoever
/// changed it.
pub type RateChangeCallback = Arc<dyn Fn(f64) + Send + Sync>;

pub trait PlaybackProbe {
    /// Whether a playback resource is present and ready.
    fn is_available(&self) -> bool;
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn is_ad_showing(&self) -> bool;
    fn rate(&self) -> f64;
    fn set_rate(&mut self, rate: f64);

    /// Resources without change notifications never report manual overrides.
    fn on_rate_changed_externally(&mut self, _callback: RateChangeCallback) {}
}

pub trait PageProbe {
    /// Video id of the watch page currently shown, `None` off watch pages.
    fn watch_video_id(&self) -> Option<String>;
}

/// Pace numbers shown next to the speed readout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaceStats {
    pub base_pace: f64,
    pub adjusted_pace: f64,
    pub actual_speed: f64,
}

pub trait DisplaySink {
    fn show_speed(&mut self, speed: f64);
    /// `None` renders the "no data" placeholder.
    fn show_stats(&mut self, stats: Option<PaceStats>);
    fn show_enabled(&mut self, enabled: bool);
    fn show_error(&mut self, _error: &PaceError) {}
    fn set_panel_visible(&mut self, _visible: bool) {}
}

/// Display sink that renders into the log.
#[derive(Debug, Default)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn show_speed(&mut self, speed: f64) {
        info!("Speed {speed:.2}x");
    }

    fn show_stats(&mut self, stats: Option<PaceStats>) {
        match stats {
            Some(stats) => info!(
                "Pace {:.2} w/s -> {:.2} w/s at {:.2}x",
                stats.base_pace, stats.adjusted_pace, stats.actual_speed
            ),
            None => info!("Pace: no data"),
        }
    }

    fn show_enabled(&mut self, enabled: bool) {
        info!(enabled, "Automatic pacing {}", if enabled { "on" } else { "off" });
    }

    fn show_error(&mut self, error: &PaceError) {
        warn!("{error}");
    }

    fn set_panel_visible(&mut self, visible: bool) {
        info!(visible, "Control panel");
    }
}
