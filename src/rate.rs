//! Clamped, quantized writes to the playback rate.

use crate::probe::PlaybackProbe;
use tracing::{debug, warn};

/// Minimum automatic playback speed.
pub const MIN_SPEED: f64 = 1.0;
/// Maximum automatic playback speed.
pub const MAX_SPEED: f64 = 3.0;
/// Writes closer than this to the live rate are skipped.
pub const DEAD_BAND: f64 = 0.01;

/// Clamp to `[MIN_SPEED, MAX_SPEED]`, snap to 0.05 and trim float drift.
pub fn normalize(speed: f64) -> f64 {
    if speed.is_nan() {
        return MIN_SPEED;
    }
    let clamped = speed.clamp(MIN_SPEED, MAX_SPEED);
    let stepped = (clamped * 20.0).round() / 20.0;
    (stepped * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateOutcome {
    Written(f64),
    /// Already within the dead-band; carries the live rate.
    Unchanged(f64),
    /// No playback resource; carries the cached speed.
    NoTarget(f64),
}

impl RateOutcome {
    pub fn speed(self) -> f64 {
        match self {
            RateOutcome::Written(speed)
            | RateOutcome::Unchanged(speed)
            | RateOutcome::NoTarget(speed) => speed,
        }
    }

    pub fn wrote(self) -> bool {
        matches!(self, RateOutcome::Written(_))
    }
}

#[derive(Debug, Clone)]
pub struct RateController {
    cached: f64,
}

impl Default for RateController {
    fn default() -> Self {
        Self { cached: 1.0 }
    }
}

impl RateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_speed(&mut self, player: &mut dyn PlaybackProbe, requested: f64) -> RateOutcome {
        if !player.is_available() {
            warn!(requested, cached = self.cached, "No playback target for rate write");
            return RateOutcome::NoTarget(self.cached);
        }
        let target = normalize(requested);
        let current = player.rate();
        if (current - target).abs() < DEAD_BAND {
            self.cached = current;
            return RateOutcome::Unchanged(current);
        }
        player.set_rate(target);
        debug!(from = current, to = target, "Applied playback rate");
        self.cached = target;
        RateOutcome::Written(target)
    }

    /// Live rate when the resource exists, cached speed otherwise.
    pub fn get_speed(&self, player: &dyn PlaybackProbe) -> f64 {
        if player.is_available() {
            player.rate()
        } else {
            self.cached
        }
    }

    /// Record a rate set by someone else.
    pub fn observe(&mut self, rate: f64) {
        self.cached = rate;
    }
}
