use serde::Deserialize;
use std::time::Duration;

use crate::preferences::UserPreferences;

/// Flattened runtime configuration; the on-disk form is grouped into tables.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,
    #[serde(default = "crate::config::defaults::default_panel_auto_close_ms")]
    pub panel_auto_close_ms: u64,
    #[serde(default = "crate::config::defaults::default_player_ready_max_attempts")]
    pub player_ready_max_attempts: u32,
    #[serde(default = "crate::config::defaults::default_player_ready_backoff_ms")]
    pub player_ready_backoff_ms: u64,
    #[serde(default = "crate::config::defaults::default_baseline_wps")]
    pub baseline_wps: f64,
    #[serde(default = "crate::config::defaults::default_lookahead_segments")]
    pub lookahead_segments: usize,
    #[serde(default = "crate::config::defaults::default_recalc_interval_secs")]
    pub recalc_interval_secs: f64,
    #[serde(default = "crate::config::defaults::default_seek_back_threshold_secs")]
    pub seek_back_threshold_secs: f64,
    #[serde(default = "crate::config::defaults::default_enabled")]
    pub default_enabled: bool,
    #[serde(default = "crate::config::defaults::default_target_multiplier")]
    pub default_target_multiplier: f64,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            navigation_settle_ms: crate::config::defaults::default_navigation_settle_ms(),
            panel_auto_close_ms: crate::config::defaults::default_panel_auto_close_ms(),
            player_ready_max_attempts: crate::config::defaults::default_player_ready_max_attempts(
            ),
            player_ready_backoff_ms: crate::config::defaults::default_player_ready_backoff_ms(),
            baseline_wps: crate::config::defaults::default_baseline_wps(),
            lookahead_segments: crate::config::defaults::default_lookahead_segments(),
            recalc_interval_secs: crate::config::defaults::default_recalc_interval_secs(),
            seek_back_threshold_secs: crate::config::defaults::default_seek_back_threshold_secs(),
            default_enabled: crate::config::defaults::default_enabled(),
            default_target_multiplier: crate::config::defaults::default_target_multiplier(),
            cache_dir: crate::config::defaults::default_cache_dir(),
        }
    }
}

impl AppConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn panel_auto_close(&self) -> Duration {
        Duration::from_millis(self.panel_auto_close_ms)
    }

    pub fn player_ready_backoff(&self) -> Duration {
        Duration::from_millis(self.player_ready_backoff_ms)
    }

    /// Preferences used when nothing has been persisted yet.
    pub fn default_preferences(&self) -> UserPreferences {
        UserPreferences {
            enabled: self.default_enabled,
            target_multiplier: self.default_target_multiplier,
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
