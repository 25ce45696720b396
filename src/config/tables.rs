use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    analysis: AnalysisConfig,
    #[serde(default)]
    preferences: PreferencesConfig,
    #[serde(default)]
    storage: StorageConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            tick_interval_ms: tables.timing.tick_interval_ms,
            navigation_settle_ms: tables.timing.navigation_settle_ms,
            panel_auto_close_ms: tables.timing.panel_auto_close_ms,
            player_ready_max_attempts: tables.timing.player_ready_max_attempts,
            player_ready_backoff_ms: tables.timing.player_ready_backoff_ms,
            baseline_wps: tables.analysis.baseline_wps,
            lookahead_segments: tables.analysis.lookahead_segments,
            recalc_interval_secs: tables.analysis.recalc_interval_secs,
            seek_back_threshold_secs: tables.analysis.seek_back_threshold_secs,
            default_enabled: tables.preferences.enabled,
            default_target_multiplier: tables.preferences.target_multiplier,
            cache_dir: tables.storage.cache_dir,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            timing: TimingConfig {
                tick_interval_ms: config.tick_interval_ms,
                navigation_settle_ms: config.navigation_settle_ms,
                panel_auto_close_ms: config.panel_auto_close_ms,
                player_ready_max_attempts: config.player_ready_max_attempts,
                player_ready_backoff_ms: config.player_ready_backoff_ms,
            },
            analysis: AnalysisConfig {
                baseline_wps: config.baseline_wps,
                lookahead_segments: config.lookahead_segments,
                recalc_interval_secs: config.recalc_interval_secs,
                seek_back_threshold_secs: config.seek_back_threshold_secs,
            },
            preferences: PreferencesConfig {
                enabled: config.default_enabled,
                target_multiplier: config.default_target_multiplier,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TimingConfig {
    #[serde(default = "defaults::default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "defaults::default_navigation_settle_ms")]
    navigation_settle_ms: u64,
    #[serde(default = "defaults::default_panel_auto_close_ms")]
    panel_auto_close_ms: u64,
    #[serde(default = "defaults::default_player_ready_max_attempts")]
    player_ready_max_attempts: u32,
    #[serde(default = "defaults::default_player_ready_backoff_ms")]
    player_ready_backoff_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_interval_ms: defaults::default_tick_interval_ms(),
            navigation_settle_ms: defaults::default_navigation_settle_ms(),
            panel_auto_close_ms: defaults::default_panel_auto_close_ms(),
            player_ready_max_attempts: defaults::default_player_ready_max_attempts(),
            player_ready_backoff_ms: defaults::default_player_ready_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AnalysisConfig {
    #[serde(default = "defaults::default_baseline_wps")]
    baseline_wps: f64,
    #[serde(default = "defaults::default_lookahead_segments")]
    lookahead_segments: usize,
    #[serde(default = "defaults::default_recalc_interval_secs")]
    recalc_interval_secs: f64,
    #[serde(default = "defaults::default_seek_back_threshold_secs")]
    seek_back_threshold_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            baseline_wps: defaults::default_baseline_wps(),
            lookahead_segments: defaults::default_lookahead_segments(),
            recalc_interval_secs: defaults::default_recalc_interval_secs(),
            seek_back_threshold_secs: defaults::default_seek_back_threshold_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PreferencesConfig {
    #[serde(default = "defaults::default_enabled")]
    enabled: bool,
    #[serde(default = "defaults::default_target_multiplier")]
    target_multiplier: f64,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        PreferencesConfig {
            enabled: defaults::default_enabled(),
            target_multiplier: defaults::default_target_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}
