pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    1000
}

pub(crate) fn default_navigation_settle_ms() -> u64 {
    2000
}

pub(crate) fn default_panel_auto_close_ms() -> u64 {
    5000
}

pub(crate) fn default_player_ready_max_attempts() -> u32 {
    20
}

pub(crate) fn default_player_ready_backoff_ms() -> u64 {
    500
}

pub(crate) fn default_baseline_wps() -> f64 {
    crate::analyzer::BASELINE_WPS
}

pub(crate) fn default_lookahead_segments() -> usize {
    crate::analyzer::LOOKAHEAD
}

pub(crate) fn default_recalc_interval_secs() -> f64 {
    16.0
}

pub(crate) fn default_seek_back_threshold_secs() -> f64 {
    2.0
}

pub(crate) fn default_enabled() -> bool {
    true
}

pub(crate) fn default_target_multiplier() -> f64 {
    1.0
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}
