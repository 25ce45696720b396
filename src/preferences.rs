//! The two user preferences shared by every session.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Lowest multiplier the controls accept.
pub const MIN_MULTIPLIER: f64 = 0.5;
/// Highest multiplier the controls accept.
pub const MAX_MULTIPLIER: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub enabled: bool,
    pub target_multiplier: f64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            target_multiplier: 1.0,
        }
    }
}

impl UserPreferences {
    pub fn apply(&mut self, patch: PreferencesPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(multiplier) = patch.target_multiplier {
            self.target_multiplier = normalize_multiplier(multiplier);
        }
    }

    /// Patch that rewrites every field.
    pub fn as_patch(&self) -> PreferencesPatch {
        PreferencesPatch {
            enabled: Some(self.enabled),
            target_multiplier: Some(self.target_multiplier),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreferencesPatch {
    pub enabled: Option<bool>,
    pub target_multiplier: Option<f64>,
}

/// Clamp to `[MIN_MULTIPLIER, MAX_MULTIPLIER]` in 0.05 steps.
pub fn normalize_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_nan() {
        return 1.0;
    }
    let clamped = multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);
    ((clamped * 20.0).round() / 20.0 * 100.0).round() / 100.0
}

pub trait PreferenceStore {
    /// `None` when nothing has been persisted yet.
    fn get(&self) -> Result<Option<UserPreferences>>;
    fn set(&mut self, patch: PreferencesPatch) -> Result<()>;
}

/// Process-local store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    slot: Arc<Mutex<Option<UserPreferences>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(preferences: UserPreferences) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(preferences))),
        }
    }

    pub fn snapshot(&self) -> Option<UserPreferences> {
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self) -> Result<Option<UserPreferences>> {
        Ok(self.snapshot())
    }

    fn set(&mut self, patch: PreferencesPatch) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut preferences = slot.unwrap_or_default();
        preferences.apply(patch);
        *slot = Some(preferences);
        Ok(())
    }
}
