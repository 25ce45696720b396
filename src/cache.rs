//! Preferences persisted under the cache directory.
//!
//! The format is a tiny TOML file with `enabled` and `target_multiplier`.

use crate::preferences::{PreferenceStore, PreferencesPatch, UserPreferences};
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_cache_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self) -> Result<Option<UserPreferences>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Reading preferences {}", self.path.display()));
            }
        };
        let preferences: UserPreferences = toml::from_str(&data)
            .with_context(|| format!("Parsing preferences {}", self.path.display()))?;
        Ok(Some(preferences))
    }

    fn set(&mut self, patch: PreferencesPatch) -> Result<()> {
        let mut preferences = self.get().ok().flatten().unwrap_or_default();
        preferences.apply(patch);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating cache dir {}", parent.display()))?;
        }
        let contents = toml::to_string(&preferences).context("Serializing preferences")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Writing preferences {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            enabled = preferences.enabled,
            target_multiplier = preferences.target_multiplier,
            "Saved preferences"
        );
        Ok(())
    }
}
