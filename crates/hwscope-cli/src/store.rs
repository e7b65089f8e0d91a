//! TOML file backing for the session settings.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use hwscope_core::{Error, Result, Settings, SettingsStore};

/// Settings persisted as a TOML file.
///
/// A missing file loads as defaults. Saves write a sibling temp file and
/// rename it over the target so a crash never leaves a half-written file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved state, using defaults");
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            Error::settings(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::settings(format!("failed to serialize settings: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), sensors = settings.sensors.len(), "Saved state");
        Ok(())
    }
}
