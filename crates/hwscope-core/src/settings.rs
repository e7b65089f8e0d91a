//! Persisted user settings.
//!
//! The session loads [`Settings`] once at construction and saves after every
//! user mutation. Storage is behind [`SettingsStore`]; the core only defines
//! the shape of the data, the front-end decides where and how it is written.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use hwscope_types::{DEFAULT_PALETTE, LoggingInterval, Rgb, UpdateInterval};

use crate::error::{Error, Result};

/// Everything the session persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sampling interval.
    pub update_interval: UpdateInterval,
    /// Show sensors the user hid.
    pub show_hidden: bool,
    /// Plot palette. Empty means [`DEFAULT_PALETTE`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<Rgb>,
    /// Sensor logging.
    pub logging: LoggingSettings,
    /// Per-sensor state keyed by sensor identifier.
    pub sensors: BTreeMap<String, SensorOverrides>,
    /// Expand/collapse state keyed by node key.
    pub expanded: BTreeMap<String, bool>,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub enabled: bool,
    pub interval: LoggingInterval,
}

/// User state of one sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorOverrides {
    pub plot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pen_color: Option<Rgb>,
    pub hidden: bool,
}

impl SensorOverrides {
    /// Whether this entry carries nothing beyond the defaults.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Settings {
    /// Palette to color plots with.
    pub fn effective_palette(&self) -> Vec<Rgb> {
        if self.palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            self.palette.clone()
        }
    }

    /// Stored state for a sensor, if any.
    pub fn sensor(&self, identifier: &str) -> Option<&SensorOverrides> {
        self.sensors.get(identifier)
    }

    /// Update a sensor's stored state, dropping the entry once it is back to defaults.
    pub fn update_sensor(&mut self, identifier: &str, f: impl FnOnce(&mut SensorOverrides)) {
        let entry = self.sensors.entry(identifier.to_string()).or_default();
        f(entry);
        if entry.is_default() {
            self.sensors.remove(identifier);
        }
    }

    /// Stored expand state for a node key, defaulting to expanded.
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.get(key).copied().unwrap_or(true)
    }

    pub fn set_expanded(&mut self, key: &str, expanded: bool) {
        if expanded {
            self.expanded.remove(key);
        } else {
            self.expanded.insert(key.to_string(), false);
        }
    }

    /// Replace the palette, keeping the first occurrence of each color.
    ///
    /// Returns how many duplicate entries were dropped.
    pub fn set_palette(&mut self, palette: Vec<Rgb>) -> usize {
        let given = palette.len();
        let mut seen = std::collections::HashSet::new();
        self.palette = palette.into_iter().filter(|c| seen.insert(*c)).collect();
        given - self.palette.len()
    }

    /// Fix whatever [`validate`](Self::validate) would reject, field by field.
    ///
    /// Returns a description of each repair; empty when nothing changed.
    pub fn repair(&mut self) -> Vec<String> {
        let mut repairs = Vec::new();
        if self.sensors.remove("").is_some() {
            repairs.push("dropped sensor entry with empty identifier".to_string());
        }
        if self.expanded.remove("").is_some() {
            repairs.push("dropped expanded entry with empty key".to_string());
        }
        let palette = std::mem::take(&mut self.palette);
        let dropped = self.set_palette(palette);
        if dropped > 0 {
            repairs.push(format!("dropped {dropped} duplicate palette colors"));
        }
        repairs
    }

    /// Check invariants the session relies on.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.sensors.contains_key("") {
            problems.push("sensor entry with empty identifier".to_string());
        }
        if self.expanded.contains_key("") {
            problems.push("expanded entry with empty key".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for color in &self.palette {
            if !seen.insert(color) {
                problems.push(format!("palette lists {color} more than once"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::invalid_config(problems.join("; ")))
        }
    }
}

/// Load/save boundary for [`Settings`].
pub trait SettingsStore: Send + Sync {
    /// Load settings. A store with nothing saved yet returns defaults.
    fn load(&self) -> Result<Settings>;

    /// Persist settings.
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// In-memory store, with failure injection for tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Default::default()
        }
    }

    /// Make every subsequent save fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved settings.
    pub fn current(&self) -> Settings {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        Ok(self.current())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::settings("store is read-only"));
        }
        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.update_interval, UpdateInterval::S1);
        assert!(!settings.logging.enabled);
        assert_eq!(settings.logging.interval, LoggingInterval::S5);
        assert_eq!(settings.effective_palette(), DEFAULT_PALETTE.to_vec());
        assert!(settings.is_expanded("/anything"));
        settings.validate().unwrap();
    }

    #[test]
    fn test_update_sensor_prunes_defaults() {
        let mut settings = Settings::default();
        settings.update_sensor("/cpu/0/load/0", |s| s.plot = true);
        assert!(settings.sensor("/cpu/0/load/0").unwrap().plot);

        settings.update_sensor("/cpu/0/load/0", |s| s.plot = false);
        assert!(settings.sensor("/cpu/0/load/0").is_none());
    }

    #[test]
    fn test_set_expanded_only_stores_collapsed() {
        let mut settings = Settings::default();
        settings.set_expanded("/mainboard", false);
        assert!(!settings.is_expanded("/mainboard"));
        settings.set_expanded("/mainboard", true);
        assert!(settings.expanded.is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_palette_entries() {
        let settings = Settings {
            palette: vec![Rgb::RED, Rgb::BLUE, Rgb::RED],
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("#FF0000"));
    }

    #[test]
    fn test_set_palette_keeps_first_occurrence() {
        let mut settings = Settings::default();
        let dropped = settings.set_palette(vec![Rgb::RED, Rgb::BLUE, Rgb::RED, Rgb::BLUE, Rgb::OLIVE]);
        assert_eq!(dropped, 2);
        assert_eq!(settings.palette, vec![Rgb::RED, Rgb::BLUE, Rgb::OLIVE]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_repair_only_touches_invalid_fields() {
        let mut settings = Settings {
            update_interval: UpdateInterval::S5,
            palette: vec![Rgb::RED, Rgb::RED],
            ..Default::default()
        };
        settings.update_sensor("/amdcpu/0/load/0", |s| s.plot = true);
        settings.sensors.insert(String::new(), SensorOverrides::default());
        assert!(settings.validate().is_err());

        let repairs = settings.repair();
        assert_eq!(repairs.len(), 2);
        assert!(settings.validate().is_ok());
        assert_eq!(settings.palette, vec![Rgb::RED]);
        assert_eq!(settings.update_interval, UpdateInterval::S5);
        assert!(settings.sensor("/amdcpu/0/load/0").unwrap().plot);

        assert!(settings.repair().is_empty());
    }

    #[test]
    fn test_serde_round_trip_uses_labels() {
        let mut settings = Settings {
            update_interval: UpdateInterval::Ms500,
            ..Default::default()
        };
        settings.update_sensor("/gpu/0/temperature/0", |s| {
            s.plot = true;
            s.pen_color = Some(Rgb::DEEP_PINK);
        });

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["update_interval"], "500ms");
        assert_eq!(json["sensors"]["/gpu/0/temperature/0"]["pen_color"], "#FF1493");

        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_missing_fields_default() {
        let settings: Settings = serde_json::from_str(r#"{"show_hidden": true}"#).unwrap();
        assert!(settings.show_hidden);
        assert_eq!(settings.update_interval, UpdateInterval::S1);
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemorySettingsStore::new(Settings::default());
        let mut settings = store.load().unwrap();
        settings.show_hidden = true;
        store.save(&settings).unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_fail_saves(true);
        settings.show_hidden = false;
        assert!(matches!(store.save(&settings), Err(Error::Settings(_))));
        assert!(store.current().show_hidden);
    }
}
