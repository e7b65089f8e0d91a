//! Configuration file management.
//!
//! The config file lives at `<config dir>/hwscope/config.toml` unless
//! `--config` points elsewhere. It seeds the session settings and describes
//! the simulated hardware the CLI monitors.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hwscope_core::Settings;
use hwscope_types::{HardwareType, LoggingInterval, Rgb, SensorType, UpdateInterval};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Label of the tree root.
    pub host_name: String,

    /// Where per-sensor state is persisted. Defaults to the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Session defaults applied on top of the persisted state.
    pub monitor: MonitorConfig,

    /// Simulated hardware. Empty means the built-in demo machine.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hardware: Vec<HardwareConfig>,
}

/// Session defaults.
///
/// Unset fields leave the persisted value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<UpdateInterval>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_interval: Option<LoggingInterval>,

    /// Plot palette, as `#RRGGBB` strings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<Rgb>,
}

/// One simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    pub identifier: String,
    pub name: String,
    #[serde(rename = "type")]
    pub hardware_type: HardwareType,
    /// Random-walk step applied to every sensor on refresh.
    #[serde(default)]
    pub jitter: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<SensorConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_hardware: Vec<HardwareConfig>,
}

/// One simulated sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub name: String,
    pub value: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_name: default_host_name(),
            state_file: None,
            monitor: MonitorConfig::default(),
            hardware: Vec::new(),
        }
    }
}

fn default_host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

impl Config {
    /// Load the config at `path`, or defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - The host name is not empty
    /// - The palette lists no color twice
    /// - Hardware identifiers are present and unique, including nested devices
    /// - Sensor names are present and start values and jitter are finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.host_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "host_name".to_string(),
                message: "host name cannot be empty".to_string(),
            });
        }

        let mut colors = HashSet::new();
        for (i, color) in self.monitor.palette.iter().enumerate() {
            if !colors.insert(color) {
                errors.push(ValidationError {
                    field: format!("monitor.palette[{}]", i),
                    message: format!("duplicate color {}", color),
                });
            }
        }

        let mut seen = HashSet::new();
        for (i, hardware) in self.hardware.iter().enumerate() {
            hardware.validate(&format!("hardware[{}]", i), &mut seen, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Apply the configured session defaults to loaded settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        let monitor = &self.monitor;
        if let Some(interval) = monitor.update_interval {
            settings.update_interval = interval;
        }
        if let Some(enabled) = monitor.logging {
            settings.logging.enabled = enabled;
        }
        if let Some(interval) = monitor.logging_interval {
            settings.logging.interval = interval;
        }
        if !monitor.palette.is_empty() {
            settings.palette = monitor.palette.clone();
        }
    }

    /// Path of the persisted state file.
    pub fn state_path(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_path)
    }
}

impl HardwareConfig {
    fn validate(&self, prefix: &str, seen: &mut HashSet<String>, errors: &mut Vec<ValidationError>) {
        if self.identifier.trim().is_empty() {
            errors.push(ValidationError {
                field: format!("{}.identifier", prefix),
                message: "identifier cannot be empty".to_string(),
            });
        } else if !seen.insert(self.identifier.clone()) {
            errors.push(ValidationError {
                field: format!("{}.identifier", prefix),
                message: format!("duplicate hardware identifier '{}'", self.identifier),
            });
        }

        if !self.jitter.is_finite() || self.jitter < 0.0 {
            errors.push(ValidationError {
                field: format!("{}.jitter", prefix),
                message: format!("jitter must be a non-negative number, got {}", self.jitter),
            });
        }

        for (i, sensor) in self.sensors.iter().enumerate() {
            let field = format!("{}.sensors[{}]", prefix, i);
            if sensor.name.trim().is_empty() {
                errors.push(ValidationError {
                    field: format!("{}.name", field),
                    message: "sensor name cannot be empty".to_string(),
                });
            }
            if !sensor.value.is_finite() {
                errors.push(ValidationError {
                    field: format!("{}.value", field),
                    message: "start value must be finite".to_string(),
                });
            }
        }

        for (i, sub) in self.sub_hardware.iter().enumerate() {
            sub.validate(&format!("{}.sub_hardware[{}]", prefix, i), seen, errors);
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `monitor.palette[2]` or `hardware[0].identifier`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hwscope")
        .join("config.toml")
}

/// Default path of the persisted sensor state.
pub fn default_state_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hwscope")
        .join("state.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu() -> HardwareConfig {
        HardwareConfig {
            identifier: "/amdcpu/0".to_string(),
            name: "AMD Ryzen 7 5800X".to_string(),
            hardware_type: HardwareType::Cpu,
            jitter: 1.0,
            sensors: vec![SensorConfig {
                sensor_type: SensorType::Temperature,
                name: "Tctl".to_string(),
                value: 45.0,
            }],
            sub_hardware: Vec::new(),
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.host_name.is_empty());
        assert!(config.hardware.is_empty());
        assert_eq!(config.monitor, MonitorConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hardware_config_serde() {
        let toml = r##"
            host_name = "workstation"

            [monitor]
            update_interval = "250ms"
            logging = true
            palette = ["#FF0000", "#00FF00"]

            [[hardware]]
            identifier = "/mainboard"
            name = "ROG STRIX B550-F"
            type = "mainboard"

            [[hardware.sub_hardware]]
            identifier = "/lpc/nct6798d"
            name = "Nuvoton NCT6798D"
            type = "super_io"
            jitter = 0.5
            sensors = [{ type = "fan", name = "CPU Fan", value = 950.0 }]
        "##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.host_name, "workstation");
        assert_eq!(config.monitor.update_interval, Some(UpdateInterval::Ms250));
        assert_eq!(config.monitor.logging, Some(true));
        assert_eq!(config.monitor.palette, vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]);

        let board = &config.hardware[0];
        assert_eq!(board.hardware_type, HardwareType::Mainboard);
        assert_eq!(board.jitter, 0.0);
        let superio = &board.sub_hardware[0];
        assert_eq!(superio.hardware_type, HardwareType::SuperIo);
        assert_eq!(superio.sensors[0].sensor_type, SensorType::Fan);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_interval_is_a_parse_error() {
        let toml = r#"
            [monitor]
            update_interval = "3s"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut nested = cpu();
        nested.jitter = -1.0;
        nested.sensors[0].name = " ".to_string();
        let mut board = cpu();
        board.sub_hardware.push(nested);

        let config = Config {
            host_name: String::new(),
            monitor: MonitorConfig {
                palette: vec![Rgb::RED, Rgb::BLUE, Rgb::RED],
                ..Default::default()
            },
            hardware: vec![board],
            ..Default::default()
        };

        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "host_name",
                "monitor.palette[2]",
                "hardware[0].sub_hardware[0].identifier",
                "hardware[0].sub_hardware[0].jitter",
                "hardware[0].sub_hardware[0].sensors[0].name",
            ]
        );
        assert!(errors[2].message.contains("duplicate"));
    }

    #[test]
    fn test_apply_to_only_touches_set_fields() {
        let mut settings = Settings::default();
        settings.show_hidden = true;
        settings.logging.interval = LoggingInterval::M5;

        let config = Config {
            monitor: MonitorConfig {
                update_interval: Some(UpdateInterval::Ms500),
                logging: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        config.apply_to(&mut settings);

        assert_eq!(settings.update_interval, UpdateInterval::Ms500);
        assert!(settings.logging.enabled);
        assert_eq!(settings.logging.interval, LoggingInterval::M5);
        assert!(settings.show_hidden);
        assert!(settings.palette.is_empty());
    }

    #[test]
    fn test_state_path_prefers_config() {
        let config = Config {
            state_file: Some(PathBuf::from("/tmp/hwscope-state.toml")),
            ..Default::default()
        };
        assert_eq!(config.state_path(), PathBuf::from("/tmp/hwscope-state.toml"));
        assert!(Config::default().state_path().ends_with("hwscope/state.toml"));
    }
}
