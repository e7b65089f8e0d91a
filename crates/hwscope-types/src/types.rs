//! Core classification types for hardware and sensors.

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Classification of a hardware device.
///
/// The declaration order is the display order: sibling hardware in the tree is
/// kept sorted ascending by this type, so a mainboard is always listed before
/// the CPU and the CPU before any storage device.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new hardware types
/// in future versions without breaking downstream code.
///
/// ```
/// use hwscope_types::HardwareType;
///
/// assert!(HardwareType::Mainboard < HardwareType::Cpu);
/// assert!(HardwareType::Cpu < HardwareType::Storage);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum HardwareType {
    /// Motherboard.
    Mainboard,
    /// Super I/O chip (usually nested under the mainboard).
    SuperIo,
    /// Processor package.
    Cpu,
    /// System memory.
    Memory,
    /// NVIDIA graphics card.
    GpuNvidia,
    /// AMD graphics card.
    GpuAmd,
    /// Intel graphics.
    GpuIntel,
    /// Fan or pump controller.
    Cooler,
    /// Embedded controller.
    EmbeddedController,
    /// Power supply.
    Psu,
    /// Battery.
    Battery,
    /// Disk or SSD.
    Storage,
    /// Network adapter.
    Network,
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HardwareType::Mainboard => "Mainboard",
            HardwareType::SuperIo => "Super I/O",
            HardwareType::Cpu => "CPU",
            HardwareType::Memory => "Memory",
            HardwareType::GpuNvidia => "NVIDIA GPU",
            HardwareType::GpuAmd => "AMD GPU",
            HardwareType::GpuIntel => "Intel GPU",
            HardwareType::Cooler => "Cooler",
            HardwareType::EmbeddedController => "Embedded Controller",
            HardwareType::Psu => "PSU",
            HardwareType::Battery => "Battery",
            HardwareType::Storage => "Storage",
            HardwareType::Network => "Network",
        };
        f.write_str(label)
    }
}

/// Kind of measurement a sensor reports.
///
/// Sensors of one hardware device are listed grouped by this type, in
/// declaration order.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new sensor types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum SensorType {
    /// Voltage in V.
    Voltage,
    /// Clock speed in MHz.
    Clock,
    /// Temperature in °C.
    Temperature,
    /// Utilization in %.
    Load,
    /// Frequency in Hz.
    Frequency,
    /// Fan speed in RPM.
    Fan,
    /// Liquid flow in L/h.
    Flow,
    /// Fan or pump duty in %.
    Control,
    /// Fill or wear level in %.
    Level,
    /// Dimensionless factor.
    Factor,
    /// Power in W.
    Power,
    /// Amount of data in GB.
    Data,
    /// Amount of data in MB.
    SmallData,
    /// Transfer rate in KB/s.
    Throughput,
}

impl SensorType {
    /// Unit suffix shown after formatted values (empty for [`SensorType::Factor`]).
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Voltage => "V",
            SensorType::Clock => "MHz",
            SensorType::Temperature => "°C",
            SensorType::Load | SensorType::Control | SensorType::Level => "%",
            SensorType::Frequency => "Hz",
            SensorType::Fan => "RPM",
            SensorType::Flow => "L/h",
            SensorType::Factor => "",
            SensorType::Power => "W",
            SensorType::Data => "GB",
            SensorType::SmallData => "MB",
            SensorType::Throughput => "KB/s",
        }
    }

    /// Lowercase path segment used in sensor identifiers (`/amdcpu/0/temperature/2`).
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            SensorType::Voltage => "voltage",
            SensorType::Clock => "clock",
            SensorType::Temperature => "temperature",
            SensorType::Load => "load",
            SensorType::Frequency => "frequency",
            SensorType::Fan => "fan",
            SensorType::Flow => "flow",
            SensorType::Control => "control",
            SensorType::Level => "level",
            SensorType::Factor => "factor",
            SensorType::Power => "power",
            SensorType::Data => "data",
            SensorType::SmallData => "smalldata",
            SensorType::Throughput => "throughput",
        }
    }

    /// Format a value with the precision and unit used for this sensor type.
    ///
    /// ```
    /// use hwscope_types::SensorType;
    ///
    /// assert_eq!(SensorType::Temperature.format_value(41.26), "41.3 °C");
    /// assert_eq!(SensorType::Voltage.format_value(1.2), "1.200 V");
    /// assert_eq!(SensorType::Fan.format_value(1187.6), "1188 RPM");
    /// assert_eq!(SensorType::Factor.format_value(0.5), "0.500");
    /// ```
    #[must_use]
    pub fn format_value(&self, value: f32) -> String {
        let precision = match self {
            SensorType::Voltage | SensorType::Factor => 3,
            SensorType::Fan | SensorType::Flow => 0,
            _ => 1,
        };
        match self.unit() {
            "" => format!("{value:.precision$}"),
            unit => format!("{value:.precision$} {unit}"),
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SensorType::Voltage => "Voltage",
            SensorType::Clock => "Clock",
            SensorType::Temperature => "Temperature",
            SensorType::Load => "Load",
            SensorType::Frequency => "Frequency",
            SensorType::Fan => "Fan",
            SensorType::Flow => "Flow",
            SensorType::Control => "Control",
            SensorType::Level => "Level",
            SensorType::Factor => "Factor",
            SensorType::Power => "Power",
            SensorType::Data => "Data",
            SensorType::SmallData => "Small Data",
            SensorType::Throughput => "Throughput",
        };
        f.write_str(label)
    }
}

/// Generates a closed set of interval choices with label parsing and serde.
macro_rules! interval_choices {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident,
        { $( $(#[$vmeta:meta])* $variant:ident => ($label:literal, $millis:literal) ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// All choices, shortest first.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// The interval as a duration.
            #[must_use]
            pub fn as_duration(&self) -> Duration {
                match self {
                    $( $name::$variant => Duration::from_millis($millis), )+
                }
            }

            /// Short label such as `"500ms"` or `"2m"`.
            #[must_use]
            pub fn label(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }

            /// Find the choice matching `duration` exactly.
            #[must_use]
            pub fn from_duration(duration: Duration) -> Option<Self> {
                Self::ALL.iter().copied().find(|c| c.as_duration() == duration)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| ParseError::UnknownInterval {
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|c| c.label())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        #[cfg(feature = "serde")]
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

interval_choices! {
    /// How often sensor values are refreshed.
    ///
    /// ```
    /// use hwscope_types::UpdateInterval;
    /// use std::time::Duration;
    ///
    /// assert_eq!(UpdateInterval::default().as_duration(), Duration::from_secs(1));
    /// assert_eq!("250ms".parse::<UpdateInterval>(), Ok(UpdateInterval::Ms250));
    /// ```
    UpdateInterval, default = S1,
    {
        /// 250 milliseconds.
        Ms250 => ("250ms", 250),
        /// 500 milliseconds.
        Ms500 => ("500ms", 500),
        /// 1 second.
        S1 => ("1s", 1_000),
        /// 2 seconds.
        S2 => ("2s", 2_000),
        /// 5 seconds.
        S5 => ("5s", 5_000),
        /// 10 seconds.
        S10 => ("10s", 10_000),
    }
}

interval_choices! {
    /// Minimum time between two appended log records.
    LoggingInterval, default = S5,
    {
        /// 1 second.
        S1 => ("1s", 1_000),
        /// 2 seconds.
        S2 => ("2s", 2_000),
        /// 5 seconds.
        S5 => ("5s", 5_000),
        /// 10 seconds.
        S10 => ("10s", 10_000),
        /// 30 seconds.
        S30 => ("30s", 30_000),
        /// 1 minute.
        M1 => ("1m", 60_000),
        /// 2 minutes.
        M2 => ("2m", 120_000),
        /// 5 minutes.
        M5 => ("5m", 300_000),
        /// 10 minutes.
        M10 => ("10m", 600_000),
        /// 30 minutes.
        M30 => ("30m", 1_800_000),
        /// 1 hour.
        H1 => ("1h", 3_600_000),
        /// 2 hours.
        H2 => ("2h", 7_200_000),
        /// 6 hours.
        H6 => ("6h", 21_600_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_type_order_matches_display_order() {
        let mut types = vec![
            HardwareType::Storage,
            HardwareType::Cpu,
            HardwareType::GpuNvidia,
            HardwareType::Mainboard,
            HardwareType::Memory,
        ];
        types.sort();
        assert_eq!(
            types,
            vec![
                HardwareType::Mainboard,
                HardwareType::Cpu,
                HardwareType::Memory,
                HardwareType::GpuNvidia,
                HardwareType::Storage,
            ]
        );
    }

    #[test]
    fn test_sensor_format_precision() {
        assert_eq!(SensorType::Load.format_value(12.34), "12.3 %");
        assert_eq!(SensorType::Clock.format_value(3600.0), "3600.0 MHz");
        assert_eq!(SensorType::Flow.format_value(80.4), "80 L/h");
        assert_eq!(SensorType::SmallData.format_value(512.0), "512.0 MB");
    }

    #[test]
    fn test_path_segment_is_lowercase() {
        assert_eq!(SensorType::Temperature.path_segment(), "temperature");
        assert_eq!(SensorType::SmallData.path_segment(), "smalldata");
    }

    #[test]
    fn test_update_interval_labels_round_trip() {
        for interval in UpdateInterval::ALL {
            assert_eq!(interval.label().parse::<UpdateInterval>(), Ok(*interval));
        }
        assert_eq!("1S".parse::<UpdateInterval>(), Ok(UpdateInterval::S1));
    }

    #[test]
    fn test_unknown_interval_lists_choices() {
        let err = "3s".parse::<UpdateInterval>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'3s'"));
        assert!(msg.contains("250ms, 500ms, 1s, 2s, 5s, 10s"));
    }

    #[test]
    fn test_logging_interval_from_duration() {
        assert_eq!(
            LoggingInterval::from_duration(Duration::from_secs(3600)),
            Some(LoggingInterval::H1)
        );
        assert_eq!(LoggingInterval::from_duration(Duration::from_secs(7)), None);
        assert_eq!(LoggingInterval::default(), LoggingInterval::S5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&HardwareType::GpuNvidia).unwrap(),
            "\"gpu_nvidia\""
        );
        assert_eq!(
            serde_json::to_string(&SensorType::SmallData).unwrap(),
            "\"small_data\""
        );
        assert_eq!(
            serde_json::to_string(&LoggingInterval::M30).unwrap(),
            "\"30m\""
        );
        let parsed: UpdateInterval = serde_json::from_str("\"10s\"").unwrap();
        assert_eq!(parsed, UpdateInterval::S10);
    }
}
