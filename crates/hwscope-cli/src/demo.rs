//! Simulated hardware built from the config file.

use std::sync::Arc;

use hwscope_core::mock::{MockHardware, MockHost};
use hwscope_types::{HardwareType, SensorType};

use crate::config::{HardwareConfig, SensorConfig};

/// Build a mock host from hardware descriptions.
///
/// An empty list yields [`demo_machine`].
pub fn build_host(hardware: &[HardwareConfig]) -> Arc<MockHost> {
    let described;
    let hardware: &[HardwareConfig] = if hardware.is_empty() {
        described = demo_machine();
        &described
    } else {
        hardware
    };

    hardware
        .iter()
        .fold(MockHost::builder(), |builder, hw| builder.hardware(build_hardware(hw)))
        .build()
}

fn build_hardware(config: &HardwareConfig) -> Arc<MockHardware> {
    let mut builder = MockHardware::builder(&config.identifier, &config.name, config.hardware_type)
        .jitter(config.jitter);
    for sensor in &config.sensors {
        builder = builder.sensor(sensor.sensor_type, &sensor.name, sensor.value);
    }
    for sub in &config.sub_hardware {
        builder = builder.sub_hardware(build_hardware(sub));
    }
    builder.build()
}

fn sensor(sensor_type: SensorType, name: &str, value: f32) -> SensorConfig {
    SensorConfig {
        sensor_type,
        name: name.to_string(),
        value,
    }
}

/// A small desktop: mainboard with a Super I/O chip, CPU, GPU and one SSD.
pub fn demo_machine() -> Vec<HardwareConfig> {
    vec![
        HardwareConfig {
            identifier: "/amdcpu/0".to_string(),
            name: "AMD Ryzen 7 5800X".to_string(),
            hardware_type: HardwareType::Cpu,
            jitter: 1.5,
            sensors: vec![
                sensor(SensorType::Voltage, "Core (SVI2 TFN)", 1.2),
                sensor(SensorType::Clock, "Core #1", 4450.0),
                sensor(SensorType::Clock, "Core #2", 4425.0),
                sensor(SensorType::Temperature, "Core (Tctl/Tdie)", 48.0),
                sensor(SensorType::Load, "CPU Total", 8.0),
                sensor(SensorType::Power, "Package", 38.0),
            ],
            sub_hardware: Vec::new(),
        },
        HardwareConfig {
            identifier: "/nvme/0".to_string(),
            name: "Samsung SSD 980 PRO 1TB".to_string(),
            hardware_type: HardwareType::Storage,
            jitter: 0.2,
            sensors: vec![
                sensor(SensorType::Temperature, "Composite Temperature", 39.0),
                sensor(SensorType::Level, "Available Spare", 100.0),
                sensor(SensorType::Data, "Data Written", 12_480.0),
            ],
            sub_hardware: Vec::new(),
        },
        HardwareConfig {
            identifier: "/mainboard".to_string(),
            name: "ROG STRIX B550-F GAMING".to_string(),
            hardware_type: HardwareType::Mainboard,
            jitter: 0.0,
            sensors: Vec::new(),
            sub_hardware: vec![HardwareConfig {
                identifier: "/lpc/nct6798d".to_string(),
                name: "Nuvoton NCT6798D".to_string(),
                hardware_type: HardwareType::SuperIo,
                jitter: 0.8,
                sensors: vec![
                    sensor(SensorType::Voltage, "Vcore", 1.1),
                    sensor(SensorType::Temperature, "Motherboard", 34.0),
                    sensor(SensorType::Fan, "CPU Fan", 980.0),
                    sensor(SensorType::Fan, "Chassis Fan #1", 720.0),
                    sensor(SensorType::Control, "CPU Fan", 42.0),
                ],
                sub_hardware: Vec::new(),
            }],
        },
        HardwareConfig {
            identifier: "/gpu-nvidia/0".to_string(),
            name: "NVIDIA GeForce RTX 3070".to_string(),
            hardware_type: HardwareType::GpuNvidia,
            jitter: 1.0,
            sensors: vec![
                sensor(SensorType::Clock, "GPU Core", 1710.0),
                sensor(SensorType::Temperature, "GPU Core", 44.0),
                sensor(SensorType::Load, "GPU Core", 3.0),
                sensor(SensorType::Fan, "GPU Fan", 0.0),
            ],
            sub_hardware: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    use hwscope_core::{Hardware, HardwareHost, Sensor};

    #[test]
    fn test_empty_description_builds_demo_machine() {
        let host = build_host(&[]);
        let identifiers: Vec<String> = host
            .hardware()
            .iter()
            .map(|h| h.identifier().to_string())
            .collect();
        assert_eq!(
            identifiers,
            vec!["/amdcpu/0", "/nvme/0", "/mainboard", "/gpu-nvidia/0"]
        );
    }

    #[test]
    fn test_nested_hardware_and_sensor_indices() {
        let host = build_host(&demo_machine());
        let board = host
            .hardware()
            .into_iter()
            .find(|h| h.identifier() == "/mainboard")
            .unwrap();
        let superio = &board.sub_hardware()[0];
        assert_eq!(superio.hardware_type(), HardwareType::SuperIo);

        let fans: Vec<String> = superio
            .sensors()
            .iter()
            .filter(|s| s.sensor_type() == SensorType::Fan)
            .map(|s| s.identifier().to_string())
            .collect();
        assert_eq!(fans, vec!["/lpc/nct6798d/fan/0", "/lpc/nct6798d/fan/1"]);
    }

    #[test]
    fn test_demo_machine_is_valid() {
        let config = crate::config::Config {
            hardware: demo_machine(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
