//! Mock hardware for testing and demos.
//!
//! [`MockHost`], [`MockHardware`] and [`MockSensor`] implement the hardware
//! traits without touching real devices. Values follow a bounded random walk
//! on every `update`, so a session driven by the mock shows moving numbers.
//!
//! # Features
//!
//! - **Hot-plug**: add or remove devices and sensors while a session runs
//! - **Failure injection**: make `update` fail, or make the logger fail
//! - **Latency simulation**: make `update` block for a while on the worker

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use hwscope_types::{HardwareType, SensorType};

use crate::error::{Error, Result};
use crate::logger::LogRecord;
use crate::traits::{
    Hardware, HardwareHost, Sensor, SensorLogger, SharedHardware, SharedSensor,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy)]
struct Reading {
    value: f32,
    min: f32,
    max: f32,
}

/// A mock sensor.
///
/// ```
/// use hwscope_core::mock::MockSensor;
/// use hwscope_core::Sensor;
/// use hwscope_types::SensorType;
///
/// let sensor = MockSensor::new("/amdcpu/0/load/0", "Total", SensorType::Load, 0, 10.0);
/// sensor.set_value(30.0);
/// sensor.set_value(20.0);
/// assert_eq!(sensor.value(), Some(20.0));
/// assert_eq!(sensor.max(), Some(30.0));
/// ```
#[derive(Debug)]
pub struct MockSensor {
    identifier: String,
    name: String,
    sensor_type: SensorType,
    index: usize,
    reading: Mutex<Reading>,
}

impl MockSensor {
    pub fn new(identifier: &str, name: &str, sensor_type: SensorType, index: usize, value: f32) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            sensor_type,
            index,
            reading: Mutex::new(Reading {
                value,
                min: value,
                max: value,
            }),
        }
    }

    /// Set the current value, widening min/max as needed.
    pub fn set_value(&self, value: f32) {
        let mut reading = lock(&self.reading);
        reading.value = value;
        reading.min = reading.min.min(value);
        reading.max = reading.max.max(value);
    }

    fn wander(&self, rng: &mut impl Rng, jitter: f32) {
        if jitter <= 0.0 {
            return;
        }
        let current = lock(&self.reading).value;
        let next = (current + rng.random_range(-jitter..=jitter)).max(0.0);
        self.set_value(next);
    }
}

impl Sensor for MockSensor {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn index(&self) -> usize {
        self.index
    }

    fn value(&self) -> Option<f32> {
        Some(lock(&self.reading).value)
    }

    fn min(&self) -> Option<f32> {
        Some(lock(&self.reading).min)
    }

    fn max(&self) -> Option<f32> {
        Some(lock(&self.reading).max)
    }

    fn reset_min_max(&self) {
        let mut reading = lock(&self.reading);
        reading.min = reading.value;
        reading.max = reading.value;
    }
}

/// A mock hardware device.
#[derive(Debug)]
pub struct MockHardware {
    identifier: String,
    name: String,
    hardware_type: HardwareType,
    jitter: f32,
    sensors: RwLock<Vec<Arc<MockSensor>>>,
    sub_hardware: Vec<Arc<MockHardware>>,
}

impl MockHardware {
    /// Start building a device.
    pub fn builder(identifier: &str, name: &str, hardware_type: HardwareType) -> MockHardwareBuilder {
        MockHardwareBuilder {
            identifier: identifier.to_string(),
            name: name.to_string(),
            hardware_type,
            jitter: 0.0,
            sensors: Vec::new(),
            sub_hardware: Vec::new(),
        }
    }

    fn sensor_list(&self) -> Vec<Arc<MockSensor>> {
        self.sensors
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Attach a new sensor, numbered after the existing ones of the same type.
    ///
    /// The caller forwards the returned handle to the session as a sensor-added
    /// notification.
    pub fn add_sensor(&self, sensor_type: SensorType, name: &str, value: f32) -> Arc<MockSensor> {
        let mut sensors = self
            .sensors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = sensors
            .iter()
            .filter(|s| s.sensor_type == sensor_type)
            .map(|s| s.index + 1)
            .max()
            .unwrap_or(0);
        let sensor = Arc::new(MockSensor::new(
            &format!("{}/{}/{}", self.identifier, sensor_type.path_segment(), index),
            name,
            sensor_type,
            index,
            value,
        ));
        sensors.push(sensor.clone());
        sensor
    }

    /// Detach a sensor by identifier.
    pub fn remove_sensor(&self, identifier: &str) -> Option<Arc<MockSensor>> {
        let mut sensors = self
            .sensors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let position = sensors.iter().position(|s| s.identifier == identifier)?;
        Some(sensors.remove(position))
    }

    fn refresh(&self, rng: &mut impl Rng) {
        for sensor in self.sensor_list() {
            sensor.wander(rng, self.jitter);
        }
        for sub in &self.sub_hardware {
            sub.refresh(rng);
        }
    }

    fn reset_all(&self) {
        for sensor in self.sensor_list() {
            sensor.reset_min_max();
        }
        for sub in &self.sub_hardware {
            sub.reset_all();
        }
    }
}

impl Hardware for MockHardware {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hardware_type(&self) -> HardwareType {
        self.hardware_type
    }

    fn sensors(&self) -> Vec<SharedSensor> {
        self.sensor_list()
            .into_iter()
            .map(|s| s as SharedSensor)
            .collect()
    }

    fn sub_hardware(&self) -> Vec<SharedHardware> {
        self.sub_hardware
            .iter()
            .map(|h| h.clone() as SharedHardware)
            .collect()
    }
}

/// Builder for [`MockHardware`].
#[derive(Debug)]
pub struct MockHardwareBuilder {
    identifier: String,
    name: String,
    hardware_type: HardwareType,
    jitter: f32,
    sensors: Vec<(SensorType, String, f32)>,
    sub_hardware: Vec<Arc<MockHardware>>,
}

impl MockHardwareBuilder {
    /// Add a sensor with its initial value.
    #[must_use]
    pub fn sensor(mut self, sensor_type: SensorType, name: &str, value: f32) -> Self {
        self.sensors.push((sensor_type, name.to_string(), value));
        self
    }

    /// Nest a device under this one.
    #[must_use]
    pub fn sub_hardware(mut self, hardware: Arc<MockHardware>) -> Self {
        self.sub_hardware.push(hardware);
        self
    }

    /// Maximum change per update for this device's sensors (0 keeps values fixed).
    #[must_use]
    pub fn jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    /// Build the device.
    #[must_use]
    pub fn build(self) -> Arc<MockHardware> {
        let hardware = Arc::new(MockHardware {
            identifier: self.identifier,
            name: self.name,
            hardware_type: self.hardware_type,
            jitter: self.jitter,
            sensors: RwLock::new(Vec::new()),
            sub_hardware: self.sub_hardware,
        });
        for (sensor_type, name, value) in self.sensors {
            hardware.add_sensor(sensor_type, &name, value);
        }
        hardware
    }
}

/// A mock hardware host.
#[derive(Debug, Default)]
pub struct MockHost {
    hardware: RwLock<Vec<Arc<MockHardware>>>,
    update_count: AtomicU32,
    reset_count: AtomicU32,
    fail_updates: AtomicBool,
    update_latency_ms: AtomicU64,
}

impl MockHost {
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::default()
    }

    /// Plug in a device. The caller forwards it as a hardware-added notification.
    pub fn add_hardware(&self, hardware: Arc<MockHardware>) {
        self.hardware
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(hardware);
    }

    /// Unplug a device by identifier.
    pub fn remove_hardware(&self, identifier: &str) -> Option<Arc<MockHardware>> {
        let mut hardware = self
            .hardware
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let position = hardware.iter().position(|h| h.identifier == identifier)?;
        Some(hardware.remove(position))
    }

    fn devices(&self) -> Vec<Arc<MockHardware>> {
        self.hardware
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of `update` calls so far.
    pub fn update_count(&self) -> u32 {
        self.update_count.load(Ordering::Relaxed)
    }

    /// Number of `reset` calls so far.
    pub fn reset_count(&self) -> u32 {
        self.reset_count.load(Ordering::Relaxed)
    }

    /// Make `update` and `reset` fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::Relaxed);
    }

    /// Block every `update` for this long.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_update_latency(&self, latency: Duration) {
        self.update_latency_ms
            .store(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX), Ordering::Relaxed);
    }
}

impl HardwareHost for MockHost {
    fn hardware(&self) -> Vec<SharedHardware> {
        self.devices()
            .into_iter()
            .map(|h| h as SharedHardware)
            .collect()
    }

    fn update(&self) -> Result<()> {
        self.update_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.update_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency));
        }

        if self.fail_updates.load(Ordering::Relaxed) {
            return Err(Error::hardware("mock update failure"));
        }

        let mut rng = rand::rng();
        for hardware in self.devices() {
            hardware.refresh(&mut rng);
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.reset_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_updates.load(Ordering::Relaxed) {
            return Err(Error::hardware("mock reset failure"));
        }
        for hardware in self.devices() {
            hardware.reset_all();
        }
        Ok(())
    }
}

/// Builder for [`MockHost`].
#[derive(Debug, Default)]
pub struct MockHostBuilder {
    hardware: Vec<Arc<MockHardware>>,
}

impl MockHostBuilder {
    /// Add a top-level device.
    #[must_use]
    pub fn hardware(mut self, hardware: Arc<MockHardware>) -> Self {
        self.hardware.push(hardware);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MockHost> {
        Arc::new(MockHost {
            hardware: RwLock::new(self.hardware),
            ..Default::default()
        })
    }
}

/// Logger that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
    fail: AtomicBool,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        lock(&self.records).clone()
    }

    /// Make every subsequent `log` fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl SensorLogger for MemoryLogger {
    async fn log(&self, record: &LogRecord) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(Error::logger("mock logger failure"));
        }
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_numbers_sensors_per_type() {
        let hw = MockHardware::builder("/amdcpu/0", "Ryzen", HardwareType::Cpu)
            .sensor(SensorType::Clock, "Core #1", 4000.0)
            .sensor(SensorType::Temperature, "Tctl", 50.0)
            .sensor(SensorType::Clock, "Core #2", 4100.0)
            .build();
        let ids: Vec<String> = hw
            .sensors()
            .iter()
            .map(|s| s.identifier().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "/amdcpu/0/clock/0",
                "/amdcpu/0/temperature/0",
                "/amdcpu/0/clock/1",
            ]
        );
        assert_eq!(hw.sensors()[2].index(), 1);
    }

    #[test]
    fn test_remove_sensor() {
        let hw = MockHardware::builder("/gpu/0", "GPU", HardwareType::GpuAmd)
            .sensor(SensorType::Power, "Package", 120.0)
            .build();
        assert!(hw.remove_sensor("/gpu/0/power/0").is_some());
        assert!(hw.remove_sensor("/gpu/0/power/0").is_none());
        assert!(hw.sensors().is_empty());
    }

    #[test]
    fn test_update_wanders_within_bounds() {
        let hw = MockHardware::builder("/amdcpu/0", "Ryzen", HardwareType::Cpu)
            .sensor(SensorType::Temperature, "Tctl", 50.0)
            .jitter(2.0)
            .build();
        let host = MockHost::builder().hardware(hw.clone()).build();
        for _ in 0..10 {
            host.update().unwrap();
        }
        assert_eq!(host.update_count(), 10);

        let sensor = &hw.sensors()[0];
        let value = sensor.value().unwrap();
        assert!((30.0..=70.0).contains(&value));
        assert!(sensor.min().unwrap() <= value);
        assert!(sensor.max().unwrap() >= value);
    }

    #[test]
    fn test_failure_injection_and_reset() {
        let host = MockHost::builder().build();
        host.set_fail_updates(true);
        assert!(matches!(host.update(), Err(Error::Hardware(_))));
        assert!(host.reset().is_err());
        host.set_fail_updates(false);
        host.reset().unwrap();
        assert_eq!(host.reset_count(), 2);
    }

    #[test]
    fn test_hot_plug() {
        let host = MockHost::builder().build();
        host.add_hardware(MockHardware::builder("/nvme/0", "SSD", HardwareType::Storage).build());
        assert_eq!(host.hardware().len(), 1);
        assert!(host.remove_hardware("/nvme/0").is_some());
        assert!(host.hardware().is_empty());
    }

    #[test]
    fn test_reset_min_max() {
        let sensor = MockSensor::new("/x/load/0", "X", SensorType::Load, 0, 5.0);
        sensor.set_value(50.0);
        sensor.set_value(10.0);
        sensor.reset_min_max();
        assert_eq!(sensor.min(), Some(10.0));
        assert_eq!(sensor.max(), Some(10.0));
    }
}
