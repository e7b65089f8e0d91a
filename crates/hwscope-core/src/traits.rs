//! Trait abstractions for the hardware layer.
//!
//! The monitoring core never talks to real hardware. It consumes these traits,
//! which a platform backend (or [`crate::mock`] in tests) implements:
//!
//! - [`Hardware`]: one device, its sensors and nested sub-devices
//! - [`Sensor`]: one measurement channel with current/min/max values
//! - [`HardwareHost`]: the set of top-level devices plus the refresh and
//!   resume operations
//! - [`SensorLogger`]: the sink that receives log records from the poll pass

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use hwscope_types::{HardwareType, SensorType};

use crate::error::Result;
use crate::logger::LogRecord;

/// Shared handle to a hardware device.
///
/// Handle identity (not value equality) is what the tree matches removal
/// notifications against; see [`same_handle`].
pub type SharedHardware = Arc<dyn Hardware>;

/// Shared handle to a sensor.
pub type SharedSensor = Arc<dyn Sensor>;

/// One measurement channel of a device.
///
/// Implementations use interior mutability: values change when the host runs
/// [`HardwareHost::update`] on the refresh worker.
pub trait Sensor: Send + Sync + fmt::Debug {
    /// Stable identifier, unique across all hardware (e.g. `/lpc/nct6798d/temperature/0`).
    ///
    /// Persisted per-sensor settings are keyed by this string.
    fn identifier(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Kind of measurement.
    fn sensor_type(&self) -> SensorType;

    /// Position among sensors of the same type on the same device.
    fn index(&self) -> usize;

    /// Latest value, if the sensor has produced one.
    fn value(&self) -> Option<f32>;

    /// Lowest value seen since the last reset.
    fn min(&self) -> Option<f32>;

    /// Highest value seen since the last reset.
    fn max(&self) -> Option<f32>;

    /// Forget the recorded min/max so they restart from the current value.
    fn reset_min_max(&self);
}

/// A hardware device.
pub trait Hardware: Send + Sync + fmt::Debug {
    /// Stable identifier (e.g. `/amdcpu/0`).
    fn identifier(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Classification used for sibling ordering.
    fn hardware_type(&self) -> HardwareType;

    /// Sensors currently exposed by this device.
    fn sensors(&self) -> Vec<SharedSensor>;

    /// Nested devices (e.g. the Super I/O chip on a mainboard).
    fn sub_hardware(&self) -> Vec<SharedHardware>;
}

/// The hardware layer as seen by the monitoring session.
pub trait HardwareHost: Send + Sync {
    /// Top-level devices present right now.
    fn hardware(&self) -> Vec<SharedHardware>;

    /// Refresh the values of every sensor reachable from the host.
    ///
    /// Runs on the refresh worker, never on the session loop.
    fn update(&self) -> Result<()>;

    /// Reinitialize the hardware layer after the system resumes from sleep.
    fn reset(&self) -> Result<()>;
}

/// Sink for periodic log records.
///
/// Called from the refresh pass, at most once per eligible tick.
#[async_trait]
pub trait SensorLogger: Send + Sync {
    /// Append one record.
    async fn log(&self, record: &LogRecord) -> Result<()>;
}

/// Whether two handles point at the same object.
///
/// Compares data addresses only, so two `Arc<dyn Trait>` created from the same
/// allocation compare equal even if their vtable pointers differ.
#[must_use]
pub fn same_handle<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Visit `hardware` and all nested sub-devices, pre-order.
pub fn walk_hardware(hardware: &[SharedHardware], visit: &mut dyn FnMut(&SharedHardware)) {
    for device in hardware {
        visit(device);
        walk_hardware(&device.sub_hardware(), visit);
    }
}
