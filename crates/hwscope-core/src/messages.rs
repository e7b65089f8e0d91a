//! Commands accepted by the session loop.
//!
//! ```text
//! +-------------------+    Command     +------------------+   RefreshJob   +---------------+
//! | hardware layer,   | -------------> |  MonitorSession  | -------------> | refresh pass  |
//! | UI, CLI           |                |  (owns the tree) | <------------- | (blocking     |
//! |                   | <------------- |                  |  RefreshReport |  worker)      |
//! +-------------------+  SessionEvent  +------------------+                +---------------+
//! ```
//!
//! Every mutation of session state arrives as a [`Command`] and is applied in
//! order by the single loop task. Hardware notifications are commands too, so
//! producers on other threads never touch the tree.

use tokio::sync::oneshot;

use hwscope_types::{LoggingInterval, Rgb, UpdateInterval};

use crate::session::SessionSnapshot;
use crate::traits::{SharedHardware, SharedSensor};

/// Commands sent to the session loop.
#[derive(Debug)]
pub enum Command {
    /// A top-level device appeared.
    HardwareAdded(SharedHardware),

    /// A top-level device disappeared.
    HardwareRemoved(SharedHardware),

    /// A device in the tree reported a new sensor.
    SensorAdded {
        hardware: SharedHardware,
        sensor: SharedSensor,
    },

    /// A device in the tree dropped a sensor.
    SensorRemoved {
        hardware: SharedHardware,
        sensor: SharedSensor,
    },

    /// Select or deselect a sensor for charting.
    SetPlot {
        /// Sensor identifier.
        sensor: String,
        plot: bool,
    },

    /// Set or clear a sensor's pen override.
    SetPenColor {
        /// Sensor identifier.
        sensor: String,
        color: Option<Rgb>,
    },

    /// Hide or unhide a sensor.
    SetHidden {
        /// Sensor identifier.
        sensor: String,
        hidden: bool,
    },

    /// Show or hide sensors the user hid.
    SetShowHidden(bool),

    /// Expand or collapse a node.
    SetExpanded {
        /// Node key (root, hardware or sensor identifier).
        node: String,
        expanded: bool,
    },

    /// Change the sampling interval.
    SetUpdateInterval(UpdateInterval),

    /// Enable or disable logging.
    SetLogging(bool),

    /// Change the logging interval.
    SetLoggingInterval(LoggingInterval),

    /// Replace the plot palette. Empty restores the default palette.
    SetPalette(Vec<Rgb>),

    /// Reset min/max of every sensor.
    ResetMinMax,

    /// The system resumed from sleep.
    Resume,

    /// Request a snapshot of the current tree and color map.
    Snapshot(oneshot::Sender<SessionSnapshot>),

    /// Stop the loop.
    Shutdown,
}
