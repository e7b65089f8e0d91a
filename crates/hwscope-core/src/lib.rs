//! Monitoring core for the hwscope hardware monitor.
//!
//! This crate mirrors a changing set of hardware devices and their sensors
//! into a navigable tree, refreshes sensor values on a timer without ever
//! overlapping two refreshes, and assigns stable pen colors to the sensors the
//! user plots.
//!
//! # Features
//!
//! - **Topology tree**: arena-backed tree kept in sync with hardware hot-add
//!   and hot-remove ([`HardwareTree`])
//! - **Poll scheduling**: Idle/Refreshing gate with a logging warm-up
//!   ([`PollScheduler`])
//! - **Plot colors**: three-pass palette assignment that minimizes color churn
//!   ([`PlotColorAssigner`])
//! - **Session loop**: single owner of all state, driven by typed commands
//!   ([`MonitorSession`], [`SessionHandle`])
//! - **Mock hardware**: for tests and demos ([`mock`])
//!
//! The crate never reads real hardware. A backend implements [`Hardware`],
//! [`Sensor`] and [`HardwareHost`]; a front-end consumes [`SessionEvent`]s and
//! [`RenderRow`]s.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use hwscope_core::mock::{MockHardware, MockHost};
//! use hwscope_core::{MemorySettingsStore, MonitorSession, SessionConfig, Settings};
//! use hwscope_types::{HardwareType, SensorType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cpu = MockHardware::builder("/amdcpu/0", "Ryzen 7", HardwareType::Cpu)
//!         .sensor(SensorType::Temperature, "Tctl", 52.0)
//!         .build();
//!     let host = MockHost::builder().hardware(cpu).build();
//!     let store = Arc::new(MemorySettingsStore::new(Settings::default()));
//!
//!     let (session, handle) = MonitorSession::new(host, store, None, SessionConfig::default());
//!     let task = session.spawn();
//!
//!     handle.set_plot("/amdcpu/0/temperature/0", true).await?;
//!     let snapshot = handle.snapshot().await?;
//!     assert_eq!(snapshot.plotted, vec!["/amdcpu/0/temperature/0".to_string()]);
//!
//!     handle.shutdown().await?;
//!     task.await?;
//!     Ok(())
//! }
//! ```

pub mod colors;
pub mod error;
pub mod events;
pub mod logger;
pub mod messages;
pub mod mock;
pub mod refresh;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod traits;
pub mod tree;

pub use colors::{ColorMap, PlotColorAssigner, PlotEntry};
pub use error::{Error, Result};
pub use events::{EventDispatcher, EventReceiver, EventSender, SessionEvent};
pub use logger::{IntervalLogger, LogRecord, TracingLogger};
pub use messages::Command;
pub use refresh::{RefreshReport, SensorSample, collect_samples, run_refresh_pass};
pub use render::{RenderRow, RowKind, render_rows};
pub use scheduler::{Completion, PollScheduler, PollState, RefreshJob, TickOutcome, WARMUP_TICKS};
pub use session::{MonitorSession, SessionConfig, SessionHandle, SessionSnapshot};
pub use settings::{LoggingSettings, MemorySettingsStore, SensorOverrides, Settings, SettingsStore};
pub use traits::{Hardware, HardwareHost, Sensor, SensorLogger, SharedHardware, SharedSensor};
pub use tree::{HardwareTree, NodeId, NodeKind, TreeChange};

// Re-export from hwscope-types
pub use hwscope_types::{
    DEFAULT_PALETTE, HardwareType, LoggingInterval, Rgb, SensorType, UpdateInterval,
};
