//! Session event system.
//!
//! Render consumers subscribe to a [`MonitorSession`](crate::MonitorSession)
//! and receive [`SessionEvent`]s over a broadcast channel. Slow receivers lag
//! and skip events; no event carries state that cannot be re-read from a
//! snapshot.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::colors::ColorMap;

/// Events published by the session loop.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// Topology or selection changed; `colors` maps every plotted sensor.
    SelectionChanged { colors: ColorMap },
    /// A refresh pass completed and its values were applied.
    DataChanged {
        /// Tick that dispatched the pass.
        tick: u64,
        /// When the pass sampled the sensors.
        #[serde(with = "time::serde::rfc3339")]
        captured_at: OffsetDateTime,
        /// Whether the pass wrote a log record.
        logged: bool,
    },
    /// Non-fatal problem worth showing to the user.
    Notice { message: String },
    /// The session loop exited.
    Stopped,
}

/// Sender for session events.
pub type EventSender = broadcast::Sender<SessionEvent>;

/// Receiver for session events.
pub type EventReceiver = broadcast::Receiver<SessionEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity)
}

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = event_channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
