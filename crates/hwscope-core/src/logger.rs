//! Log records and logging-interval throttling.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{info, trace};

use hwscope_types::LoggingInterval;

use crate::error::Result;
use crate::refresh::SensorSample;
use crate::traits::SensorLogger;

/// One row handed to a [`SensorLogger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Tick that produced the record.
    pub tick: u64,
    pub samples: Vec<SensorSample>,
}

#[derive(Debug)]
struct Throttle {
    interval: LoggingInterval,
    last: Option<Instant>,
}

/// Forwards at most one record per [`LoggingInterval`] to the wrapped logger.
///
/// The sampling interval and the logging interval are independent: every tick
/// may offer a record, and records offered before the interval has elapsed
/// since the last forwarded one are dropped.
pub struct IntervalLogger {
    inner: Arc<dyn SensorLogger>,
    throttle: Mutex<Throttle>,
}

impl std::fmt::Debug for IntervalLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalLogger")
            .field("interval", &self.interval())
            .finish_non_exhaustive()
    }
}

impl IntervalLogger {
    pub fn new(inner: Arc<dyn SensorLogger>, interval: LoggingInterval) -> Self {
        Self {
            inner,
            throttle: Mutex::new(Throttle {
                interval,
                last: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Throttle> {
        self.throttle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interval(&self) -> LoggingInterval {
        self.lock().interval
    }

    /// Change the interval. The next offered record is forwarded immediately.
    pub fn set_interval(&self, interval: LoggingInterval) {
        let mut throttle = self.lock();
        throttle.interval = interval;
        throttle.last = None;
    }

    fn claim(&self) -> bool {
        let mut throttle = self.lock();
        let now = Instant::now();
        let due = throttle
            .last
            .is_none_or(|last| now.duration_since(last) >= throttle.interval.as_duration());
        if due {
            throttle.last = Some(now);
        }
        due
    }
}

#[async_trait]
impl SensorLogger for IntervalLogger {
    async fn log(&self, record: &LogRecord) -> Result<()> {
        if !self.claim() {
            trace!(tick = record.tick, "Logging interval not elapsed, skipping record");
            return Ok(());
        }
        self.inner.log(record).await
    }
}

/// Writes records to the `tracing` output at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

#[async_trait]
impl SensorLogger for TracingLogger {
    async fn log(&self, record: &LogRecord) -> Result<()> {
        for sample in &record.samples {
            info!(
                target: "hwscope::log",
                tick = record.tick,
                sensor = %sample.identifier,
                value = ?sample.value,
                min = ?sample.min,
                max = ?sample.max,
            );
        }
        Ok(())
    }
}
