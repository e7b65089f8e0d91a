//! The refresh pass.
//!
//! The only work that leaves the session loop: `HardwareHost::update` runs on
//! the blocking pool, a snapshot of every sensor is taken, and the snapshot is
//! handed to the logger when the job asks for it. The pass never touches the
//! tree; the session applies the returned [`RefreshReport`] itself.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::logger::LogRecord;
use crate::scheduler::RefreshJob;
use crate::traits::{HardwareHost, SensorLogger, walk_hardware};

/// Values of one sensor at the end of a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSample {
    pub identifier: String,
    pub value: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// The job this pass ran for.
    pub job: RefreshJob,
    /// When the samples were taken.
    pub captured_at: OffsetDateTime,
    /// Every sensor reachable from the host.
    pub samples: Vec<SensorSample>,
    /// Whether a log record was written.
    pub logged: bool,
    /// Hardware or logger failure, if any. Samples are still valid.
    pub error: Option<String>,
}

/// Snapshot every sensor reachable from `host`, pre-order.
pub fn collect_samples(host: &dyn HardwareHost) -> Vec<SensorSample> {
    let mut samples = Vec::new();
    walk_hardware(&host.hardware(), &mut |hardware| {
        samples.extend(hardware.sensors().iter().map(|sensor| SensorSample {
            identifier: sensor.identifier().to_string(),
            value: sensor.value(),
            min: sensor.min(),
            max: sensor.max(),
        }));
    });
    samples
}

/// Run one refresh pass for `job`.
///
/// When `job.reset` is set the host is reset on the same blocking thread
/// before it is updated. A failed reset or `update` is reported but does not
/// prevent sampling or logging of whatever values the sensors hold.
pub async fn run_refresh_pass(
    host: Arc<dyn HardwareHost>,
    logger: Option<Arc<dyn SensorLogger>>,
    job: RefreshJob,
) -> RefreshReport {
    let worker = tokio::task::spawn_blocking(move || {
        let reset = if job.reset { host.reset() } else { Ok(()) };
        let updated = host.update();
        (reset.and(updated), collect_samples(host.as_ref()))
    });

    let (mut error, samples) = match worker.await {
        Ok((Ok(()), samples)) => (None, samples),
        Ok((Err(e), samples)) => {
            warn!(tick = job.tick, reset = job.reset, error = %e, "Hardware update failed");
            (Some(e.to_string()), samples)
        }
        Err(e) => {
            warn!(tick = job.tick, error = %e, "Refresh worker panicked");
            (Some(format!("refresh worker failed: {e}")), Vec::new())
        }
    };

    let captured_at = OffsetDateTime::now_utc();
    let mut logged = false;

    if job.log
        && let Some(logger) = logger
    {
        let record = LogRecord {
            timestamp: captured_at,
            tick: job.tick,
            samples: samples.clone(),
        };
        match logger.log(&record).await {
            Ok(()) => logged = true,
            Err(e) => {
                warn!(tick = job.tick, error = %e, "Failed to write log record");
                error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    debug!(
        tick = job.tick,
        samples = samples.len(),
        logged,
        "Refresh pass complete"
    );

    RefreshReport {
        job,
        captured_at,
        samples,
        logged,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hwscope_types::{HardwareType, SensorType};

    use crate::mock::{MemoryLogger, MockHardware, MockHost};

    fn host() -> Arc<MockHost> {
        let superio = MockHardware::builder("/lpc/it8688e", "ITE IT8688E", HardwareType::SuperIo)
            .sensor(SensorType::Fan, "CPU Fan", 1100.0)
            .build();
        let board = MockHardware::builder("/mainboard", "B550", HardwareType::Mainboard)
            .sub_hardware(superio)
            .build();
        let cpu = MockHardware::builder("/amdcpu/0", "Ryzen 7", HardwareType::Cpu)
            .sensor(SensorType::Temperature, "Tctl", 45.0)
            .sensor(SensorType::Load, "Total", 12.0)
            .build();
        MockHost::builder().hardware(board).hardware(cpu).build()
    }

    #[test]
    fn test_collect_samples_walks_sub_hardware() {
        let host = host();
        let ids: Vec<String> = collect_samples(host.as_ref())
            .into_iter()
            .map(|s| s.identifier)
            .collect();
        assert_eq!(
            ids,
            vec![
                "/lpc/it8688e/fan/0",
                "/amdcpu/0/temperature/0",
                "/amdcpu/0/load/0",
            ]
        );
    }

    #[tokio::test]
    async fn test_pass_updates_and_logs() {
        let host = host();
        let logger = Arc::new(MemoryLogger::new());
        let job = RefreshJob { tick: 4, log: true, reset: false };

        let report = run_refresh_pass(host.clone(), Some(logger.clone() as Arc<dyn SensorLogger>), job).await;

        assert_eq!(host.update_count(), 1);
        assert!(report.logged);
        assert!(report.error.is_none());
        assert_eq!(report.samples.len(), 3);

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tick, 4);
        assert_eq!(records[0].samples, report.samples);
    }

    #[tokio::test]
    async fn test_pass_without_log_flag_skips_logger() {
        let host = host();
        let logger = Arc::new(MemoryLogger::new());
        let report = run_refresh_pass(host, Some(logger.clone() as Arc<dyn SensorLogger>), RefreshJob { tick: 1, log: false, reset: false }).await;
        assert!(!report.logged);
        assert!(logger.records().is_empty());
    }

    #[tokio::test]
    async fn test_update_failure_still_samples() {
        let host = host();
        host.set_fail_updates(true);
        let report = run_refresh_pass(host, None, RefreshJob { tick: 1, log: false, reset: false }).await;
        assert!(report.error.is_some());
        assert_eq!(report.samples.len(), 3);
    }

    #[tokio::test]
    async fn test_reset_runs_before_update() {
        let host = host();
        let report = run_refresh_pass(host.clone(), None, RefreshJob { tick: 2, log: false, reset: true }).await;
        assert_eq!(host.reset_count(), 1);
        assert_eq!(host.update_count(), 1);
        assert!(report.error.is_none());

        run_refresh_pass(host.clone(), None, RefreshJob { tick: 3, log: false, reset: false }).await;
        assert_eq!(host.reset_count(), 1);
    }

    #[tokio::test]
    async fn test_logger_failure_is_reported() {
        let host = host();
        let logger = Arc::new(MemoryLogger::new());
        logger.set_fail(true);
        let report = run_refresh_pass(host, Some(logger as Arc<dyn SensorLogger>), RefreshJob { tick: 5, log: true, reset: false }).await;
        assert!(!report.logged);
        assert!(report.error.unwrap().contains("Logger error"));
    }
}
