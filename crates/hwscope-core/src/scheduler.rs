//! Non-reentrant poll scheduling.
//!
//! [`PollScheduler`] is a pure state machine; the session owns the timer and
//! the worker and asks the scheduler what to do on every tick and completion.
//!
//! ```text
//!            tick (dispatch)
//!    Idle ─────────────────────▶ Refreshing
//!     ▲                              │ tick (dropped)
//!     └──────────────────────────────┘
//!               completion
//! ```
//!
//! Every tick advances the warm-up counter, even a dropped one. Logging is
//! requested only once the counter has reached [`WARMUP_TICKS`], so the first
//! three ticks after start never log.

use tracing::{debug, trace};

use hwscope_types::UpdateInterval;

/// Ticks that must elapse before a refresh pass may log.
pub const WARMUP_TICKS: u32 = 4;

/// Whether a refresh pass is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Refreshing,
}

/// Work order for one refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshJob {
    /// 1-based tick number that dispatched this pass.
    pub tick: u64,
    /// Whether the pass should hand its samples to the logger.
    pub log: bool,
    /// Reset the host before updating it. Set by the session after a resume.
    pub reset: bool,
}

/// Scheduler decision for a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Start a refresh pass.
    Dispatch(RefreshJob),
    /// A pass is still running; the tick is discarded.
    Dropped,
    /// The scheduler was stopped.
    Stopped,
}

/// Scheduler decision for a finished refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Apply the result and signal that data changed.
    Render,
    /// Discard the result.
    Ignored,
}

/// Idle/Refreshing gate plus the logging warm-up.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: UpdateInterval,
    logging_enabled: bool,
    state: PollState,
    warmup: u32,
    ticks: u64,
    dropped: u64,
    stopped: bool,
}

impl PollScheduler {
    pub fn new(interval: UpdateInterval, logging_enabled: bool) -> Self {
        Self {
            interval,
            logging_enabled,
            state: PollState::Idle,
            warmup: 0,
            ticks: 0,
            dropped: 0,
            stopped: false,
        }
    }

    /// Decide what a timer tick does.
    pub fn on_tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Stopped;
        }

        self.ticks += 1;
        if self.warmup < WARMUP_TICKS {
            self.warmup += 1;
        }

        match self.state {
            PollState::Refreshing => {
                self.dropped += 1;
                debug!(tick = self.ticks, "Refresh still running, dropping tick");
                TickOutcome::Dropped
            }
            PollState::Idle => {
                self.state = PollState::Refreshing;
                let job = RefreshJob {
                    tick: self.ticks,
                    log: self.logging_enabled && self.warmup >= WARMUP_TICKS,
                    reset: false,
                };
                trace!(tick = job.tick, log = job.log, "Dispatching refresh");
                TickOutcome::Dispatch(job)
            }
        }
    }

    /// Record that the in-flight pass finished.
    pub fn on_complete(&mut self) -> Completion {
        if self.stopped {
            debug!("Refresh finished after stop, discarding result");
            return Completion::Ignored;
        }
        match self.state {
            PollState::Refreshing => {
                self.state = PollState::Idle;
                Completion::Render
            }
            PollState::Idle => {
                debug!("Completion without a refresh in flight");
                Completion::Ignored
            }
        }
    }

    /// Stop dispatching. An in-flight pass completes as a no-op.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn interval(&self) -> UpdateInterval {
        self.interval
    }

    /// Change the sampling interval. The caller rebuilds its timer.
    pub fn set_interval(&mut self, interval: UpdateInterval) {
        self.interval = interval;
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    /// Toggle logging. The warm-up counter is not reset.
    pub fn set_logging(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }

    /// Total ticks seen, dispatched or dropped.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks dropped because a pass was in flight.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
