//! The monitoring session loop.
//!
//! [`MonitorSession`] owns the tree, the scheduler, the color map and the
//! settings. Everything else talks to it through a [`SessionHandle`]:
//! commands go in over an mpsc channel, [`SessionEvent`]s come out over a
//! broadcast channel. The loop is the only place session state is mutated.
//!
//! Refresh passes run on spawned tasks (the hardware update itself on the
//! blocking pool) and send their [`RefreshReport`] back over a channel the
//! loop drains. After shutdown that channel is gone, so the result of a pass
//! still in flight is dropped on the floor.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hwscope_types::UpdateInterval;

use crate::colors::{ColorMap, PlotColorAssigner};
use crate::error::Result;
use crate::events::{EventDispatcher, EventReceiver, SessionEvent};
use crate::logger::IntervalLogger;
use crate::messages::Command;
use crate::refresh::{RefreshReport, run_refresh_pass};
use crate::render::{RenderRow, render_rows};
use crate::scheduler::{Completion, PollScheduler, PollState, TickOutcome};
use crate::settings::{Settings, SettingsStore};
use crate::traits::{HardwareHost, SensorLogger, SharedHardware, SharedSensor};
use crate::tree::{HardwareTree, NodeId, TreeChange};

/// Session construction options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Label of the root node.
    pub host_name: String,
    /// Capacity of the command channel.
    pub command_buffer: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host_name: "localhost".to_string(),
            command_buffer: 64,
            event_capacity: 256,
        }
    }
}

/// Point-in-time copy of what a render consumer needs.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Depth-first tree rows.
    pub rows: Vec<RenderRow>,
    /// Color of every plotted sensor.
    pub colors: ColorMap,
    /// Plotted sensor identifiers in traversal order.
    pub plotted: Vec<String>,
    pub poll_state: PollState,
    /// Ticks seen so far.
    pub ticks: u64,
    /// Ticks dropped because a refresh was in flight.
    pub dropped_ticks: u64,
    pub settings: Settings,
}

/// Cloneable handle for talking to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: EventDispatcher,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Queue a command.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await?;
        Ok(())
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Notify the session that a device appeared.
    pub async fn hardware_added(&self, hardware: SharedHardware) -> Result<()> {
        self.send(Command::HardwareAdded(hardware)).await
    }

    /// Notify the session that a device disappeared.
    pub async fn hardware_removed(&self, hardware: SharedHardware) -> Result<()> {
        self.send(Command::HardwareRemoved(hardware)).await
    }

    /// Notify the session that a device reported a new sensor.
    pub async fn sensor_added(&self, hardware: SharedHardware, sensor: SharedSensor) -> Result<()> {
        self.send(Command::SensorAdded { hardware, sensor }).await
    }

    /// Notify the session that a device dropped one of its sensors.
    pub async fn sensor_removed(&self, hardware: SharedHardware, sensor: SharedSensor) -> Result<()> {
        self.send(Command::SensorRemoved { hardware, sensor }).await
    }

    /// Select or deselect a sensor for charting.
    pub async fn set_plot(&self, sensor: impl Into<String>, plot: bool) -> Result<()> {
        self.send(Command::SetPlot {
            sensor: sensor.into(),
            plot,
        })
        .await
    }

    /// Fetch a snapshot of the session state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        Ok(rx.await?)
    }

    /// Ask the loop to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    /// Stop the loop immediately, skipping queued commands.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token cancelled when the loop should stop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// The single owner of session state.
pub struct MonitorSession {
    host: Arc<dyn HardwareHost>,
    store: Arc<dyn SettingsStore>,
    logger: Option<Arc<IntervalLogger>>,
    settings: Settings,
    tree: HardwareTree,
    scheduler: PollScheduler,
    assigner: PlotColorAssigner,
    colors: ColorMap,
    events: EventDispatcher,
    commands: mpsc::Receiver<Command>,
    refresh_tx: mpsc::Sender<RefreshReport>,
    refresh_rx: mpsc::Receiver<RefreshReport>,
    /// Reset the host on the next dispatched pass.
    pending_reset: bool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for MonitorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorSession")
            .field("nodes", &self.tree.len())
            .field("sensors", &self.tree.sensor_count())
            .field("plotted", &self.colors.len())
            .field("poll_state", &self.scheduler.state())
            .finish_non_exhaustive()
    }
}

impl MonitorSession {
    /// Create a session and the handle to drive it.
    ///
    /// Settings are loaded from `store` once here. A load failure falls back
    /// to defaults; invalid fields are repaired one by one and the rest of the
    /// saved state is kept. Devices the host already reports are added to the
    /// tree immediately.
    pub fn new(
        host: Arc<dyn HardwareHost>,
        store: Arc<dyn SettingsStore>,
        logger: Option<Arc<dyn SensorLogger>>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let settings = match store.load() {
            Ok(mut settings) => {
                for repair in settings.repair() {
                    warn!(repair = %repair, "Repaired saved settings");
                }
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (refresh_tx, refresh_rx) = mpsc::channel(4);
        let events = EventDispatcher::new(config.event_capacity.max(1));
        let cancel = CancellationToken::new();

        let mut tree = HardwareTree::new(config.host_name);
        tree.set_show_hidden(settings.show_hidden);
        let root = tree.root();
        if let Some(node) = tree.get_mut(root) {
            node.set_expanded(settings.is_expanded(crate::tree::ROOT_KEY));
        }

        let mut session = Self {
            logger: logger
                .map(|inner| Arc::new(IntervalLogger::new(inner, settings.logging.interval))),
            scheduler: PollScheduler::new(settings.update_interval, settings.logging.enabled),
            assigner: PlotColorAssigner::new(settings.effective_palette()),
            colors: ColorMap::new(),
            host,
            store,
            settings,
            tree,
            events: events.clone(),
            commands: command_rx,
            refresh_tx,
            refresh_rx,
            pending_reset: false,
            cancel: cancel.clone(),
        };

        for hardware in session.host.hardware() {
            let change = session.tree.add_hardware(hardware);
            session.restore_node_state(&change);
        }
        session.colors = session.assigner.recompute(&session.tree.plot_entries());

        let handle = SessionHandle {
            commands: command_tx,
            events,
            cancel,
        };
        (session, handle)
    }

    pub fn tree(&self) -> &HardwareTree {
        &self.tree
    }

    /// Current color of every plotted sensor.
    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Build a snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            rows: render_rows(&self.tree, &self.colors),
            colors: self.colors.clone(),
            plotted: self
                .tree
                .plotted()
                .into_iter()
                .filter_map(|id| self.tree.sensor(id))
                .map(|s| s.identifier().to_string())
                .collect(),
            poll_state: self.scheduler.state(),
            ticks: self.scheduler.ticks(),
            dropped_ticks: self.scheduler.dropped(),
            settings: self.settings.clone(),
        }
    }

    /// Apply one command. Returns `Break` when the loop should exit.
    pub fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::HardwareAdded(hardware) => {
                let change = self.tree.add_hardware(hardware);
                self.on_topology(change);
            }
            Command::HardwareRemoved(hardware) => {
                let change = self.tree.remove_hardware(&hardware);
                self.on_topology(change);
            }
            Command::SensorAdded { hardware, sensor } => {
                let change = self.tree.add_sensor(&hardware, sensor);
                self.on_topology(change);
            }
            Command::SensorRemoved { hardware, sensor } => {
                let change = self.tree.remove_sensor(&hardware, &sensor);
                self.on_topology(change);
            }
            Command::SetPlot { sensor, plot } => {
                self.update_sensor(&sensor, |node| node.set_plot(plot), |o| o.plot = plot);
            }
            Command::SetPenColor { sensor, color } => {
                self.update_sensor(
                    &sensor,
                    |node| node.set_pen_color(color),
                    |o| o.pen_color = color,
                );
            }
            Command::SetHidden { sensor, hidden } => {
                self.update_sensor(&sensor, |node| node.set_hidden(hidden), |o| o.hidden = hidden);
            }
            Command::SetShowHidden(show) => {
                self.tree.set_show_hidden(show);
                self.settings.show_hidden = show;
                self.persist();
                self.recompute_colors();
            }
            Command::SetExpanded { node, expanded } => match self.tree.find_by_key(&node) {
                Some(id) => {
                    if let Some(n) = self.tree.get_mut(id) {
                        n.set_expanded(expanded);
                    }
                    self.settings.set_expanded(&node, expanded);
                    self.persist();
                }
                None => debug!(node, "Ignoring expand state for unknown node"),
            },
            Command::SetUpdateInterval(interval) => {
                info!(interval = %interval, "Update interval changed");
                self.scheduler.set_interval(interval);
                self.settings.update_interval = interval;
                self.persist();
            }
            Command::SetLogging(enabled) => {
                info!(enabled, "Logging toggled");
                self.scheduler.set_logging(enabled);
                self.settings.logging.enabled = enabled;
                self.persist();
            }
            Command::SetLoggingInterval(interval) => {
                if let Some(logger) = &self.logger {
                    logger.set_interval(interval);
                }
                self.settings.logging.interval = interval;
                self.persist();
            }
            Command::SetPalette(palette) => {
                let dropped = self.settings.set_palette(palette);
                if dropped > 0 {
                    self.notice(format!("Palette listed {dropped} duplicate colors, kept the first of each"));
                }
                self.assigner.set_palette(self.settings.effective_palette());
                self.persist();
                self.recompute_colors();
            }
            Command::ResetMinMax => self.reset_min_max(),
            Command::Resume => {
                info!("System resumed, hardware reset queued for the next refresh");
                self.pending_reset = true;
            }
            Command::Snapshot(reply) => {
                // Requester may have gone away.
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {
                info!("Session received shutdown command");
                self.scheduler.stop();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Handle a timer tick.
    pub fn on_tick(&mut self) {
        let TickOutcome::Dispatch(mut job) = self.scheduler.on_tick() else {
            return;
        };
        job.reset = std::mem::take(&mut self.pending_reset);

        let host = Arc::clone(&self.host);
        let logger = self
            .logger
            .clone()
            .map(|logger| logger as Arc<dyn SensorLogger>);
        let results = self.refresh_tx.clone();
        tokio::spawn(async move {
            let report = run_refresh_pass(host, logger, job).await;
            if results.send(report).await.is_err() {
                debug!(tick = job.tick, "Session gone, discarding refresh result");
            }
        });
    }

    /// Apply a finished refresh pass.
    pub fn on_refresh(&mut self, report: RefreshReport) {
        if self.scheduler.on_complete() == Completion::Ignored {
            return;
        }
        let updated = self.tree.apply_samples(&report.samples);
        debug!(
            tick = report.job.tick,
            updated,
            logged = report.logged,
            "Applied refresh result"
        );
        if let Some(error) = &report.error {
            self.notice(format!("Refresh failed: {error}"));
        }
        self.events.send(SessionEvent::DataChanged {
            tick: report.job.tick,
            captured_at: report.captured_at,
            logged: report.logged,
        });
    }

    fn ticker(interval: UpdateInterval) -> Interval {
        let period = interval.as_duration();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    /// Run the loop until shutdown, cancellation or all handles are dropped.
    pub async fn run(mut self) {
        info!(
            sensors = self.tree.sensor_count(),
            interval = %self.scheduler.interval(),
            "Monitor session started"
        );

        let mut period = self.scheduler.interval();
        let mut ticker = Self::ticker(period);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Session cancelled");
                    self.scheduler.stop();
                    break;
                }
                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else {
                        info!("All session handles dropped, stopping");
                        self.scheduler.stop();
                        break;
                    };
                    if self.apply(cmd).is_break() {
                        break;
                    }
                    if self.scheduler.interval() != period {
                        period = self.scheduler.interval();
                        ticker = Self::ticker(period);
                    }
                }
                Some(report) = self.refresh_rx.recv() => {
                    self.on_refresh(report);
                }
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }

        self.events.send(SessionEvent::Stopped);
        info!("Monitor session stopped");
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn on_topology(&mut self, change: TreeChange) {
        if !change.selection_changed() {
            return;
        }
        self.restore_node_state(&change);
        self.recompute_colors();
    }

    /// Apply persisted per-node state to freshly added nodes.
    fn restore_node_state(&mut self, change: &TreeChange) {
        let TreeChange::Added { hardware, sensors } = change else {
            return;
        };

        for &id in hardware.iter().chain(sensors) {
            let expanded = self
                .tree
                .get(id)
                .is_some_and(|node| self.settings.is_expanded(node.key()));
            if let Some(node) = self.tree.get_mut(id) {
                node.set_expanded(expanded);
            }
        }

        for &id in sensors {
            let Some(node) = self.tree.sensor_mut(id) else {
                continue;
            };
            if let Some(overrides) = self.settings.sensor(node.identifier()) {
                node.set_plot(overrides.plot);
                node.set_pen_color(overrides.pen_color);
                node.set_hidden(overrides.hidden);
            }
        }
    }

    fn update_sensor(
        &mut self,
        identifier: &str,
        node_update: impl FnOnce(&mut crate::tree::SensorNode),
        settings_update: impl FnOnce(&mut crate::settings::SensorOverrides),
    ) {
        let Some(node) = self
            .tree
            .find_sensor(identifier)
            .and_then(|id| self.tree.sensor_mut(id))
        else {
            debug!(sensor = identifier, "Ignoring update for unknown sensor");
            return;
        };
        node_update(node);
        self.settings.update_sensor(identifier, settings_update);
        self.persist();
        self.recompute_colors();
    }

    fn reset_min_max(&mut self) {
        let ids: Vec<NodeId> = self
            .tree
            .traverse()
            .filter(|&(id, _)| self.tree.sensor(id).is_some())
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            if let Some(node) = self.tree.sensor_mut(id) {
                node.sensor().reset_min_max();
                node.reset_min_max();
            }
        }
        info!("Reset min/max of all sensors");
    }

    fn recompute_colors(&mut self) {
        self.colors = self.assigner.recompute(&self.tree.plot_entries());
        self.events.send(SessionEvent::SelectionChanged {
            colors: self.colors.clone(),
        });
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.settings) {
            warn!(error = %e, "Failed to save settings");
            self.notice(format!("Settings could not be saved: {e}"));
        }
    }

    fn notice(&self, message: String) {
        self.events.send(SessionEvent::Notice { message });
    }
}
