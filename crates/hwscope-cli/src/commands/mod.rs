//! Command implementations for the CLI.

mod config;
mod palette;
mod tree;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use hwscope_core::mock::MockHost;
use hwscope_core::{
    MonitorSession, SensorLogger, SessionConfig, SessionHandle, Settings, SettingsStore,
};

use crate::config::Config;
use crate::demo;
use crate::format::FormatOptions;

pub use config::cmd_config;
pub use palette::cmd_palette;
pub use tree::cmd_tree;
pub use watch::{WatchArgs, cmd_watch};

/// State shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub opts: FormatOptions,
    pub quiet: bool,
}

/// Build the simulated host and a session over it.
pub(crate) fn open_session(
    config: &Config,
    store: Arc<dyn SettingsStore>,
    logger: Option<Arc<dyn SensorLogger>>,
) -> (Arc<MockHost>, MonitorSession, SessionHandle) {
    let host = demo::build_host(&config.hardware);
    let (session, handle) = MonitorSession::new(
        host.clone(),
        store,
        logger,
        SessionConfig {
            host_name: config.host_name.clone(),
            ..Default::default()
        },
    );
    (host, session, handle)
}

/// Load persisted settings with the config file's session defaults applied.
///
/// A state file that cannot be read falls back to defaults, like the session
/// itself does.
pub(crate) fn effective_settings(config: &Config, store: &dyn SettingsStore) -> Settings {
    let mut settings = store.load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable state file");
        Settings::default()
    });
    config.apply_to(&mut settings);
    settings
}
