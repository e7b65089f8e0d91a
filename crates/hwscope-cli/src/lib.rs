//! Command-line front-end for the hwscope hardware monitor.
//!
//! The CLI drives a [`hwscope_core::MonitorSession`] over simulated hardware
//! described in the config file (or a built-in demo machine) and prints the
//! sensor tree.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watch` | Run a session and redraw the tree after every refresh |
//! | `tree` | Sample once and print the tree |
//! | `palette` | Show or replace the plot palette |
//! | `config` | Show, locate or initialize the config file |
//! | `completions` | Generate shell completions |
//!
//! # Files
//!
//! - Config: `<config dir>/hwscope/config.toml` (override with `--config`)
//! - Sensor state (plotted sensors, pen colors, hidden flags, intervals):
//!   `<data dir>/hwscope/state.toml` (override with `state_file` in the config)

pub mod cli;
pub mod commands;
pub mod config;
pub mod demo;
pub mod format;
pub mod store;
