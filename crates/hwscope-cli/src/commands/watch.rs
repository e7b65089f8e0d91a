//! Watch command: run a monitor session and redraw on every refresh.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use hwscope_core::{
    ColorMap, LoggingInterval, RenderRow, SensorLogger, SessionEvent, SessionSnapshot,
    SettingsStore, TracingLogger, UpdateInterval, collect_samples,
};

use super::{Context, effective_settings, open_session};
use crate::cli::OutputFormat;
use crate::format::format_tree_text;
use crate::store::FileSettingsStore;

/// Arguments for the watch command.
#[derive(Debug, Clone, Default)]
pub struct WatchArgs {
    pub ticks: Option<u64>,
    pub interval: Option<UpdateInterval>,
    pub log: bool,
    pub log_interval: Option<LoggingInterval>,
    pub plot: Vec<String>,
    pub format: OutputFormat,
}

/// One JSON line of watch output.
#[derive(Debug, Serialize)]
struct WatchFrame<'a> {
    tick: u64,
    logged: bool,
    #[serde(with = "time::serde::rfc3339")]
    captured_at: OffsetDateTime,
    dropped_ticks: u64,
    plotted: &'a [String],
    colors: &'a ColorMap,
    rows: &'a [RenderRow],
}

/// Run a session until `ticks` refreshes were shown or Ctrl-C.
///
/// Changes made here (plotted sensors, interval, logging) are saved to the
/// state file like any other user mutation.
pub async fn cmd_watch(ctx: &Context, args: WatchArgs) -> Result<()> {
    let store = Arc::new(FileSettingsStore::new(ctx.config.state_path()));
    let mut settings = effective_settings(&ctx.config, store.as_ref());
    if let Some(interval) = args.interval {
        settings.update_interval = interval;
    }
    if args.log {
        settings.logging.enabled = true;
    }
    if let Some(interval) = args.log_interval {
        settings.logging.interval = interval;
    }
    if let Err(e) = store.save(&settings) {
        warn!(error = %e, path = %store.path().display(), "Could not save state");
    }

    let logger: Option<Arc<dyn SensorLogger>> = if settings.logging.enabled {
        Some(Arc::new(TracingLogger))
    } else {
        None
    };

    let (host, session, handle) = open_session(&ctx.config, store, logger);
    let mut events = handle.subscribe();
    let task = session.spawn();

    if !args.plot.is_empty() {
        let known = collect_samples(host.as_ref());
        for sensor in &args.plot {
            if known.iter().any(|s| &s.identifier == sensor) {
                handle.set_plot(sensor.as_str(), true).await?;
            } else {
                eprintln!("Unknown sensor '{}', not plotting it", sensor);
            }
        }
    }

    if !ctx.quiet {
        eprintln!(
            "Watching {} every {} (Ctrl-C to stop)",
            ctx.config.host_name,
            settings.update_interval
        );
    }

    let redraw = args.format == OutputFormat::Text && std::io::stdout().is_terminal();
    let mut shown = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::DataChanged { tick, captured_at, logged }) => {
                    let snapshot = handle.snapshot().await?;
                    print_frame(ctx, &args, &snapshot, tick, captured_at, logged, redraw)?;
                    shown += 1;
                    if args.ticks.is_some_and(|limit| shown >= limit) {
                        break;
                    }
                }
                Ok(SessionEvent::Notice { message }) => {
                    if ctx.opts.no_color {
                        eprintln!("Warning: {}", message);
                    } else {
                        eprintln!("{} {}", "Warning:".yellow(), message);
                    }
                }
                Ok(SessionEvent::Stopped) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Display fell behind session events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    // The loop may already be gone after a Stopped event.
    if handle.shutdown().await.is_err() {
        debug!("Session already stopped");
    }
    task.await.context("Monitor session panicked")?;
    Ok(())
}

fn print_frame(
    ctx: &Context,
    args: &WatchArgs,
    snapshot: &SessionSnapshot,
    tick: u64,
    captured_at: OffsetDateTime,
    logged: bool,
    redraw: bool,
) -> Result<()> {
    let mut stdout = std::io::stdout().lock();

    match args.format {
        OutputFormat::Json => {
            let frame = WatchFrame {
                tick,
                logged,
                captured_at,
                dropped_ticks: snapshot.dropped_ticks,
                plotted: &snapshot.plotted,
                colors: &snapshot.colors,
                rows: &snapshot.rows,
            };
            let opts = ctx.opts.with_compact(true);
            write!(stdout, "{}", opts.as_json(&frame)?)?;
        }
        OutputFormat::Text => {
            if redraw {
                write!(stdout, "\x1b[2J\x1b[H")?;
            }
            let header = format!(
                "tick {}  {}{}",
                tick,
                captured_at.format(&Rfc3339)?,
                if logged { "  [logged]" } else { "" }
            );
            if ctx.opts.no_color {
                writeln!(stdout, "{}", header)?;
            } else {
                writeln!(stdout, "{}", header.dimmed())?;
            }
            write!(stdout, "{}", format_tree_text(&snapshot.rows, &ctx.opts))?;
            if !redraw {
                writeln!(stdout)?;
            }
        }
    }

    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hwscope_core::Settings;

    use crate::config::Config;
    use crate::format::FormatOptions;

    fn context(dir: &tempfile::TempDir) -> Context {
        Context {
            config: Config {
                host_name: "testbench".to_string(),
                state_file: Some(dir.path().join("state.toml")),
                ..Default::default()
            },
            config_path: dir.path().join("config.toml"),
            opts: FormatOptions::new(true),
            quiet: true,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_persists_plot_and_interval() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        cmd_watch(
            &ctx,
            WatchArgs {
                ticks: Some(2),
                interval: Some(UpdateInterval::Ms500),
                plot: vec![
                    "/amdcpu/0/temperature/0".to_string(),
                    "/no/such/sensor".to_string(),
                ],
                format: OutputFormat::Json,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let saved: Settings = FileSettingsStore::new(dir.path().join("state.toml"))
            .load()
            .unwrap();
        assert_eq!(saved.update_interval, UpdateInterval::Ms500);
        assert!(saved.sensor("/amdcpu/0/temperature/0").unwrap().plot);
        assert!(saved.sensor("/no/such/sensor").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_enables_logging() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);

        cmd_watch(
            &ctx,
            WatchArgs {
                ticks: Some(1),
                log: true,
                log_interval: Some(LoggingInterval::S10),
                format: OutputFormat::Json,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let saved = FileSettingsStore::new(dir.path().join("state.toml"))
            .load()
            .unwrap();
        assert!(saved.logging.enabled);
        assert_eq!(saved.logging.interval, LoggingInterval::S10);
    }
}
