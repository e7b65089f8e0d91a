//! Tree command: sample once and print the sensor tree.

use std::sync::Arc;

use anyhow::{Context as _, Result};

use hwscope_core::{MemorySettingsStore, SessionEvent, UpdateInterval};

use super::{Context, effective_settings, open_session};
use crate::cli::OutputFormat;
use crate::format::format_tree_text;
use crate::store::FileSettingsStore;

/// Print the tree after one refresh pass.
///
/// Runs against an in-memory copy of the saved state so nothing is written.
pub async fn cmd_tree(ctx: &Context, show_hidden: bool, format: OutputFormat) -> Result<String> {
    let file_store = FileSettingsStore::new(ctx.config.state_path());
    let mut settings = effective_settings(&ctx.config, &file_store);
    settings.show_hidden |= show_hidden;
    settings.update_interval = UpdateInterval::Ms250;
    settings.logging.enabled = false;

    let store = Arc::new(MemorySettingsStore::new(settings));
    let (_host, session, handle) = open_session(&ctx.config, store, None);
    let mut events = handle.subscribe();
    let task = session.spawn();

    loop {
        match events.recv().await {
            Ok(SessionEvent::DataChanged { .. }) => break,
            Ok(_) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(e) => return Err(e).context("Monitor session ended before the first refresh"),
        }
    }

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await?;

    match format {
        OutputFormat::Text => Ok(format_tree_text(&snapshot.rows, &ctx.opts)),
        OutputFormat::Json => ctx.opts.as_json(&snapshot.rows),
    }
}
