use std::io::{self, Write};

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use hwscope_cli::cli::{Cli, Commands};
use hwscope_cli::commands::{self, Context, WatchArgs};
use hwscope_cli::config::{Config, default_config_path};
use hwscope_cli::format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "hwscope", &mut io::stdout());
        return Ok(());
    }

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::load_or_default(&config_path)?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "Loaded config");

    let mut ctx = Context {
        config,
        config_path,
        opts: FormatOptions::new(cli.no_color),
        quiet: cli.quiet,
    };

    let output = match cli.command {
        Commands::Watch {
            ticks,
            interval,
            log,
            log_interval,
            plot,
            format,
        } => {
            commands::cmd_watch(
                &ctx,
                WatchArgs {
                    ticks,
                    interval,
                    log,
                    log_interval,
                    plot,
                    format,
                },
            )
            .await?;
            return Ok(());
        }
        Commands::Tree {
            show_hidden,
            format,
        } => commands::cmd_tree(&ctx, show_hidden, format).await?,
        Commands::Palette { set, format } => commands::cmd_palette(&mut ctx, set, format)?,
        Commands::Config { action } => commands::cmd_config(&ctx, action)?,
        Commands::Completions { .. } => {
            // Already handled above
            unreachable!()
        }
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
