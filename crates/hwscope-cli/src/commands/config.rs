//! Config command.

use anyhow::{Result, bail};

use super::Context;
use crate::cli::ConfigAction;
use crate::config::Config;
use crate::demo;

pub fn cmd_config(ctx: &Context, action: ConfigAction) -> Result<String> {
    match action {
        ConfigAction::Path => Ok(format!("{}\n", ctx.config_path.display())),
        ConfigAction::Show => Ok(toml::to_string_pretty(&ctx.config)?),
        ConfigAction::Init { force } => {
            if ctx.config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    ctx.config_path.display()
                );
            }
            let config = Config {
                host_name: ctx.config.host_name.clone(),
                hardware: demo::demo_machine(),
                ..Default::default()
            };
            config.save(&ctx.config_path)?;
            Ok(format!("Wrote {}\n", ctx.config_path.display()))
        }
    }
}
