//! Palette command.

use anyhow::{Context as _, Result};

use hwscope_types::{DEFAULT_PALETTE, Rgb};

use super::Context;
use crate::cli::OutputFormat;
use crate::format::format_palette_text;

/// Show the plot palette, optionally replacing it in the config file first.
pub fn cmd_palette(ctx: &mut Context, set: Option<Vec<Rgb>>, format: OutputFormat) -> Result<String> {
    if let Some(palette) = set {
        ctx.config.monitor.palette = palette;
        ctx.config.validate()?;
        ctx.config
            .save(&ctx.config_path)
            .with_context(|| format!("Failed to update {}", ctx.config_path.display()))?;
        if !ctx.quiet {
            eprintln!("Palette saved to {}", ctx.config_path.display());
        }
    }

    let palette: &[Rgb] = if ctx.config.monitor.palette.is_empty() {
        &DEFAULT_PALETTE
    } else {
        &ctx.config.monitor.palette
    };

    match format {
        OutputFormat::Text => Ok(format_palette_text(palette, &ctx.opts)),
        OutputFormat::Json => ctx.opts.as_json(&palette),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Config;
    use crate::format::FormatOptions;

    fn context(dir: &tempfile::TempDir) -> Context {
        Context {
            config: Config::default(),
            config_path: dir.path().join("config.toml"),
            opts: FormatOptions::new(true),
            quiet: true,
        }
    }

    #[test]
    fn test_default_palette() {
        let dir = tempfile::tempdir().unwrap();
        let text = cmd_palette(&mut context(&dir), None, OutputFormat::Text).unwrap();
        assert_eq!(text.lines().count(), DEFAULT_PALETTE.len());
        assert!(text.starts_with(&format!(" 0  {}", DEFAULT_PALETTE[0])));
        assert!(text.starts_with(" 0  #0000FF"));
    }

    #[test]
    fn test_set_palette_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let palette = vec![Rgb::BLUE, Rgb::GREEN];

        let json = cmd_palette(&mut ctx, Some(palette.clone()), OutputFormat::Json).unwrap();
        let shown: Vec<Rgb> = serde_json::from_str(&json).unwrap();
        assert_eq!(shown, palette);

        let saved = Config::load(dir.path().join("config.toml")).unwrap();
        assert_eq!(saved.monitor.palette, palette);
    }

    #[test]
    fn test_duplicate_colors_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let result = cmd_palette(&mut ctx, Some(vec![Rgb::RED, Rgb::RED]), OutputFormat::Text);
        assert!(result.is_err());
        assert!(!dir.path().join("config.toml").exists());
    }
}
