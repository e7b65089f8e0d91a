//! Output formatting for text and JSON.

use std::fmt::Write as _;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use hwscope_core::{RenderRow, RowKind};
use hwscope_types::Rgb;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// A color swatch: filled for plotted sensors, hollow otherwise.
#[must_use]
pub fn format_swatch(color: Option<Rgb>, no_color: bool) -> String {
    match color {
        Some(c) if no_color => format!("[{}]", c),
        Some(c) => "■".truecolor(c.r, c.g, c.b).to_string(),
        None if no_color => "[       ]".to_string(),
        None => "□".dimmed().to_string(),
    }
}

fn expander(row: &RenderRow) -> &'static str {
    match (row.has_children, row.expanded) {
        (false, _) => " ",
        (true, true) => "-",
        (true, false) => "+",
    }
}

/// Column width for labels, so values line up.
fn label_width(rows: &[RenderRow]) -> usize {
    rows.iter()
        .map(|r| r.depth * 2 + r.label.chars().count())
        .max()
        .unwrap_or(0)
}

/// Render rows as an indented tree with value, min and max columns.
#[must_use]
pub fn format_tree_text(rows: &[RenderRow], opts: &FormatOptions) -> String {
    let width = label_width(rows);
    let mut output = String::new();

    for row in rows {
        let indent = "  ".repeat(row.depth);
        let text = format!("{}{}", indent, row.label);
        let padded = format!("{:<width$}", text, width = width);

        match row.kind {
            RowKind::Host => {
                let label = if opts.no_color {
                    padded
                } else {
                    padded.bold().to_string()
                };
                let _ = writeln!(output, "{} {}", expander(row), label);
            }
            RowKind::Hardware { .. } => {
                let label = if opts.no_color {
                    padded
                } else {
                    padded.cyan().to_string()
                };
                let _ = writeln!(output, "{} {}", expander(row), label);
            }
            RowKind::Sensor { .. } => {
                let value = row.value.as_deref().unwrap_or("-");
                let min = row.min.as_deref().unwrap_or("-");
                let max = row.max.as_deref().unwrap_or("-");
                let columns = format!("{:>12} {:>12} {:>12}", value, min, max);
                let columns = if row.hidden && !opts.no_color {
                    columns.dimmed().to_string()
                } else {
                    columns
                };
                let label = if row.hidden && !opts.no_color {
                    padded.dimmed().to_string()
                } else {
                    padded
                };
                let _ = writeln!(
                    output,
                    "{} {} {}",
                    format_swatch(row.color, opts.no_color),
                    label,
                    columns
                );
            }
        }
    }

    output
}

/// One palette entry per line, with its position.
#[must_use]
pub fn format_palette_text(palette: &[Rgb], opts: &FormatOptions) -> String {
    let mut output = String::new();
    for (i, color) in palette.iter().enumerate() {
        if opts.no_color {
            let _ = writeln!(output, "{:>2}  {}", i, color);
        } else {
            let _ = writeln!(
                output,
                "{:>2}  {} {}",
                i,
                "■■".truecolor(color.r, color.g, color.b),
                color
            );
        }
    }
    output
}
