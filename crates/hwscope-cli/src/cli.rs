//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use hwscope_types::{LoggingInterval, Rgb, UpdateInterval};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "hwscope")]
#[command(author, version, about = "Hardware sensor monitor", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/hwscope/config.toml)
    #[arg(short, long, global = true, env = "HWSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Monitor sensors, redrawing the tree after every refresh
    Watch {
        /// Stop after this many refreshes (default: run until Ctrl-C)
        #[arg(short = 'n', long)]
        ticks: Option<u64>,

        /// Refresh interval (250ms, 500ms, 1s, 2s, 5s, 10s)
        #[arg(short, long)]
        interval: Option<UpdateInterval>,

        /// Log sensor values (to the tracing output) once logging warms up
        #[arg(long)]
        log: bool,

        /// Minimum time between log records
        #[arg(long, requires = "log")]
        log_interval: Option<LoggingInterval>,

        /// Plot a sensor, by identifier (repeatable)
        #[arg(short, long = "plot", value_name = "SENSOR")]
        plot: Vec<String>,

        /// Output format (text redraws the tree, json prints one snapshot per line)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the sensor tree once
    Tree {
        /// Include hidden sensors
        #[arg(long)]
        show_hidden: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the plot palette
    Palette {
        /// Replace the configured palette (comma-separated #RRGGBB)
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<Rgb>>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a config file describing the demo machine
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from([
            "hwscope", "watch", "-n", "5", "--interval", "250ms", "--log", "--plot",
            "/amdcpu/0/load/0", "--plot", "/nvme/0/temperature/0",
        ])
        .unwrap();
        let Commands::Watch {
            ticks,
            interval,
            log,
            plot,
            format,
            ..
        } = cli.command
        else {
            panic!("expected watch");
        };
        assert_eq!(ticks, Some(5));
        assert_eq!(interval, Some(UpdateInterval::Ms250));
        assert!(log);
        assert_eq!(plot.len(), 2);
        assert_eq!(format, OutputFormat::Text);
    }

    #[test]
    fn test_rejects_unknown_interval() {
        assert!(Cli::try_parse_from(["hwscope", "watch", "--interval", "3s"]).is_err());
    }

    #[test]
    fn test_log_interval_requires_log() {
        assert!(Cli::try_parse_from(["hwscope", "watch", "--log-interval", "1m"]).is_err());
    }

    #[test]
    fn test_parse_palette_set() {
        let cli =
            Cli::try_parse_from(["hwscope", "palette", "--set", "#FF0000,#00ff00"]).unwrap();
        let Commands::Palette { set, .. } = cli.command else {
            panic!("expected palette");
        };
        assert_eq!(set, Some(vec![Rgb::new(255, 0, 0), Rgb::new(0, 255, 0)]));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hwscope", "tree", "--config", "/tmp/x.toml", "-q"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
    }
}
