use clap::{Parser, Subcommand};
use xray_manager::completions::CompletionShell;

#[derive(Parser)]
#[command(name = "xray-manager")]
#[command(version)]
#[command(about = "Install, update and supervise the Xray daemon", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Check for updates, start Xray and supervise it until Ctrl+C
    Run {
        /// Config file to run (defaults to the selected one)
        #[arg(short, long)]
        config: Option<String>,

        /// Do not contact the release index before starting
        #[arg(long)]
        skip_update: bool,
    },

    /// Install or update the Xray binary to the latest release
    Update,

    /// Show installation and daemon status
    Status,

    /// Manage daemon config files
    Configs {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Inspect per-run daemon logs
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (detected from $SHELL if omitted)
        #[arg(value_enum)]
        shell: Option<CompletionShell>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// List available config files
    List,

    /// Select the config used by default
    Select {
        /// Config file name, e.g. config.json
        name: String,
    },

    /// Write an example config under a free name
    Example,
}

#[derive(Subcommand)]
pub(crate) enum LogCommands {
    /// List run logs, newest first
    List,

    /// Print the tail of a run log
    Show {
        /// Log file name (defaults to the newest)
        name: Option<String>,

        /// Number of trailing lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}
