/// CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::process::ProcessSort;

// Build timestamp injected at compile time
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "sysmon-cli")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./config.yaml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Run(RunCommands),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Commands that run against a loaded and validated configuration
#[derive(Subcommand)]
pub enum RunCommands {
    /// Print one metrics report
    Report {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a metrics report every monitoring interval until Ctrl-C
    Monitor,

    /// List running processes
    Processes {
        /// Sort order (default: enumeration order)
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,

        /// Show at most this many processes (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show details for one process
    ProcessInfo {
        /// Process ID
        pid: u32,
    },

    /// Terminate a process
    Kill {
        /// Process ID
        pid: u32,

        /// Send SIGKILL instead of SIGTERM
        #[arg(short, long)]
        force: bool,

        /// Skip the confirmation prompt (implied by --force)
        #[arg(short, long)]
        yes: bool,
    },

    /// Live dashboard (default when no command is given)
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Cpu,
    Memory,
    Pid,
}

impl From<SortKey> for ProcessSort {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Cpu => ProcessSort::Cpu,
            SortKey::Memory => ProcessSort::Memory,
            SortKey::Pid => ProcessSort::Pid,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// View the effective configuration
    View,

    /// Validate configuration
    Validate,

    /// Show which configuration file is in use
    Path,
}
