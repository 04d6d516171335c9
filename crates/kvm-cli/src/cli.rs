//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// kvm-wg - WireGuard tunnel management for the KVM host.
#[derive(Parser, Debug, Clone)]
#[command(name = "kvm-wg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (TOML). Built-in defaults are used when absent.
    #[arg(short, long, env = "KVM_WG_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Interface to operate on. Empty means the configured default.
    #[arg(short, long, global = true, default_value = "")]
    pub interface: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the lifecycle state and a summary of the interface.
    Status,

    /// Bring the default interface up.
    Start,

    /// Bring the default interface down.
    Stop,

    /// Restart the default interface.
    Restart,

    /// Bring an interface up.
    Up {
        /// Interface name; overrides `--interface`.
        name: Option<String>,
    },

    /// Bring an interface down. Does nothing if it is not up.
    Down {
        /// Interface name; overrides `--interface`.
        name: Option<String>,
    },

    /// Stored configuration commands.
    Config {
        /// Config subcommand to execute.
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate a new keypair.
    Keygen,

    /// List live peers.
    Peers,

    /// Apply the stored configuration to the running interface in place.
    Sync,
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the stored configuration.
    Show,

    /// Validate and store a configuration.
    Save {
        /// File to read, or `-` for stdin.
        file: PathBuf,
    },

    /// Delete the stored configuration.
    Delete,

    /// Validate a configuration without storing it.
    Check {
        /// File to read, or `-` for stdin.
        file: PathBuf,
    },
}

impl Commands {
    /// Interface for this command, given the global `--interface` value.
    #[must_use]
    pub fn interface<'a>(&'a self, global: &'a str) -> &'a str {
        match self {
            Self::Up { name: Some(name) } | Self::Down { name: Some(name) } => name,
            _ => global,
        }
    }
}
