//! # kvm-cli
//!
//! Operator command-line interface for the KVM host's WireGuard manager.
//!
//! Provides commands for:
//! - Lifecycle state and interface status
//! - Bringing interfaces up and down
//! - Storing, checking and syncing configurations
//! - Keypair generation and peer listing
//!
//! Every command runs through [`kvm_wireguard::WireGuardService`], so the
//! CLI sees exactly what the HTTP API sees. `config check` is the exception:
//! it validates text offline and never touches the host.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, ConfigCommands, Format};
pub use error::CliError;
pub use output::OutputFormat;
