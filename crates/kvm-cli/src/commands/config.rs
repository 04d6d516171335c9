//! Stored configuration commands: show, save, delete, check and sync.

use std::io::{self, Write};
use std::path::Path;

use kvm_wireguard::{check_config, ProcessRunner, WireGuardService};

use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::output::{ActionResult, ConfigCheck, OutputFormat};

/// Reads configuration text from `path`, or from stdin when it is `-`.
///
/// # Errors
///
/// Returns an error if the source cannot be read.
pub fn read_source(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        return Ok(io::read_to_string(io::stdin())?);
    }
    std::fs::read_to_string(path).map_err(|e| {
        CliError::InvalidArgument(format!("cannot read '{}': {e}", path.display()))
    })
}

/// Validates configuration text without touching the host.
///
/// # Errors
///
/// Returns the first validation failure, or an output error.
pub fn check<W: Write>(writer: &mut W, format: &OutputFormat, text: &str) -> Result<(), CliError> {
    let config = check_config(text)?;
    format.write(
        writer,
        &ConfigCheck {
            address: config.interface.address,
            peer_count: config.peers.len(),
        },
    )
}

/// Config command executor.
pub struct ConfigCommand<'a, R> {
    service: &'a WireGuardService<R>,
}

impl<'a, R: ProcessRunner> ConfigCommand<'a, R> {
    /// Create a new config command.
    #[must_use]
    pub fn new(service: &'a WireGuardService<R>) -> Self {
        Self { service }
    }

    /// Execute a config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        interface: &str,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::Show => {
                let document = self.service.get_config(interface).await?;
                format.write(writer, &document)
            }
            ConfigCommands::Save { file } => {
                let text = read_source(file)?;
                self.save(writer, format, interface, &text).await
            }
            ConfigCommands::Delete => {
                let name = self.service.settings().resolve_interface(interface)?;
                self.service.delete_config(name.as_str()).await?;
                format.write(writer, &ActionResult::new("configuration deleted", name.into_inner()))
            }
            ConfigCommands::Check { file } => check(writer, format, &read_source(file)?),
        }
    }

    /// Validate and store `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, storage or output fails.
    pub async fn save<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        interface: &str,
        text: &str,
    ) -> Result<(), CliError> {
        let name = self.service.settings().resolve_interface(interface)?;
        self.service.save_config(name.as_str(), text).await?;
        format.write(writer, &ActionResult::new("configuration saved", name.into_inner()))
    }

    /// Apply the stored configuration to the running interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync or output fails.
    pub async fn sync<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        interface: &str,
    ) -> Result<(), CliError> {
        let name = self.service.settings().resolve_interface(interface)?;
        self.service.sync_config(name.as_str()).await?;
        format.write(writer, &ActionResult::new("configuration synced", name.into_inner()))
    }
}
