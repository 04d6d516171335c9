//! Live peer listing command.

use std::io::Write;

use kvm_wireguard::{ProcessRunner, WireGuardService};

use crate::error::CliError;
use crate::output::OutputFormat;

/// Peers command executor.
pub struct PeersCommand<'a, R> {
    service: &'a WireGuardService<R>,
}

impl<'a, R: ProcessRunner> PeersCommand<'a, R> {
    /// Create a new peers command.
    #[must_use]
    pub fn new(service: &'a WireGuardService<R>) -> Self {
        Self { service }
    }

    /// List the peers of `interface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        interface: &str,
    ) -> Result<(), CliError> {
        let peers = self.service.list_peers(interface).await?;
        format.write(writer, &peers)
    }
}
