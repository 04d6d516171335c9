//! Interface status command implementation.

use std::io::Write;

use kvm_wireguard::{ProcessRunner, WireGuardService};

use crate::error::CliError;
use crate::output::OutputFormat;

/// Status command executor.
pub struct StatusCommand<'a, R> {
    service: &'a WireGuardService<R>,
}

impl<'a, R: ProcessRunner> StatusCommand<'a, R> {
    /// Create a new status command.
    #[must_use]
    pub fn new(service: &'a WireGuardService<R>) -> Self {
        Self { service }
    }

    /// Execute the status command.
    ///
    /// # Errors
    ///
    /// Returns an error if the status query or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        interface: &str,
    ) -> Result<(), CliError> {
        let report = self.service.get_status(interface).await?;
        format.write(writer, &report)
    }
}
