//! Keypair generation command.

use std::io::Write;

use kvm_wireguard::{ProcessRunner, WireGuardService};

use crate::error::CliError;
use crate::output::OutputFormat;

/// Keygen command executor.
pub struct KeygenCommand<'a, R> {
    service: &'a WireGuardService<R>,
}

impl<'a, R: ProcessRunner> KeygenCommand<'a, R> {
    /// Create a new keygen command.
    #[must_use]
    pub fn new(service: &'a WireGuardService<R>) -> Self {
        Self { service }
    }

    /// Generate a keypair and print it.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation or output fails.
    pub async fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let keypair = self.service.generate_keys().await?;
        format.write(writer, &keypair)
    }
}
