//! Key generation through the control tool.
//!
//! The private key is only ever passed to `wg pubkey` on stdin. Diagnostics
//! carry key lengths, never key text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kvm_validation::AllowedProgram;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WireGuardError};
use crate::runner::{Invocation, ProcessRunner};
use crate::types::SecretKey;

/// Raw length of a Curve25519 key.
pub const KEY_LENGTH: usize = 32;

/// A freshly generated keypair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keypair {
    /// Base64 private key.
    pub private_key: SecretKey,
    /// Base64 public key derived from the private key.
    pub public_key: String,
}

/// Checks that `text` is standard base64 for exactly [`KEY_LENGTH`] bytes.
///
/// # Errors
///
/// Returns [`WireGuardError::MalformedKey`]. The message never includes the
/// input.
pub fn check_key(text: &str) -> Result<()> {
    let decoded = STANDARD.decode(text).map_err(|_| {
        WireGuardError::MalformedKey(format!("{} chars of non-base64 output", text.len()))
    })?;

    if decoded.len() != KEY_LENGTH {
        return Err(WireGuardError::MalformedKey(format!(
            "expected {KEY_LENGTH} bytes, got {}",
            decoded.len()
        )));
    }
    Ok(())
}

/// Generates keys by calling `wg genkey` and `wg pubkey`.
#[derive(Debug)]
pub struct KeyGenerator<'a, R> {
    runner: &'a R,
}

impl<'a, R: ProcessRunner> KeyGenerator<'a, R> {
    /// Creates a generator using `runner`.
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Generates a new private key.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the tool fails, or `MalformedKey` if its
    /// output is not a key.
    pub async fn generate_private_key(&self) -> Result<SecretKey> {
        let output = self
            .runner
            .run(&Invocation::new(AllowedProgram::Wg, ["genkey"]))
            .await?;

        let key = output.stdout.trim();
        check_key(key)?;
        debug!(key_len = key.len(), "generated private key");
        Ok(SecretKey::new(key))
    }

    /// Derives the public key for `private_key`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the tool fails, or `MalformedKey` if its
    /// output is not a key.
    pub async fn derive_public_key(&self, private_key: &SecretKey) -> Result<String> {
        let invocation = Invocation::new(AllowedProgram::Wg, ["pubkey"])
            .with_stdin(format!("{}\n", private_key.expose()));
        let output = self.runner.run(&invocation).await?;

        let key = output.stdout.trim();
        check_key(key)?;
        Ok(key.to_string())
    }

    /// Generates a private key and derives its public key.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever step fails first.
    pub async fn generate_keypair(&self) -> Result<Keypair> {
        let private_key = self.generate_private_key().await?;
        let public_key = self.derive_public_key(&private_key).await?;
        Ok(Keypair {
            private_key,
            public_key,
        })
    }
}
