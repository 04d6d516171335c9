//! Per-interface configuration files.
//!
//! One file per interface at `<config_dir>/<interface>.conf`. The store does
//! not validate content and takes no locks: concurrent saves for the same
//! interface race, and the last rename wins. Each save is written to a
//! unique temporary file and renamed into place, so readers see either the
//! old or the new file, never a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use kvm_validation::{InterfaceName, Sanitized};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, WireGuardError};

const CONFIG_EXTENSION: &str = "conf";

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reads and writes interface configuration files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The configuration directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the configuration file for `interface`.
    #[must_use]
    pub fn path(&self, interface: &Sanitized<InterfaceName>) -> PathBuf {
        self.dir.join(format!("{interface}.{CONFIG_EXTENSION}"))
    }

    /// Creates the configuration directory, owner-only, if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);

        builder
            .create(&self.dir)
            .await
            .map_err(|e| WireGuardError::storage(&self.dir, e))
    }

    /// Reads the configuration text for `interface`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no file, `Storage` on other failures.
    pub async fn load(&self, interface: &Sanitized<InterfaceName>) -> Result<String> {
        let path = self.path(interface);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| not_found_or_storage(interface, &path, e))
    }

    /// Writes `text` as the configuration for `interface`.
    ///
    /// The text is stored byte for byte. Callers validate first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the directory or file cannot be written.
    pub async fn save(&self, interface: &Sanitized<InterfaceName>, text: &str) -> Result<()> {
        self.ensure_dir().await?;

        let path = self.path(interface);
        let temp = self.scratch_path(interface, "tmp");
        if let Err(e) = write_owner_only(&temp, text).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(WireGuardError::storage(&path, e));
        }

        info!(interface = %interface, path = %path.display(), bytes = text.len(), "saved configuration");
        Ok(())
    }

    /// Removes the configuration for `interface`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no file, `Storage` on other failures.
    pub async fn delete(&self, interface: &Sanitized<InterfaceName>) -> Result<()> {
        let path = self.path(interface);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_storage(interface, &path, e))?;

        info!(interface = %interface, "deleted configuration");
        Ok(())
    }

    /// Whether a configuration file exists for `interface`.
    pub async fn exists(&self, interface: &Sanitized<InterfaceName>) -> bool {
        tokio::fs::try_exists(self.path(interface))
            .await
            .unwrap_or(false)
    }

    /// Writes `text` to a fresh owner-only file next to the configuration
    /// and returns its path. The caller removes it with [`Self::remove_scratch`].
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the file cannot be written.
    pub async fn write_scratch(
        &self,
        interface: &Sanitized<InterfaceName>,
        text: &str,
    ) -> Result<PathBuf> {
        self.ensure_dir().await?;
        let path = self.scratch_path(interface, "sync");
        if let Err(e) = write_owner_only(&path, text).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
        Ok(path)
    }

    /// Removes a scratch file. Failures are logged and otherwise ignored.
    pub async fn remove_scratch(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!(path = %path.display(), error = %e, "could not remove scratch file");
        }
    }

    fn scratch_path(&self, interface: &Sanitized<InterfaceName>, kind: &str) -> PathBuf {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{interface}.{kind}.{}.{n}", std::process::id()))
    }
}

async fn write_owner_only(path: &Path, text: &str) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| WireGuardError::storage(path, e))?;
    file.write_all(text.as_bytes())
        .await
        .map_err(|e| WireGuardError::storage(path, e))?;
    file.sync_all()
        .await
        .map_err(|e| WireGuardError::storage(path, e))
}

fn not_found_or_storage(
    interface: &Sanitized<InterfaceName>,
    path: &Path,
    error: std::io::Error,
) -> WireGuardError {
    if error.kind() == ErrorKind::NotFound {
        WireGuardError::NotFound {
            interface: interface.to_string(),
        }
    } else {
        WireGuardError::storage(path, error)
    }
}
