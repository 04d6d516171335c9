//! Manager settings and installation check.
//!
//! Settings are read from TOML. Every field has a default, so an empty
//! document yields the stock layout:
//!
//! ```toml
//! config_dir = "/etc/wireguard"
//! default_interface = "wg0"
//! wg_path = "/usr/bin/wg"
//! wg_quick_path = "/usr/bin/wg-quick"
//! ip_path = "ip"
//! ```

use std::path::{Path, PathBuf};

use kvm_validation::{sanitize_interface_name, InterfaceName, Sanitized};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WireGuardError};

/// Default configuration directory.
pub const DEFAULT_CONFIG_DIR: &str = "/etc/wireguard";
/// Interface used when a caller does not name one.
pub const DEFAULT_INTERFACE: &str = "wg0";
/// Default path of the control tool.
pub const DEFAULT_WG_PATH: &str = "/usr/bin/wg";
/// Default path of the interface launcher.
pub const DEFAULT_WG_QUICK_PATH: &str = "/usr/bin/wg-quick";

/// Paths and defaults used by the manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WireGuardSettings {
    /// Directory holding one `<interface>.conf` per interface.
    pub config_dir: PathBuf,
    /// Interface used when a caller passes an empty name.
    pub default_interface: String,
    /// Control tool binary.
    pub wg_path: String,
    /// Interface launcher binary.
    pub wg_quick_path: String,
    /// Link introspection binary.
    pub ip_path: String,
}

impl Default for WireGuardSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            default_interface: DEFAULT_INTERFACE.to_string(),
            wg_path: DEFAULT_WG_PATH.to_string(),
            wg_quick_path: DEFAULT_WG_QUICK_PATH.to_string(),
            ip_path: "ip".to_string(),
        }
    }
}

impl WireGuardSettings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// settings are invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WireGuardError::Settings(format!(
                "failed to read settings file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the settings are invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| WireGuardError::Settings(format!("invalid TOML: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a path is empty or the default interface name is
    /// not an acceptable interface name.
    pub fn validate(&self) -> Result<()> {
        if self.config_dir.as_os_str().is_empty() {
            return Err(WireGuardError::Settings("config_dir cannot be empty".to_string()));
        }

        for (field, value) in [
            ("wg_path", &self.wg_path),
            ("wg_quick_path", &self.wg_quick_path),
            ("ip_path", &self.ip_path),
        ] {
            if value.trim().is_empty() {
                return Err(WireGuardError::Settings(format!("{field} cannot be empty")));
            }
        }

        sanitize_interface_name(&self.default_interface).map_err(|e| {
            WireGuardError::Settings(format!("default_interface is invalid: {e}"))
        })?;

        Ok(())
    }

    /// Resolves a caller-supplied interface name.
    ///
    /// Empty or whitespace-only names fall back to `default_interface`.
    ///
    /// # Errors
    ///
    /// Returns [`WireGuardError::InvalidInterfaceName`] if the name fails
    /// the allow-list.
    pub fn resolve_interface(&self, name: &str) -> Result<Sanitized<InterfaceName>> {
        let name = if name.trim().is_empty() {
            self.default_interface.as_str()
        } else {
            name
        };
        Ok(sanitize_interface_name(name)?)
    }
}

/// Presence of the tunnel tooling on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installation {
    /// Control tool binary exists.
    pub wg: bool,
    /// Interface launcher binary exists.
    pub wg_quick: bool,
}

impl Installation {
    /// Checks the configured binary paths.
    ///
    /// A path counts only if it is a regular file with an execute bit set.
    ///
    /// Bare program names (no `/`) are looked up on `PATH` by the OS at
    /// spawn time and are assumed present.
    pub async fn probe(settings: &WireGuardSettings) -> Self {
        Self {
            wg: binary_present(&settings.wg_path).await,
            wg_quick: binary_present(&settings.wg_quick_path).await,
        }
    }

    /// Whether everything needed is present.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.wg && self.wg_quick
    }
}

async fn binary_present(path: &str) -> bool {
    if !path.contains('/') {
        return true;
    }
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && is_executable(&metadata),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = WireGuardSettings::from_toml("").expect("defaults are valid");
        assert_eq!(settings, WireGuardSettings::default());
        assert_eq!(settings.config_dir, PathBuf::from("/etc/wireguard"));
        assert_eq!(settings.default_interface, "wg0");
    }

    #[test]
    fn partial_document_overrides() {
        let settings = WireGuardSettings::from_toml(
            r#"
            config_dir = "/var/lib/kvm/wireguard"
            default_interface = "wg-office"
            "#,
        )
        .expect("valid settings");

        assert_eq!(settings.config_dir, PathBuf::from("/var/lib/kvm/wireguard"));
        assert_eq!(settings.default_interface, "wg-office");
        assert_eq!(settings.wg_path, DEFAULT_WG_PATH);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = WireGuardSettings::from_toml("wireguard_go = true").unwrap_err();
        assert!(matches!(err, WireGuardError::Settings(_)));
    }

    #[test]
    fn rejects_bad_default_interface() {
        let err = WireGuardSettings::from_toml(r#"default_interface = "../wg0""#).unwrap_err();
        assert!(err.to_string().contains("default_interface"));
    }

    #[test]
    fn rejects_empty_paths() {
        let err = WireGuardSettings::from_toml(r#"wg_quick_path = " ""#).unwrap_err();
        assert!(err.to_string().contains("wg_quick_path"));

        let err = WireGuardSettings::from_toml(r#"config_dir = """#).unwrap_err();
        assert!(err.to_string().contains("config_dir"));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "ip_path = \"/sbin/ip\"").expect("write");

        let settings = WireGuardSettings::from_file(file.path()).expect("valid settings");
        assert_eq!(settings.ip_path, "/sbin/ip");
    }

    #[test]
    fn from_file_missing() {
        let err = WireGuardSettings::from_file("/nonexistent/kvm-wg.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read settings file"));
    }

    #[test]
    fn resolve_interface_falls_back_to_default() {
        let settings = WireGuardSettings::default();
        assert_eq!(settings.resolve_interface("").expect("default").as_str(), "wg0");
        assert_eq!(settings.resolve_interface("  ").expect("default").as_str(), "wg0");
        assert_eq!(settings.resolve_interface("wg1").expect("named").as_str(), "wg1");
    }

    #[test]
    fn resolve_interface_rejects_traversal() {
        let err = WireGuardSettings::default().resolve_interface("../../etc/shadow").unwrap_err();
        assert!(matches!(err, WireGuardError::InvalidInterfaceName(_)));
    }

    fn executable() -> NamedTempFile {
        let file = NamedTempFile::new().expect("temp file");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
        }
        file
    }

    #[tokio::test]
    async fn probe_reports_missing_binaries() {
        let file = executable();
        let settings = WireGuardSettings {
            wg_path: file.path().display().to_string(),
            wg_quick_path: "/nonexistent/kvm-wg-test/wg-quick".into(),
            ..WireGuardSettings::default()
        };

        let installation = Installation::probe(&settings).await;
        assert!(installation.wg);
        assert!(!installation.wg_quick);
        assert!(!installation.is_installed());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn installation_rejects_directories_and_plain_files() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let plain = NamedTempFile::new().expect("temp file");
        let settings = WireGuardSettings {
            wg_path: dir.path().display().to_string(),
            wg_quick_path: plain.path().display().to_string(),
            ..WireGuardSettings::default()
        };

        let installation = Installation::probe(&settings).await;
        assert!(!installation.wg);
        assert!(!installation.wg_quick);

        let wg = executable();
        let wg_quick = executable();
        let settings = WireGuardSettings {
            wg_path: wg.path().display().to_string(),
            wg_quick_path: wg_quick.path().display().to_string(),
            ..WireGuardSettings::default()
        };
        assert!(Installation::probe(&settings).await.is_installed());
    }

    #[tokio::test]
    async fn probe_trusts_bare_program_names() {
        let settings = WireGuardSettings {
            wg_path: "wg".into(),
            wg_quick_path: "wg-quick".into(),
            ..WireGuardSettings::default()
        };

        assert!(Installation::probe(&settings).await.is_installed());
    }
}
