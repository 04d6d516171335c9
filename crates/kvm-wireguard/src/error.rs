//! Error types for WireGuard management.

use std::fmt;
use std::path::PathBuf;

use kvm_validation::ValidationError;
use thiserror::Error;

/// Result type alias for WireGuard operations.
pub type Result<T> = std::result::Result<T, WireGuardError>;

/// Specific reason a tunnel configuration failed validation.
///
/// Peer indices are zero-based positions in the configuration's peer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    /// `[Interface]` has no `PrivateKey`.
    MissingPrivateKey,
    /// `[Interface]` has no `Address`.
    MissingAddress,
    /// A peer has no `PublicKey`.
    MissingPeerPublicKey {
        /// Offending peer.
        index: usize,
    },
    /// A peer has no `AllowedIPs` entries.
    EmptyAllowedIps {
        /// Offending peer.
        index: usize,
    },
    /// A peer repeats the public key of an earlier peer.
    DuplicatePeer {
        /// Offending peer.
        index: usize,
    },
}

impl ConfigIssue {
    /// Index of the offending peer, if the issue is peer-scoped.
    #[must_use]
    pub fn peer_index(&self) -> Option<usize> {
        match self {
            Self::MissingPrivateKey | Self::MissingAddress => None,
            Self::MissingPeerPublicKey { index }
            | Self::EmptyAllowedIps { index }
            | Self::DuplicatePeer { index } => Some(*index),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrivateKey => write!(f, "interface private key is required"),
            Self::MissingAddress => write!(f, "interface address is required"),
            Self::MissingPeerPublicKey { index } => {
                write!(f, "peer {index}: public key is required")
            }
            Self::EmptyAllowedIps { index } => {
                write!(f, "peer {index}: at least one allowed IP is required")
            }
            Self::DuplicatePeer { index } => {
                write!(f, "peer {index}: public key duplicates an earlier peer")
            }
        }
    }
}

/// Errors that can occur during WireGuard operations.
#[derive(Debug, Error)]
pub enum WireGuardError {
    /// An external tool could not be spawned or exited non-zero.
    #[error("process failed: {command}: {message}")]
    ProcessFailed {
        /// The command line that was run (never includes stdin).
        command: String,
        /// Underlying failure as reported by the tool or the OS.
        message: String,
    },

    /// A configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(ConfigIssue),

    /// A configuration file could not be read, written or removed.
    #[error("storage failure at {}: {source}", path.display())]
    Storage {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No configuration file exists for the interface.
    #[error("no configuration found for interface {interface}")]
    NotFound {
        /// Interface name.
        interface: String,
    },

    /// The interface name failed the allow-list check.
    #[error("invalid interface name: {0}")]
    InvalidInterfaceName(#[from] ValidationError),

    /// The control tool produced something that is not a key.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// Manager settings could not be loaded or are invalid.
    #[error("settings error: {0}")]
    Settings(String),
}

impl WireGuardError {
    /// Creates a `ProcessFailed` error.
    #[must_use]
    pub fn process_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a `Storage` error.
    #[must_use]
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Check if this is a missing-configuration error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_issue_messages_name_peer_index() {
        let issue = ConfigIssue::EmptyAllowedIps { index: 2 };
        assert_eq!(issue.to_string(), "peer 2: at least one allowed IP is required");
        assert_eq!(issue.peer_index(), Some(2));
        assert_eq!(ConfigIssue::MissingAddress.peer_index(), None);
    }

    #[test]
    fn invalid_config_display() {
        let err = WireGuardError::InvalidConfig(ConfigIssue::MissingPrivateKey);
        assert_eq!(err.to_string(), "invalid config: interface private key is required");
    }

    #[test]
    fn process_failed_display() {
        let err = WireGuardError::process_failed("wg-quick up wg0", "exit status 1");
        assert_eq!(err.to_string(), "process failed: wg-quick up wg0: exit status 1");
    }

    #[test]
    fn storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = WireGuardError::storage("/etc/wireguard/wg0.conf", io);
        assert!(err.to_string().contains("/etc/wireguard/wg0.conf"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn not_found_predicate() {
        let err = WireGuardError::NotFound { interface: "wg0".into() };
        assert!(err.is_not_found());
    }
}
