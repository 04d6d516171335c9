//! CLI error types.

use std::fmt;

use kvm_wireguard::WireGuardError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Settings could not be loaded.
    Settings(String),
    /// A WireGuard operation failed.
    WireGuard(WireGuardError),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(msg) => write!(f, "settings error: {msg}"),
            Self::WireGuard(e) => write!(f, "{e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WireGuard(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<WireGuardError> for CliError {
    fn from(err: WireGuardError) -> Self {
        match err {
            WireGuardError::Settings(msg) => Self::Settings(msg),
            other => Self::WireGuard(other),
        }
    }
}
