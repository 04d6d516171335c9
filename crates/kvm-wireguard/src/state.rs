//! Externally reported lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an interface as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    /// The control tool or launcher binary is missing.
    NotInstalled,
    /// The interface does not exist.
    NotRunning,
    /// The interface exists but has no configuration file.
    NotConfigured,
    /// The interface exists and is configured, but no peer has shaken hands.
    Running,
    /// At least one peer has completed a handshake.
    Connected,
}

impl LifecycleState {
    /// Reduces the three observed facts to a state.
    ///
    /// Never yields [`LifecycleState::NotInstalled`]; installation is checked
    /// separately, before this is consulted. A link that is down dominates
    /// everything else, and a handshake dominates the config file check.
    #[must_use]
    pub fn from_facts(is_up: bool, config_exists: bool, is_connected: bool) -> Self {
        match (is_up, config_exists, is_connected) {
            (false, _, _) => Self::NotRunning,
            (true, _, true) => Self::Connected,
            (true, true, false) => Self::Running,
            (true, false, false) => Self::NotConfigured,
        }
    }

    /// Wire name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInstalled => "notInstalled",
            Self::NotRunning => "notRunning",
            Self::NotConfigured => "notConfigured",
            Self::Running => "running",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
