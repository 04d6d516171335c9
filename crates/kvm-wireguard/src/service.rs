//! Request-level operations for the API layer.
//!
//! Each method resolves the caller's interface name (empty means the
//! configured default), performs one operation and returns a serde DTO.
//! Mutating operations hold the interface's lock from [`InterfaceLocks`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{format_stripped, parse_config, validate_config, TunnelConfig};
use crate::control::WireGuardControl;
use crate::error::Result;
use crate::keys::{KeyGenerator, Keypair};
use crate::locks::InterfaceLocks;
use crate::runner::ProcessRunner;
use crate::settings::{Installation, WireGuardSettings};
use crate::state::LifecycleState;
use crate::store::ConfigStore;
use crate::types::LivePeer;

/// Summary returned by a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Reduced lifecycle state.
    pub state: LifecycleState,
    /// Interface the report is about.
    pub interface: String,
    /// Interface public key, empty if down.
    pub public_key: String,
    /// First IPv4 address, empty if unknown.
    pub address: String,
    /// Listen port, `0` if none.
    pub listen_port: u16,
    /// Number of peers in the live dump.
    pub peer_count: usize,
    /// Whether the link exists.
    pub is_running: bool,
    /// Whether any peer has shaken hands.
    pub is_connected: bool,
}

impl StatusReport {
    fn empty(state: LifecycleState, interface: &str) -> Self {
        Self {
            state,
            interface: interface.to_string(),
            public_key: String::new(),
            address: String::new(),
            listen_port: 0,
            peer_count: 0,
            is_running: false,
            is_connected: false,
        }
    }
}

/// Stored configuration text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Interface the configuration belongs to.
    pub interface: String,
    /// Configuration text as stored.
    pub config: String,
}

/// Live peers of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerList {
    /// Interface the peers belong to.
    pub interface: String,
    /// Peers in dump order.
    pub peers: Vec<LivePeer>,
}

/// Parses and validates configuration text without touching the host.
///
/// # Errors
///
/// Returns `InvalidConfig` with the first failing field.
pub fn check_config(text: &str) -> Result<TunnelConfig> {
    let config = parse_config(text);
    validate_config(&config)?;
    Ok(config)
}

/// The WireGuard manager as seen by the API layer.
#[derive(Debug)]
pub struct WireGuardService<R> {
    settings: WireGuardSettings,
    control: WireGuardControl<R>,
    locks: InterfaceLocks,
}

impl<R: ProcessRunner> WireGuardService<R> {
    /// Creates a service.
    ///
    /// # Errors
    ///
    /// Returns `Settings` or `InvalidInterfaceName` if the settings are
    /// invalid.
    pub fn new(settings: WireGuardSettings, runner: R) -> Result<Self> {
        settings.validate()?;
        let default_interface = settings.resolve_interface("")?;
        let store = ConfigStore::new(settings.config_dir.clone());

        Ok(Self {
            control: WireGuardControl::new(runner, store, default_interface),
            settings,
            locks: InterfaceLocks::new(),
        })
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &WireGuardSettings {
        &self.settings
    }

    /// The underlying controller.
    #[must_use]
    pub fn control(&self) -> &WireGuardControl<R> {
        &self.control
    }

    /// Reports the lifecycle state and a summary of the live interface.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInterfaceName` for a bad name and `ProcessFailed` if
    /// the dump fails for an interface that is up.
    pub async fn get_status(&self, interface: &str) -> Result<StatusReport> {
        let name = self.settings.resolve_interface(interface)?;

        if !Installation::probe(&self.settings).await.is_installed() {
            debug!(interface = %name, "tunnel tooling not installed");
            return Ok(StatusReport::empty(LifecycleState::NotInstalled, name.as_str()));
        }

        let status = self.control.status(&name).await?;
        let config_exists = self.control.store().exists(&name).await;
        let state = LifecycleState::from_facts(status.is_up, config_exists, status.is_connected);

        Ok(StatusReport {
            state,
            interface: status.interface_name,
            public_key: status.public_key,
            address: status.address,
            listen_port: status.listen_port,
            peer_count: status.peers.len(),
            is_running: status.is_up,
            is_connected: status.is_connected,
        })
    }

    /// Returns the stored configuration text.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no configuration is stored.
    pub async fn get_config(&self, interface: &str) -> Result<ConfigDocument> {
        let name = self.settings.resolve_interface(interface)?;
        let config = self.control.store().load(&name).await?;
        Ok(ConfigDocument {
            interface: name.into_inner(),
            config,
        })
    }

    /// Validates and stores configuration text.
    ///
    /// The caller's text is stored verbatim, so comments and extra keys
    /// survive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails, `Storage` if the write
    /// fails.
    pub async fn save_config(&self, interface: &str, text: &str) -> Result<()> {
        let name = self.settings.resolve_interface(interface)?;
        let config = check_config(text)?;

        let _guard = self.locks.lock(&name).await;
        self.control.store().save(&name, text).await?;
        info!(interface = %name, peers = config.peers.len(), "configuration saved");
        Ok(())
    }

    /// Deletes the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no configuration is stored.
    pub async fn delete_config(&self, interface: &str) -> Result<()> {
        let name = self.settings.resolve_interface(interface)?;
        let _guard = self.locks.lock(&name).await;
        self.control.store().delete(&name).await
    }

    /// Brings the default interface up.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the launcher fails.
    pub async fn start(&self) -> Result<()> {
        let _guard = self.locks.lock(self.control.default_interface()).await;
        self.control.start().await
    }

    /// Brings the default interface down.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the launcher fails.
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.locks.lock(self.control.default_interface()).await;
        self.control.stop().await
    }

    /// Restarts the default interface.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the start step fails.
    pub async fn restart(&self) -> Result<()> {
        let _guard = self.locks.lock(self.control.default_interface()).await;
        self.control.restart().await
    }

    /// Brings the named interface up.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the launcher fails.
    pub async fn up(&self, interface: &str) -> Result<()> {
        let name = self.settings.resolve_interface(interface)?;
        let _guard = self.locks.lock(&name).await;
        self.control.up(&name).await
    }

    /// Brings the named interface down.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the launcher fails on an interface that
    /// is up.
    pub async fn down(&self, interface: &str) -> Result<()> {
        let name = self.settings.resolve_interface(interface)?;
        let _guard = self.locks.lock(&name).await;
        self.control.down(&name).await
    }

    /// Generates a new keypair.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` or `MalformedKey`.
    pub async fn generate_keys(&self) -> Result<Keypair> {
        KeyGenerator::new(self.control.runner()).generate_keypair().await
    }

    /// Lists the live peers of an interface.
    ///
    /// An interface that is down has no peers.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the dump fails for an interface that is up.
    pub async fn list_peers(&self, interface: &str) -> Result<PeerList> {
        let name = self.settings.resolve_interface(interface)?;
        let status = self.control.status(&name).await?;
        Ok(PeerList {
            interface: name.into_inner(),
            peers: status.peers,
        })
    }

    /// Applies the stored configuration to a running interface in place.
    ///
    /// Launcher-only keys are stripped into a scratch file, which is removed
    /// whether or not the sync succeeds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidConfig`, `Storage` or `ProcessFailed`.
    pub async fn sync_config(&self, interface: &str) -> Result<()> {
        let name = self.settings.resolve_interface(interface)?;
        let _guard = self.locks.lock(&name).await;

        let store = self.control.store();
        let config = check_config(&store.load(&name).await?)?;
        let scratch = store.write_scratch(&name, &format_stripped(&config)).await?;

        let result = self.control.sync_config(&name, &scratch).await;
        store.remove_scratch(&scratch).await;
        result
    }
}
