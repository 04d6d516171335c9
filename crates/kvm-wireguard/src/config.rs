//! WireGuard configuration file parsing, formatting and validation.
//!
//! This module handles the INI-style configuration format consumed by the
//! tunnel launcher. Parsing and validation are two separate steps:
//!
//! - [`parse_config`] is forgiving. Comments, blank lines, keys outside a
//!   section, unknown sections, unknown keys and unparseable numbers are all
//!   inert, so operator-edited files and files carrying keys from newer tool
//!   versions still load.
//! - [`validate_config`] is strict and reports the first missing field.
//!
//! [`format_config`] is a canonicalizing writer: the text it produces parses
//! back to an equal [`TunnelConfig`], but it does not preserve comments,
//! unknown keys or the original spacing.

use std::collections::HashSet;
use std::fmt;
use std::fmt::Write as FmtWrite;

use crate::error::{ConfigIssue, Result, WireGuardError};

/// The `[Interface]` section of a tunnel configuration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Base64 private key.
    pub private_key: String,
    /// Interface address in CIDR notation.
    pub address: String,
    /// Optional UDP listen port.
    pub listen_port: Option<u16>,
    /// Optional DNS servers, as written.
    pub dns: Option<String>,
    /// Optional MTU.
    pub mtu: Option<u16>,
}

impl InterfaceConfig {
    /// Creates an interface section with the two required fields.
    #[must_use]
    pub fn new(private_key: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    /// Sets the listen port.
    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// Sets the DNS servers.
    #[must_use]
    pub fn with_dns(mut self, dns: impl Into<String>) -> Self {
        self.dns = Some(dns.into());
        self
    }

    /// Sets the MTU.
    #[must_use]
    pub fn with_mtu(mut self, mtu: u16) -> Self {
        self.mtu = Some(mtu);
        self
    }
}

impl fmt::Debug for InterfaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceConfig")
            .field("private_key", &redacted(&self.private_key))
            .field("address", &self.address)
            .field("listen_port", &self.listen_port)
            .field("dns", &self.dns)
            .field("mtu", &self.mtu)
            .finish()
    }
}

/// A `[Peer]` section of a tunnel configuration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PeerConfig {
    /// The peer's base64 public key.
    pub public_key: String,
    /// Optional preshared key.
    pub preshared_key: Option<String>,
    /// Optional `host:port` endpoint.
    pub endpoint: Option<String>,
    /// Allowed IPs in the order they were written.
    pub allowed_ips: Vec<String>,
    /// Optional persistent keepalive interval in seconds.
    pub persistent_keepalive: Option<u16>,
}

impl PeerConfig {
    /// Creates a peer with the given public key and no allowed IPs.
    #[must_use]
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    /// Sets the preshared key.
    #[must_use]
    pub fn with_preshared_key(mut self, key: impl Into<String>) -> Self {
        self.preshared_key = Some(key.into());
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Appends an allowed IP.
    #[must_use]
    pub fn with_allowed_ip(mut self, cidr: impl Into<String>) -> Self {
        self.allowed_ips.push(cidr.into());
        self
    }

    /// Sets the persistent keepalive interval.
    #[must_use]
    pub fn with_persistent_keepalive(mut self, seconds: u16) -> Self {
        self.persistent_keepalive = Some(seconds);
        self
    }
}

impl fmt::Debug for PeerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerConfig")
            .field("public_key", &self.public_key)
            .field(
                "preshared_key",
                &self.preshared_key.as_deref().map(redacted),
            )
            .field("endpoint", &self.endpoint)
            .field("allowed_ips", &self.allowed_ips)
            .field("persistent_keepalive", &self.persistent_keepalive)
            .finish()
    }
}

/// A complete tunnel configuration: one interface and its peers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TunnelConfig {
    /// The `[Interface]` section.
    pub interface: InterfaceConfig,
    /// `[Peer]` sections in file order.
    pub peers: Vec<PeerConfig>,
}

impl TunnelConfig {
    /// Creates a configuration with no peers.
    #[must_use]
    pub fn new(interface: InterfaceConfig) -> Self {
        Self {
            interface,
            peers: Vec::new(),
        }
    }

    /// Appends a peer.
    #[must_use]
    pub fn with_peer(mut self, peer: PeerConfig) -> Self {
        self.peers.push(peer);
        self
    }
}

fn redacted(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        format!("[REDACTED; {} chars]", secret.len())
    }
}

/// Parser cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Interface,
    Peer,
    Unknown,
}

/// Parses configuration text into a [`TunnelConfig`].
///
/// Never fails: malformed lines are skipped. Integer values are read from
/// their leading digits (`PersistentKeepalive = 25 # NAT` is 25); a value
/// with no leading digit, zero or out of range is left unset. A `[Peer]`
/// section that never receives a `PublicKey` is dropped.
#[must_use]
pub fn parse_config(text: &str) -> TunnelConfig {
    let mut config = TunnelConfig::default();
    let mut section = Section::None;
    let mut current_peer: Option<PeerConfig> = None;

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = section_header(line) {
            flush_peer(&mut config.peers, current_peer.take());

            section = match name.to_ascii_lowercase().as_str() {
                "interface" => Section::Interface,
                "peer" => {
                    current_peer = Some(PeerConfig::default());
                    Section::Peer
                }
                _ => Section::Unknown,
            };
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match section {
            Section::Interface => apply_interface_key(&mut config.interface, &key, value),
            Section::Peer => {
                if let Some(peer) = current_peer.as_mut() {
                    apply_peer_key(peer, &key, value);
                }
            }
            Section::None | Section::Unknown => {}
        }
    }

    flush_peer(&mut config.peers, current_peer);
    config
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn flush_peer(peers: &mut Vec<PeerConfig>, peer: Option<PeerConfig>) {
    if let Some(peer) = peer.filter(|p| !p.public_key.is_empty()) {
        peers.push(peer);
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Leading decimal digits; zero and garbage both mean "unset".
fn positive_u16(value: &str) -> Option<u16> {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse::<u16>().ok().filter(|v| *v > 0)
}

fn apply_interface_key(interface: &mut InterfaceConfig, key: &str, value: &str) {
    match key {
        "privatekey" => interface.private_key = value.to_string(),
        "address" => interface.address = value.to_string(),
        "listenport" => interface.listen_port = positive_u16(value),
        "dns" => interface.dns = non_empty(value),
        "mtu" => interface.mtu = positive_u16(value),
        _ => {}
    }
}

fn apply_peer_key(peer: &mut PeerConfig, key: &str, value: &str) {
    match key {
        "publickey" => peer.public_key = value.to_string(),
        "presharedkey" => peer.preshared_key = non_empty(value),
        "endpoint" => peer.endpoint = non_empty(value),
        "allowedips" => peer.allowed_ips.extend(
            value
                .split(',')
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string),
        ),
        "persistentkeepalive" => peer.persistent_keepalive = positive_u16(value),
        _ => {}
    }
}

/// Formats a [`TunnelConfig`] as launcher configuration text.
///
/// Unset or blank fields are omitted entirely; there are never empty
/// `Key = ` lines. Values are written trimmed.
#[must_use]
pub fn format_config(config: &TunnelConfig) -> String {
    write_config(config, true)
}

/// Formats a [`TunnelConfig`] for the control tool's `setconf`/`syncconf`.
///
/// Same as [`format_config`] minus the launcher-only keys `Address`, `DNS`
/// and `MTU`, which the control tool rejects.
#[must_use]
pub fn format_stripped(config: &TunnelConfig) -> String {
    write_config(config, false)
}

fn write_config(config: &TunnelConfig, launcher_keys: bool) -> String {
    let mut output = String::new();
    let interface = &config.interface;

    output.push_str("[Interface]\n");
    if let Some(key) = present(&interface.private_key) {
        let _ = writeln!(output, "PrivateKey = {key}");
    }
    if let Some(address) = present(&interface.address).filter(|_| launcher_keys) {
        let _ = writeln!(output, "Address = {address}");
    }
    if let Some(port) = interface.listen_port.filter(|p| *p > 0) {
        let _ = writeln!(output, "ListenPort = {port}");
    }
    if launcher_keys {
        if let Some(dns) = interface.dns.as_deref().and_then(present) {
            let _ = writeln!(output, "DNS = {dns}");
        }
        if let Some(mtu) = interface.mtu.filter(|m| *m > 0) {
            let _ = writeln!(output, "MTU = {mtu}");
        }
    }

    for peer in &config.peers {
        output.push_str("\n[Peer]\n");
        if let Some(key) = present(&peer.public_key) {
            let _ = writeln!(output, "PublicKey = {key}");
        }
        if let Some(psk) = peer.preshared_key.as_deref().and_then(present) {
            let _ = writeln!(output, "PresharedKey = {psk}");
        }
        if let Some(endpoint) = peer.endpoint.as_deref().and_then(present) {
            let _ = writeln!(output, "Endpoint = {endpoint}");
        }
        let allowed: Vec<&str> = peer.allowed_ips.iter().filter_map(|ip| present(ip)).collect();
        if !allowed.is_empty() {
            let _ = writeln!(output, "AllowedIPs = {}", allowed.join(", "));
        }
        if let Some(keepalive) = peer.persistent_keepalive.filter(|k| *k > 0) {
            let _ = writeln!(output, "PersistentKeepalive = {keepalive}");
        }
    }

    output
}

/// The trimmed value, or `None` if nothing is left.
fn present(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Validates the fields the launcher needs.
///
/// Checks run in order: interface private key, interface address, then each
/// peer in sequence (public key, allowed IPs, uniqueness). The first failure
/// is returned. Blank values count as missing, and an allowed-IP list
/// holding only blank entries counts as empty, since the formatter would
/// drop them.
///
/// # Errors
///
/// Returns [`WireGuardError::InvalidConfig`] naming the missing field.
pub fn validate_config(config: &TunnelConfig) -> Result<()> {
    if present(&config.interface.private_key).is_none() {
        return Err(WireGuardError::InvalidConfig(ConfigIssue::MissingPrivateKey));
    }
    if present(&config.interface.address).is_none() {
        return Err(WireGuardError::InvalidConfig(ConfigIssue::MissingAddress));
    }

    let mut seen = HashSet::new();
    for (index, peer) in config.peers.iter().enumerate() {
        if present(&peer.public_key).is_none() {
            return Err(WireGuardError::InvalidConfig(
                ConfigIssue::MissingPeerPublicKey { index },
            ));
        }
        if peer.allowed_ips.iter().all(|ip| present(ip).is_none()) {
            return Err(WireGuardError::InvalidConfig(ConfigIssue::EmptyAllowedIps {
                index,
            }));
        }
        if !seen.insert(peer.public_key.trim()) {
            return Err(WireGuardError::InvalidConfig(ConfigIssue::DuplicatePeer {
                index,
            }));
        }
    }

    Ok(())
}
