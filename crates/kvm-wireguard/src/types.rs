//! Live status types and key material.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Base64 key material that must never show up in logs.
///
/// `Debug` prints only the length. The key itself is reachable through
/// [`SecretKey::expose`] and through serialization, which is how a freshly
/// generated private key is handed back to the caller.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wraps key text.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the key text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {} chars])", self.0.len())
    }
}

/// A peer as reported by the control tool's dump.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePeer {
    /// Peer public key.
    pub public_key: String,
    /// Last seen endpoint.
    pub endpoint: Option<String>,
    /// Allowed IPs.
    #[serde(rename = "allowedIPs")]
    pub allowed_ips: Vec<String>,
    /// Unix time of the latest handshake, `0` if never.
    pub latest_handshake: u64,
    /// Bytes received.
    #[serde(rename = "transferRx")]
    pub rx_bytes: u64,
    /// Bytes sent.
    #[serde(rename = "transferTx")]
    pub tx_bytes: u64,
    /// Keepalive interval in seconds, `0` when off.
    pub persistent_keepalive: u16,
}

impl LivePeer {
    /// Whether a handshake has ever completed.
    #[must_use]
    pub fn has_handshake(&self) -> bool {
        self.latest_handshake > 0
    }
}

/// Snapshot of an interface, rebuilt on every status query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveStatus {
    /// Interface name.
    pub interface_name: String,
    /// Whether the interface exists at the link level.
    pub is_up: bool,
    /// Interface private key.
    pub private_key: Option<SecretKey>,
    /// Interface public key.
    pub public_key: String,
    /// Listen port, `0` if none.
    pub listen_port: u16,
    /// First IPv4 address in CIDR form, empty if unknown.
    pub address: String,
    /// Peers in dump order.
    pub peers: Vec<LivePeer>,
    /// Whether any peer has completed a handshake.
    pub is_connected: bool,
}

impl LiveStatus {
    /// Status for an interface that is not present on the host.
    #[must_use]
    pub fn down(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_debug_is_redacted() {
        let key = SecretKey::new("yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=");
        let debug = format!("{key:?}");
        assert!(!debug.contains("yAnz"));
        assert!(debug.contains("44 chars"));
    }

    #[test]
    fn live_status_debug_hides_private_key() {
        let status = LiveStatus {
            private_key: Some(SecretKey::new("c2VjcmV0")),
            ..LiveStatus::down("wg0")
        };
        assert!(!format!("{status:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn live_peer_serializes_wire_names() {
        let peer = LivePeer {
            public_key: "peer1".into(),
            allowed_ips: vec!["10.0.0.2/32".into()],
            rx_bytes: 100,
            tx_bytes: 200,
            ..LivePeer::default()
        };

        let json = serde_json::to_value(&peer).expect("serialize");
        assert_eq!(json["publicKey"], "peer1");
        assert_eq!(json["allowedIPs"][0], "10.0.0.2/32");
        assert_eq!(json["transferRx"], 100);
        assert_eq!(json["transferTx"], 200);
        assert_eq!(json["latestHandshake"], 0);
    }

    #[test]
    fn down_status_is_empty() {
        let status = LiveStatus::down("wg1");
        assert_eq!(status.interface_name, "wg1");
        assert!(!status.is_up);
        assert!(!status.is_connected);
        assert!(status.peers.is_empty());
    }
}
