//! Parser for `wg show <interface> dump` output.
//!
//! The dump is tab-separated. The first line describes the interface
//! (`private-key public-key listen-port fwmark`), every following line one
//! peer (`public-key preshared-key endpoint allowed-ips latest-handshake
//! transfer-rx transfer-tx persistent-keepalive`). Unset values are printed
//! as `(none)`, and a disabled keepalive as `off`.

use crate::types::{LivePeer, LiveStatus, SecretKey};

const NONE: &str = "(none)";
const PEER_FIELDS: usize = 8;

/// Parses dump text for an interface known to be up.
///
/// Short peer lines are skipped and malformed numbers read as zero. The
/// result is connected as soon as any peer reports a handshake.
#[must_use]
pub fn parse_dump(interface_name: &str, text: &str) -> LiveStatus {
    let mut status = LiveStatus {
        is_up: true,
        ..LiveStatus::down(interface_name)
    };

    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return status;
    };

    let fields: Vec<&str> = header.split('\t').collect();
    if fields.len() >= 3 {
        status.private_key = present(fields[0]).map(SecretKey::new);
        status.public_key = present(fields[1]).unwrap_or_default().to_string();
        status.listen_port = present(fields[2]).map(number).unwrap_or_default();
    }

    status.peers = lines.filter_map(parse_peer).collect();
    status.is_connected = status.peers.iter().any(LivePeer::has_handshake);
    status
}

fn parse_peer(line: &str) -> Option<LivePeer> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < PEER_FIELDS {
        return None;
    }

    Some(LivePeer {
        public_key: fields[0].to_string(),
        endpoint: present(fields[2]).map(str::to_string),
        allowed_ips: present(fields[3])
            .map(|ips| {
                ips.split(',')
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        latest_handshake: number(fields[4]),
        rx_bytes: number(fields[5]),
        tx_bytes: number(fields[6]),
        persistent_keepalive: match fields[7] {
            "off" => 0,
            value => number(value),
        },
    })
}

fn present(field: &str) -> Option<&str> {
    let field = field.trim();
    (!field.is_empty() && field != NONE).then_some(field)
}

fn number<T: std::str::FromStr + Default>(field: &str) -> T {
    field.trim().parse().unwrap_or_default()
}
