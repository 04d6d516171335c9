//! Interface address extraction from `ip -4 addr show` output.

use ipnet::Ipv4Net;

/// Returns the first IPv4 address in CIDR form, or `None`.
///
/// Looks for the first `inet` line and takes the token after it. Tokens
/// that do not parse as an IPv4 network are skipped.
#[must_use]
pub fn first_ipv4(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "inet" {
            return None;
        }
        let net: Ipv4Net = tokens.next()?.parse().ok()?;
        Some(net.to_string())
    })
}
