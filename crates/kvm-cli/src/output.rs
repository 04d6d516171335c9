//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats. JSON uses the
//! same camelCase DTOs the HTTP API returns.

use std::io::Write;

use kvm_wireguard::{ConfigDocument, Keypair, PeerList, StatusReport};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

impl TableDisplay for StatusReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Interface:    {}", self.interface)?;
        writeln!(writer, "State:        {}", self.state)?;
        writeln!(writer, "Public Key:   {}", or_dash(&self.public_key))?;
        writeln!(writer, "Address:      {}", or_dash(&self.address))?;
        if self.listen_port > 0 {
            writeln!(writer, "Listen Port:  {}", self.listen_port)?;
        } else {
            writeln!(writer, "Listen Port:  -")?;
        }
        writeln!(writer, "Peers:        {}", self.peer_count)?;
        Ok(())
    }
}

impl TableDisplay for ConfigDocument {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write!(writer, "{}", self.config)?;
        if !self.config.ends_with('\n') {
            writeln!(writer)?;
        }
        Ok(())
    }
}

impl TableDisplay for Keypair {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "PrivateKey = {}", self.private_key.expose())?;
        writeln!(writer, "PublicKey  = {}", self.public_key)?;
        Ok(())
    }
}

impl TableDisplay for PeerList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.peers.is_empty() {
            writeln!(writer, "No peers on {}", self.interface)?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<44}  {:<24}  {:<20}  {:>10}  {:>12}  {:>12}",
            "PUBLIC KEY", "ENDPOINT", "ALLOWED IPS", "HANDSHAKE", "RX", "TX"
        )?;
        writeln!(writer, "{}", "─".repeat(134))?;

        for peer in &self.peers {
            let handshake = if peer.latest_handshake > 0 {
                peer.latest_handshake.to_string()
            } else {
                "never".to_string()
            };
            writeln!(
                writer,
                "{:<44}  {:<24}  {:<20}  {:>10}  {:>12}  {:>12}",
                peer.public_key,
                peer.endpoint.as_deref().unwrap_or("-"),
                or_dash(&peer.allowed_ips.join(",")),
                handshake,
                peer.rx_bytes,
                peer.tx_bytes
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} peer(s)", self.peers.len())?;
        Ok(())
    }
}

/// Outcome of a command that changes state.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    /// What was done.
    pub action: String,
    /// Interface acted on.
    pub interface: String,
}

impl ActionResult {
    /// Create a new action result.
    #[must_use]
    pub fn new(action: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            interface: interface.into(),
        }
    }
}

impl TableDisplay for ActionResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {}", self.interface, self.action)?;
        Ok(())
    }
}

/// Result of an offline configuration check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCheck {
    /// Interface address from the checked configuration.
    pub address: String,
    /// Number of peers in the checked configuration.
    pub peer_count: usize,
}

impl TableDisplay for ConfigCheck {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Configuration OK: address {}, {} peer(s)",
            self.address, self.peer_count
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvm_wireguard::{LifecycleState, LivePeer, SecretKey};

    fn render<T: Serialize + TableDisplay>(format: Format, value: &T) -> String {
        let mut buf = Vec::new();
        OutputFormat::new(format).write(&mut buf, value).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    fn report() -> StatusReport {
        StatusReport {
            state: LifecycleState::Connected,
            interface: "wg0".into(),
            public_key: "HIgo9xNzJMWLKASShiTqIybxZ0U3wGLiUeJ1PKf8ykw=".into(),
            address: "10.0.0.1/24".into(),
            listen_port: 51820,
            peer_count: 2,
            is_running: true,
            is_connected: true,
        }
    }

    #[test]
    fn status_table() {
        let output = render(Format::Table, &report());
        assert!(output.contains("State:        connected"));
        assert!(output.contains("Listen Port:  51820"));
        assert!(output.contains("Peers:        2"));
    }

    #[test]
    fn status_json_uses_api_names() {
        let output = render(Format::Json, &report());
        assert!(output.contains("\"state\": \"connected\""));
        assert!(output.contains("\"peerCount\": 2"));
        assert!(output.contains("\"isRunning\": true"));
    }

    #[test]
    fn empty_peer_table() {
        let list = PeerList {
            interface: "wg0".into(),
            peers: Vec::new(),
        };
        assert_eq!(render(Format::Table, &list), "No peers on wg0\n");
    }

    #[test]
    fn peer_table_rows() {
        let list = PeerList {
            interface: "wg0".into(),
            peers: vec![LivePeer {
                public_key: "peer1".into(),
                allowed_ips: vec!["10.0.0.2/32".into(), "10.0.1.0/24".into()],
                ..LivePeer::default()
            }],
        };

        let output = render(Format::Table, &list);
        assert!(output.contains("PUBLIC KEY"));
        assert!(output.contains("10.0.0.2/32,10.0.1.0/24"));
        assert!(output.contains("never"));
        assert!(output.contains("Total: 1 peer(s)"));
    }

    #[test]
    fn keypair_table_prints_both_keys() {
        let keypair = Keypair {
            private_key: SecretKey::new("cHJpdmF0ZQ=="),
            public_key: "cHVibGlj".into(),
        };
        let output = render(Format::Table, &keypair);
        assert!(output.contains("PrivateKey = cHJpdmF0ZQ=="));
        assert!(output.contains("PublicKey  = cHVibGlj"));
    }

    #[test]
    fn config_document_table_is_raw_text() {
        let document = ConfigDocument {
            interface: "wg0".into(),
            config: "[Interface]\nAddress = 10.0.0.1/24".into(),
        };
        assert_eq!(
            render(Format::Table, &document),
            "[Interface]\nAddress = 10.0.0.1/24\n"
        );
    }

    #[test]
    fn action_result_formats() {
        let result = ActionResult::new("up", "wg0");
        assert_eq!(render(Format::Table, &result), "wg0: up\n");
        assert!(render(Format::Json, &result).contains("\"action\": \"up\""));
    }
}
