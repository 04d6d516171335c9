//! Interface control through `wg`, `wg-quick` and `ip`.

use std::path::Path;

use kvm_validation::{AllowedProgram, InterfaceName, Sanitized};
use tracing::{debug, info, warn};

use crate::address::first_ipv4;
use crate::dump::parse_dump;
use crate::error::Result;
use crate::runner::{Invocation, ProcessRunner};
use crate::store::ConfigStore;
use crate::types::LiveStatus;

/// Drives the tunnel tooling for individual interfaces.
#[derive(Debug, Clone)]
pub struct WireGuardControl<R> {
    runner: R,
    store: ConfigStore,
    default_interface: Sanitized<InterfaceName>,
}

impl<R: ProcessRunner> WireGuardControl<R> {
    /// Creates a controller.
    ///
    /// `start`, `stop` and `restart` act on `default_interface`.
    #[must_use]
    pub fn new(runner: R, store: ConfigStore, default_interface: Sanitized<InterfaceName>) -> Self {
        Self {
            runner,
            store,
            default_interface,
        }
    }

    /// The process runner.
    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// The configuration store.
    #[must_use]
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// The interface `start`, `stop` and `restart` act on.
    #[must_use]
    pub fn default_interface(&self) -> &Sanitized<InterfaceName> {
        &self.default_interface
    }

    /// Whether the interface exists at the link level.
    pub async fn is_up(&self, interface: &Sanitized<InterfaceName>) -> bool {
        let probe = Invocation::new(AllowedProgram::Ip, ["link", "show", interface.as_str()]);
        match self.runner.run(&probe).await {
            Ok(_) => true,
            Err(e) => {
                debug!(interface = %interface, error = %e, "link probe failed, treating as down");
                false
            }
        }
    }

    /// First IPv4 address of the interface, or an empty string.
    pub async fn address(&self, interface: &Sanitized<InterfaceName>) -> String {
        let query = Invocation::new(AllowedProgram::Ip, ["-4", "addr", "show", interface.as_str()]);
        match self.runner.run(&query).await {
            Ok(output) => first_ipv4(&output.stdout).unwrap_or_default(),
            Err(e) => {
                warn!(interface = %interface, error = %e, "address lookup failed");
                String::new()
            }
        }
    }

    /// Builds a fresh [`LiveStatus`].
    ///
    /// The dump is only requested when the link probe succeeds. Address
    /// lookup is best effort.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the dump fails for an interface that is up.
    pub async fn status(&self, interface: &Sanitized<InterfaceName>) -> Result<LiveStatus> {
        if !self.is_up(interface).await {
            return Ok(LiveStatus::down(interface.as_str()));
        }

        let dump = Invocation::new(AllowedProgram::Wg, ["show", interface.as_str(), "dump"]);
        let output = self.runner.run(&dump).await?;

        let mut status = parse_dump(interface.as_str(), &output.stdout);
        status.address = self.address(interface).await;
        debug!(
            interface = %interface,
            peers = status.peers.len(),
            connected = status.is_connected,
            "status collected"
        );
        Ok(status)
    }

    /// Brings the interface up with the launcher.
    ///
    /// The configuration directory is created first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the directory cannot be created, `ProcessFailed`
    /// if the launcher fails.
    pub async fn up(&self, interface: &Sanitized<InterfaceName>) -> Result<()> {
        self.store.ensure_dir().await?;
        self.runner
            .run(&Invocation::new(AllowedProgram::WgQuick, ["up", interface.as_str()]))
            .await?;
        info!(interface = %interface, "interface up");
        Ok(())
    }

    /// Brings the interface down with the launcher.
    ///
    /// Succeeds without doing anything if the interface is not up.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the launcher fails on an interface that is up.
    pub async fn down(&self, interface: &Sanitized<InterfaceName>) -> Result<()> {
        if !self.is_up(interface).await {
            debug!(interface = %interface, "interface already down");
            return Ok(());
        }

        self.runner
            .run(&Invocation::new(AllowedProgram::WgQuick, ["down", interface.as_str()]))
            .await?;
        info!(interface = %interface, "interface down");
        Ok(())
    }

    /// Brings the default interface up.
    ///
    /// # Errors
    ///
    /// See [`Self::up`].
    pub async fn start(&self) -> Result<()> {
        self.up(&self.default_interface).await
    }

    /// Brings the default interface down.
    ///
    /// # Errors
    ///
    /// See [`Self::down`].
    pub async fn stop(&self) -> Result<()> {
        self.down(&self.default_interface).await
    }

    /// Stops then starts the default interface.
    ///
    /// A failing stop is logged and ignored; a failing start is returned.
    ///
    /// # Errors
    ///
    /// See [`Self::up`].
    pub async fn restart(&self) -> Result<()> {
        if let Err(e) = self.stop().await {
            warn!(interface = %self.default_interface, error = %e, "stop failed during restart");
        }
        self.start().await
    }

    /// Replaces the live interface configuration with the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the control tool fails.
    pub async fn set_config(&self, interface: &Sanitized<InterfaceName>, path: &Path) -> Result<()> {
        self.apply("setconf", interface, path).await
    }

    /// Applies the file at `path` without disturbing existing sessions.
    ///
    /// # Errors
    ///
    /// Returns `ProcessFailed` if the control tool fails.
    pub async fn sync_config(&self, interface: &Sanitized<InterfaceName>, path: &Path) -> Result<()> {
        self.apply("syncconf", interface, path).await
    }

    async fn apply(&self, verb: &str, interface: &Sanitized<InterfaceName>, path: &Path) -> Result<()> {
        let path = path.display().to_string();
        self.runner
            .run(&Invocation::new(AllowedProgram::Wg, [verb, interface.as_str(), path.as_str()]))
            .await?;
        info!(interface = %interface, verb, "configuration applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireGuardError;
    use crate::runner::FakeProcessRunner;
    use kvm_validation::sanitize_interface_name;
    use tempfile::TempDir;

    const DUMP: &str = "priv=\tpub=\t51820\toff\npeer1\t(none)\t1.2.3.4:51820\t10.0.0.2/32\t1700000000\t10\t20\t25\n";
    const ADDR: &str = "4: wg0: <POINTOPOINT,UP> mtu 1420\n    inet 10.0.0.1/24 scope global wg0\n";

    fn name(s: &str) -> Sanitized<InterfaceName> {
        sanitize_interface_name(s).expect("valid name")
    }

    fn control() -> (TempDir, FakeProcessRunner, WireGuardControl<FakeProcessRunner>) {
        let dir = TempDir::new().expect("temp dir");
        let runner = FakeProcessRunner::new();
        let control = WireGuardControl::new(
            runner.clone(),
            ConfigStore::new(dir.path().join("wireguard")),
            name("wg0"),
        );
        (dir, runner, control)
    }

    #[tokio::test]
    async fn status_of_missing_interface_skips_dump() {
        let (_dir, runner, control) = control();

        let status = control.status(&name("wg0")).await.expect("status");
        assert!(!status.is_up);
        assert_eq!(status.interface_name, "wg0");
        assert_eq!(runner.command_lines(), vec!["ip link show wg0"]);
    }

    #[tokio::test]
    async fn status_of_running_interface() {
        let (_dir, runner, control) = control();
        runner.respond("ip link show wg0", "");
        runner.respond("wg show wg0 dump", DUMP);
        runner.respond("ip -4 addr show wg0", ADDR);

        let status = control.status(&name("wg0")).await.expect("status");
        assert!(status.is_up);
        assert!(status.is_connected);
        assert_eq!(status.public_key, "pub=");
        assert_eq!(status.listen_port, 51820);
        assert_eq!(status.address, "10.0.0.1/24");
        assert_eq!(status.peers[0].persistent_keepalive, 25);
    }

    #[tokio::test]
    async fn status_tolerates_address_failure() {
        let (_dir, runner, control) = control();
        runner.respond("ip link show wg0", "");
        runner.respond("wg show wg0 dump", DUMP);

        let status = control.status(&name("wg0")).await.expect("status");
        assert!(status.address.is_empty());
        assert_eq!(status.peers.len(), 1);
    }

    #[tokio::test]
    async fn status_propagates_dump_failure() {
        let (_dir, runner, control) = control();
        runner.respond("ip link show wg0", "");
        runner.fail("wg show wg0 dump", "Unable to access interface: Operation not permitted");

        let err = control.status(&name("wg0")).await.unwrap_err();
        assert!(matches!(err, WireGuardError::ProcessFailed { .. }));
    }

    #[tokio::test]
    async fn up_creates_config_dir_first() {
        let (_dir, runner, control) = control();
        runner.respond("wg-quick up wg1", "");

        control.up(&name("wg1")).await.expect("up");
        assert!(control.store().dir().is_dir());
        assert_eq!(runner.command_lines(), vec!["wg-quick up wg1"]);
    }

    #[tokio::test]
    async fn up_reports_launcher_failure() {
        let (_dir, runner, control) = control();
        runner.fail("wg-quick up wg0", "wg0.conf does not exist");

        assert!(control.up(&name("wg0")).await.is_err());
    }

    #[tokio::test]
    async fn down_when_not_up_is_noop() {
        let (_dir, runner, control) = control();

        control.down(&name("wg0")).await.expect("down");
        assert_eq!(runner.command_lines(), vec!["ip link show wg0"]);
    }

    #[tokio::test]
    async fn down_reports_failure_when_up() {
        let (_dir, runner, control) = control();
        runner.respond("ip link show wg0", "");
        runner.fail("wg-quick down wg0", "busy");

        assert!(control.down(&name("wg0")).await.is_err());
    }

    #[tokio::test]
    async fn restart_ignores_stop_failure() {
        let (_dir, runner, control) = control();
        runner.respond("ip link show wg0", "");
        runner.fail("wg-quick down wg0", "busy");
        runner.respond("wg-quick up wg0", "");

        control.restart().await.expect("restart");
        assert_eq!(
            runner.command_lines(),
            vec!["ip link show wg0", "wg-quick down wg0", "wg-quick up wg0"]
        );
    }

    #[tokio::test]
    async fn restart_reports_start_failure() {
        let (_dir, runner, control) = control();
        runner.fail("wg-quick up wg0", "RTNETLINK answers: Operation not supported");

        assert!(control.restart().await.is_err());
    }

    #[tokio::test]
    async fn set_and_sync_pass_interface_and_path() {
        let (_dir, runner, control) = control();
        runner.respond("wg setconf wg0 /tmp/wg0.conf", "");
        runner.respond("wg syncconf wg0 /tmp/wg0.conf", "");

        control.set_config(&name("wg0"), Path::new("/tmp/wg0.conf")).await.expect("setconf");
        control.sync_config(&name("wg0"), Path::new("/tmp/wg0.conf")).await.expect("syncconf");
        assert_eq!(runner.calls().len(), 2);
    }
}
