//! CLI command implementations.
//!
//! Each submodule implements one group of commands on top of
//! [`kvm_wireguard::WireGuardService`]:
//! - [`status`] - Lifecycle state and interface summary
//! - [`lifecycle`] - start, stop, restart, up and down
//! - [`config`] - Stored configuration and sync
//! - [`keygen`] - Keypair generation
//! - [`peers`] - Live peer listing

pub mod config;
pub mod keygen;
pub mod lifecycle;
pub mod peers;
pub mod status;

pub use config::ConfigCommand;
pub use keygen::KeygenCommand;
pub use lifecycle::{Action, LifecycleCommand};
pub use peers::PeersCommand;
pub use status::StatusCommand;

#[cfg(test)]
pub(crate) mod testing {
    use kvm_wireguard::{FakeProcessRunner, WireGuardService, WireGuardSettings};
    use tempfile::TempDir;

    pub(crate) fn service() -> (TempDir, FakeProcessRunner, WireGuardService<FakeProcessRunner>) {
        let dir = TempDir::new().expect("temp dir");
        let settings = WireGuardSettings {
            config_dir: dir.path().join("wireguard"),
            wg_path: "wg".into(),
            wg_quick_path: "wg-quick".into(),
            ..WireGuardSettings::default()
        };
        let runner = FakeProcessRunner::new();
        let service = WireGuardService::new(settings, runner.clone()).expect("service");
        (dir, runner, service)
    }

    pub(crate) fn utf8(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("valid utf8")
    }
}
