//! End-to-end tests of the `kvm-wg` binary.
//!
//! Settings point the tool paths at files that do not exist, so nothing
//! here touches the host's network stack.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const VALID: &str = "\
[Interface]
PrivateKey = yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=
Address = 10.0.0.1/24
ListenPort = 51820

[Peer]
PublicKey = xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=
Endpoint = 192.95.5.67:1234
AllowedIPs = 10.0.0.2/32
";

struct Host {
    dir: TempDir,
}

impl Host {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let settings = format!(
            "config_dir = \"{}\"\nwg_path = \"/nonexistent/wg\"\nwg_quick_path = \"/nonexistent/wg-quick\"\nip_path = \"/nonexistent/ip\"\n",
            dir.path().join("wireguard").display()
        );
        fs::write(dir.path().join("settings.toml"), settings).expect("write settings");
        Self { dir }
    }

    fn write(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("write file");
        path.display().to_string()
    }

    fn stored(&self, interface: &str) -> std::path::PathBuf {
        self.dir.path().join("wireguard").join(format!("{interface}.conf"))
    }

    fn kvm_wg(&self) -> Command {
        let mut cmd = Command::cargo_bin("kvm-wg").expect("binary");
        cmd.env_remove("KVM_WG_SETTINGS")
            .arg("--settings")
            .arg(self.dir.path().join("settings.toml"));
        cmd
    }
}

fn offline() -> Command {
    let mut cmd = Command::cargo_bin("kvm-wg").expect("binary");
    cmd.env("KVM_WG_SETTINGS", "/nonexistent/settings.toml");
    cmd
}

#[test]
fn help_lists_commands() {
    offline()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("keygen"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn config_check_accepts_valid_file() {
    let host = Host::new();
    let file = host.write("wg0.conf", VALID);

    // Runs before settings are loaded, so a missing settings file is fine.
    offline()
        .args(["config", "check", &file])
        .assert()
        .success()
        .stdout("Configuration OK: address 10.0.0.1/24, 1 peer(s)\n");
}

#[test]
fn config_check_reads_stdin() {
    offline()
        .args(["--format", "json", "config", "check", "-"])
        .write_stdin(VALID)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"peerCount\": 1"));
}

#[test]
fn config_check_rejects_invalid_file() {
    let host = Host::new();
    let file = host.write("bad.conf", &VALID.replace("AllowedIPs = 10.0.0.2/32\n", ""));

    offline()
        .args(["config", "check", &file])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains(
            "Error: invalid config: peer 0: at least one allowed IP is required",
        ));
}

#[test]
fn missing_settings_file_fails() {
    offline()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: settings error:"));
}

#[test]
fn unknown_settings_key_fails() {
    let host = Host::new();
    let settings = host.write("extra.toml", "listen_port = 51820\n");

    offline()
        .args(["--settings", &settings, "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid TOML"));
}

#[test]
fn status_without_tooling_is_not_installed() {
    let host = Host::new();

    host.kvm_wg()
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"notInstalled\""))
        .stdout(predicate::str::contains("\"interface\": \"wg0\""));
}

#[test]
fn config_save_show_delete() {
    let host = Host::new();
    let file = host.write("input.conf", VALID);

    host.kvm_wg()
        .args(["-i", "wg1", "config", "save", &file])
        .assert()
        .success()
        .stdout("wg1: configuration saved\n");
    assert_eq!(fs::read_to_string(host.stored("wg1")).expect("stored"), VALID);
    assert_owner_only(&host.stored("wg1"));

    host.kvm_wg()
        .args(["config", "show", "--interface", "wg1"])
        .assert()
        .success()
        .stdout(VALID);

    host.kvm_wg()
        .args(["config", "delete", "-i", "wg1"])
        .assert()
        .success();
    assert!(!host.stored("wg1").exists());

    host.kvm_wg()
        .args(["config", "show", "-i", "wg1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration found for interface wg1"));
}

#[test]
fn config_save_rejects_invalid_text() {
    let host = Host::new();

    host.kvm_wg()
        .args(["config", "save", "-"])
        .write_stdin("[Interface]\nAddress = 10.0.0.1/24\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("interface private key is required"));
    assert!(!host.stored("wg0").exists());
}

#[test]
fn traversal_interface_name_is_rejected() {
    let host = Host::new();
    let file = host.write("input.conf", VALID);

    host.kvm_wg()
        .args(["-i", "../../etc/passwd", "config", "save", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid interface name"));
}

#[test]
fn keygen_reports_missing_tool() {
    let host = Host::new();

    host.kvm_wg()
        .arg("keygen")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: process failed: wg genkey"));
}

#[cfg(unix)]
fn assert_owner_only(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[cfg(not(unix))]
fn assert_owner_only(_path: &Path) {}
