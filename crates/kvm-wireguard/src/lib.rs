//! WireGuard configuration and status management for the KVM host.
//!
//! This crate drives an installed tunnel engine through its command-line
//! tools. It does not implement tunnelling itself.
//!
//! - [`config`]: forgiving parser, canonical formatter and strict validator
//!   for tunnel configuration files
//! - [`dump`]: parser for the control tool's tab-separated status dump
//! - [`LifecycleState`]: reduction of link, config and handshake facts to
//!   the reported state
//! - [`ConfigStore`]: one file per interface in the configuration directory
//! - [`WireGuardControl`] and [`WireGuardService`]: operations for the API
//!   layer, running processes through the [`ProcessRunner`] seam
//!
//! # Example
//!
//! ```
//! use kvm_wireguard::config::{format_config, parse_config, validate_config};
//!
//! let config = parse_config(
//!     "[Interface]\nPrivateKey = yAnz5TF+lXXJte14tji3zlMNq+hd2rYUIgJBgB3fBmk=\nAddress = 10.0.0.1/24\n",
//! );
//! validate_config(&config)?;
//! assert!(format_config(&config).starts_with("[Interface]\n"));
//! # Ok::<(), kvm_wireguard::WireGuardError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod address;
pub mod config;
mod control;
pub mod dump;
pub mod error;
mod keys;
mod locks;
mod runner;
mod service;
mod settings;
mod state;
mod store;
mod types;

pub use address::first_ipv4;
pub use config::{InterfaceConfig, PeerConfig, TunnelConfig};
pub use control::WireGuardControl;
pub use error::{ConfigIssue, Result, WireGuardError};
pub use keys::{check_key, KeyGenerator, Keypair, KEY_LENGTH};
pub use locks::InterfaceLocks;
pub use runner::{
    FakeProcessRunner, Invocation, ProcessOutput, ProcessRunner, RecordedCall, SystemRunner,
};
pub use service::{check_config, ConfigDocument, PeerList, StatusReport, WireGuardService};
pub use settings::{
    Installation, WireGuardSettings, DEFAULT_CONFIG_DIR, DEFAULT_INTERFACE, DEFAULT_WG_PATH,
    DEFAULT_WG_QUICK_PATH,
};
pub use state::LifecycleState;
pub use store::ConfigStore;
pub use types::{LivePeer, LiveStatus, SecretKey};
