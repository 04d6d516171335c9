//! Input validation and safe process execution for the KVM WireGuard manager.
//!
//! Interface names arrive from HTTP callers and operators and end up in file
//! paths and process arguments, so they are treated as untrusted identifiers
//! and checked against an allow-list before use.
//!
//! # Security Features
//!
//! - **Command injection prevention**: [`command::SafeCommand`] never invokes a shell
//! - **Path traversal protection**: interface names cannot contain `/`, `\`, or be `..`
//! - **Type-safe wrappers**: `Sanitized<T>` types prove validation was performed
//!
//! ```
//! use kvm_validation::sanitize_interface_name;
//!
//! let name = sanitize_interface_name("wg0")?;
//! assert_eq!(name.as_str(), "wg0");
//! assert!(sanitize_interface_name("wg0; reboot").is_err());
//! # Ok::<(), kvm_validation::ValidationError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
mod error;
mod sanitized;
mod strings;

pub use command::{AllowedProgram, CommandError, CommandOutput, SafeCommand};
pub use error::ValidationError;
pub use sanitized::{InterfaceName, Sanitized, SanitizationKind};
pub use strings::sanitize_interface_name;

/// Maximum length for interface names (`IFNAMSIZ` - 1).
pub const MAX_INTERFACE_NAME_LENGTH: usize = 15;
