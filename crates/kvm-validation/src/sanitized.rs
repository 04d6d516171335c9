//! Proof-of-validation wrapper.

use std::fmt;
use std::marker::PhantomData;

mod private {
    pub trait Sealed {}
}

/// What a [`Sanitized`] value was checked as. Sealed: only this crate can
/// add kinds, because only this crate can construct the wrapper.
pub trait SanitizationKind: private::Sealed {}

/// Kind for names that passed [`sanitize_interface_name`](crate::sanitize_interface_name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceName;

impl private::Sealed for InterfaceName {}
impl SanitizationKind for InterfaceName {}

/// A string that passed the check for kind `K`.
///
/// There is no public constructor. File paths and process arguments take
/// `&Sanitized<InterfaceName>`, so a caller-supplied string cannot reach
/// either without going through the allow-list.
///
/// ```
/// use kvm_validation::{sanitize_interface_name, InterfaceName, Sanitized};
///
/// let name: Sanitized<InterfaceName> = sanitize_interface_name(" wg0 ")?;
/// assert_eq!(name.to_string(), "wg0");
/// # Ok::<(), kvm_validation::ValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sanitized<K: SanitizationKind> {
    value: String,
    kind: PhantomData<K>,
}

impl<K: SanitizationKind> Sanitized<K> {
    pub(crate) fn new(value: String) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }

    /// The checked value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Unwraps into the checked value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<K: SanitizationKind> AsRef<str> for Sanitized<K> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<K: SanitizationKind> fmt::Display for Sanitized<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
