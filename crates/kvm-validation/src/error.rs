//! Rejection reasons for untrusted input.

use thiserror::Error;

/// Why an input was rejected.
///
/// `field` names the input (`interface`, `argument`, `program_path`) so the
/// message can be shown to the caller who supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing left after trimming.
    #[error("{field} cannot be empty")]
    Empty {
        /// Rejected input.
        field: &'static str,
    },

    /// Longer than the kernel or tool accepts.
    #[error("{field} is {actual} characters, at most {max} allowed")]
    TooLong {
        /// Rejected input.
        field: &'static str,
        /// Limit in bytes.
        max: usize,
        /// Length of the input in bytes.
        actual: usize,
    },

    /// Contains a character that can split or terminate an argument.
    #[error("{field} contains forbidden character '{}'", found.escape_default())]
    ForbiddenChar {
        /// Rejected input.
        field: &'static str,
        /// First offending character.
        found: char,
    },

    /// Would resolve outside the directory it is joined to.
    #[error("{field} '{value}' would leave its directory")]
    PathTraversal {
        /// Rejected input.
        field: &'static str,
        /// The offending value or separator.
        value: String,
    },

    /// Uses characters outside the allowed set.
    #[error("{field} may only contain {allowed}, got '{value}'")]
    Disallowed {
        /// Rejected input.
        field: &'static str,
        /// Description of the allowed set.
        allowed: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl ValidationError {
    /// Name of the rejected input.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field }
            | Self::TooLong { field, .. }
            | Self::ForbiddenChar { field, .. }
            | Self::PathTraversal { field, .. }
            | Self::Disallowed { field, .. } => field,
        }
    }

    /// Whether the input looks like an injection or traversal attempt
    /// rather than a typo.
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(self, Self::ForbiddenChar { .. } | Self::PathTraversal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_field() {
        let err = ValidationError::Empty { field: "interface" };
        assert_eq!(err.field(), "interface");
        assert_eq!(err.to_string(), "interface cannot be empty");
        assert!(!err.is_security_error());
    }

    #[test]
    fn too_long_message() {
        let err = ValidationError::TooLong {
            field: "interface",
            max: 15,
            actual: 20,
        };
        assert_eq!(err.to_string(), "interface is 20 characters, at most 15 allowed");
    }

    #[test]
    fn forbidden_char_is_escaped() {
        let err = ValidationError::ForbiddenChar {
            field: "argument",
            found: '\n',
        };
        assert!(err.is_security_error());
        assert!(err.to_string().contains("'\\n'"));
    }

    #[test]
    fn traversal_is_security_error() {
        let err = ValidationError::PathTraversal {
            field: "interface",
            value: "..".into(),
        };
        assert!(err.is_security_error());
        assert_eq!(err.to_string(), "interface '..' would leave its directory");
    }
}
