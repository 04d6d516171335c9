//! String validation and sanitization functions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::sanitized::{InterfaceName, Sanitized};
use crate::MAX_INTERFACE_NAME_LENGTH;

/// Regex for valid interface names.
///
/// Same character class the tunnel launcher accepts for a config stem, minus
/// a leading `-`: names are passed as arguments and must not read as options.
static INTERFACE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_=+.][a-zA-Z0-9_=+.-]*$").unwrap_or_else(|_| unreachable!()));

const FIELD: &str = "interface";

fn check_null_bytes(input: &str) -> Result<(), ValidationError> {
    if input.contains('\0') {
        return Err(ValidationError::ForbiddenChar {
            field: FIELD,
            found: '\0',
        });
    }
    Ok(())
}

/// A name becomes `<dir>/<name>.conf`, so separators and dot names are out.
fn check_path_traversal(input: &str) -> Result<(), ValidationError> {
    if let Some(sep) = input.chars().find(|c| matches!(c, '/' | '\\')) {
        return Err(ValidationError::PathTraversal {
            field: FIELD,
            value: sep.to_string(),
        });
    }
    if input == "." || input == ".." {
        return Err(ValidationError::PathTraversal {
            field: FIELD,
            value: input.to_string(),
        });
    }
    Ok(())
}

/// Sanitize and validate a network interface name.
///
/// Interface names must:
/// - Be 1-15 characters (kernel `IFNAMSIZ` minus the terminator)
/// - Contain only alphanumerics and `_ = + . -`
/// - Not start with `-`
/// - Not be `.` or `..`
///
/// Surrounding whitespace is trimmed before checking.
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
///
/// # Example
///
/// ```
/// use kvm_validation::sanitize_interface_name;
///
/// let name = sanitize_interface_name("wg0")?;
/// assert_eq!(name.as_str(), "wg0");
///
/// assert!(sanitize_interface_name("../etc/passwd").is_err());
/// # Ok::<(), kvm_validation::ValidationError>(())
/// ```
pub fn sanitize_interface_name(name: &str) -> Result<Sanitized<InterfaceName>, ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty { field: FIELD });
    }

    if name.len() > MAX_INTERFACE_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: FIELD,
            max: MAX_INTERFACE_NAME_LENGTH,
            actual: name.len(),
        });
    }

    check_null_bytes(name)?;
    check_path_traversal(name)?;

    if !INTERFACE_NAME_REGEX.is_match(name) {
        return Err(ValidationError::Disallowed {
            field: FIELD,
            allowed: "alphanumerics and _ = + . - (not leading -)",
            value: name.to_string(),
        });
    }

    Ok(Sanitized::new(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("wg0" ; "default name")]
    #[test_case("wg-office" ; "hyphen")]
    #[test_case("tun_1.2" ; "underscore and dot")]
    #[test_case("a=b+c" ; "equals and plus")]
    #[test_case("abcdefghijklmno" ; "fifteen characters")]
    fn test_valid_interface_names(name: &str) {
        let sanitized = sanitize_interface_name(name).expect("should be valid");
        assert_eq!(sanitized.as_str(), name);
    }

    #[test]
    fn test_interface_name_is_trimmed() {
        let sanitized = sanitize_interface_name("  wg1 \n").expect("should be valid");
        assert_eq!(sanitized.as_str(), "wg1");
    }

    #[test]
    fn test_interface_name_empty() {
        let err = sanitize_interface_name("   ").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "interface" });
    }

    #[test]
    fn test_interface_name_too_long() {
        let err = sanitize_interface_name("abcdefghijklmnop").unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 15, actual: 16, .. }));
    }

    #[test_case("../wg0" ; "parent traversal")]
    #[test_case("etc/wg0" ; "slash")]
    #[test_case(".." ; "double dot")]
    #[test_case("." ; "single dot")]
    #[test_case("wg\\0" ; "backslash")]
    fn test_interface_name_traversal(name: &str) {
        let err = sanitize_interface_name(name).unwrap_err();
        assert!(matches!(err, ValidationError::PathTraversal { .. }));
        assert!(err.is_security_error());
    }

    #[test]
    fn test_interface_name_null_byte() {
        let err = sanitize_interface_name("wg\00").unwrap_err();
        assert!(matches!(err, ValidationError::ForbiddenChar { found: '\0', .. }));
    }

    #[test_case("wg0; rm -rf" ; "semicolon and space")]
    #[test_case("$(id)" ; "command substitution")]
    #[test_case("wg`x`" ; "backtick")]
    #[test_case("wg|cat" ; "pipe")]
    #[test_case("-h" ; "short option")]
    #[test_case("--help" ; "long option")]
    fn test_interface_name_shell_chars(name: &str) {
        let err = sanitize_interface_name(name).unwrap_err();
        assert!(matches!(err, ValidationError::Disallowed { .. }));
    }
}
