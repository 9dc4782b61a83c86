//! Package spec parsing (`name@constraint`).

use std::fmt;

/// A package request: name plus version constraint.
///
/// The constraint is kept verbatim - it may be a dist-tag (`latest`), an
/// exact version, a semver range, or even an empty string from a
/// trailing bare `@`. Interpretation happens at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    /// Package name, possibly scoped (`@scope/name`).
    pub name: String,
    /// Version constraint, `"latest"` when none was given.
    pub version: String,
}

impl PackageSpec {
    /// Creates a spec from explicit parts.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl From<&str> for PackageSpec {
    fn from(raw: &str) -> Self {
        parse_package_string(raw)
    }
}

/// Parses a `name@constraint` string into a [`PackageSpec`].
///
/// Splits on the last `@` so scoped names survive: the leading `@` of
/// `@scope/pkg` is never a delimiter. A name with no constraint defaults
/// to `latest`; a trailing bare `@` yields an empty constraint, which is
/// preserved as-is rather than normalized.
pub fn parse_package_string(raw: &str) -> PackageSpec {
    match raw.rfind('@') {
        Some(pos) if pos > 0 => PackageSpec::new(&raw[..pos], &raw[pos + 1..]),
        _ => PackageSpec::new(raw, "latest"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_version() {
        let spec = parse_package_string("pkg@1.2.3");
        assert_eq!(spec.name, "pkg");
        assert_eq!(spec.version, "1.2.3");
    }

    #[test]
    fn test_parse_scoped_name_with_range() {
        let spec = parse_package_string("@scope/pkg@^1.0.0");
        assert_eq!(spec.name, "@scope/pkg");
        assert_eq!(spec.version, "^1.0.0");
    }

    #[test]
    fn test_parse_scoped_name_without_version() {
        let spec = parse_package_string("@scope/pkg");
        assert_eq!(spec.name, "@scope/pkg");
        assert_eq!(spec.version, "latest");
    }

    #[test]
    fn test_parse_bare_name_defaults_to_latest() {
        let spec = parse_package_string("pkg");
        assert_eq!(spec.name, "pkg");
        assert_eq!(spec.version, "latest");
    }

    #[test]
    fn test_parse_trailing_at_keeps_empty_version() {
        let spec = parse_package_string("pkg@");
        assert_eq!(spec.name, "pkg");
        assert_eq!(spec.version, "");
    }

    #[test]
    fn test_display_round_trip() {
        let spec = PackageSpec::new("@scope/pkg", "^2.0.0");
        assert_eq!(spec.to_string(), "@scope/pkg@^2.0.0");
    }
}
