use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("failed to parse version {0:?}: expected [v]MAJOR.MINOR.PATCH")]
    Unparsable(String),

    #[error("kubernetes version {actual} is lower than the minimum supported version {minimum}")]
    TooLow { actual: String, minimum: String },
}

impl VersionError {
    /// Short machine-readable reason for status conditions
    pub fn reason(&self) -> &'static str {
        match self {
            VersionError::Unparsable(_) => "VersionUnparsable",
            VersionError::TooLow { .. } => "VersionTooLow",
        }
    }
}

/// A `major.minor.patch` triple
///
/// Pre-release and build suffixes are dropped while parsing, so they can never
/// influence ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse `v1.20.0`, `1.20.2-kpn-065dce`, `v1.20.0+k3s.1` and friends
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let unparsable = || VersionError::Unparsable(raw.to_string());

        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);

        // Build metadata first, since it may itself contain '-'
        let core = trimmed.split('+').next().unwrap_or_default();
        let core = core.split('-').next().unwrap_or_default();

        let mut parts = core.split('.');
        let mut component = || -> Result<u64, VersionError> {
            let part = parts.next().ok_or_else(unparsable)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(unparsable());
            }
            part.parse().map_err(|_| unparsable())
        };

        let version = Version {
            major: component()?,
            minor: component()?,
            patch: component()?,
        };

        if parts.next().is_some() {
            return Err(unparsable());
        }

        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fail unless `actual` is at least `minimum`
pub fn check_minimum_version(actual: &str, minimum: &str) -> Result<(), VersionError> {
    let actual_version = Version::parse(actual)?;
    let minimum_version = Version::parse(minimum)?;

    match actual_version.cmp(&minimum_version) {
        Ordering::Less => Err(VersionError::TooLow {
            actual: actual.to_string(),
            minimum: minimum.to_string(),
        }),
        Ordering::Equal | Ordering::Greater => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMUM: &str = "1.20.0";

    #[test]
    fn test_accepts_equal_and_greater_versions() {
        let accepted = [
            "v1.20.0",
            "1.20.0",
            "1.20.2-kpn-065dce",
            "1.20.0-1095+9689d22dc3121e-dirty",
            "v1.21.0",
            "v2.0.0",
            "v1.20.0+k3s.1",
            "v1.20.0-k3s.1",
        ];

        for actual in accepted {
            assert_eq!(
                check_minimum_version(actual, MINIMUM),
                Ok(()),
                "{actual} should satisfy {MINIMUM}"
            );
        }
    }

    #[test]
    fn test_rejects_smaller_version() {
        let err = check_minimum_version("v1.19.3", MINIMUM).unwrap_err();
        assert_eq!(err.reason(), "VersionTooLow");
        assert!(err.to_string().contains("v1.19.3"));
    }

    #[test]
    fn test_rejects_unparsable_actual_version() {
        for actual in ["v1.19.foo", "", "1.20", "1.20.0.1", "v", "1..0", "1.-2.0"] {
            let err = check_minimum_version(actual, MINIMUM).unwrap_err();
            assert_eq!(err, VersionError::Unparsable(actual.to_string()), "{actual:?}");
        }
    }

    #[test]
    fn test_rejects_unparsable_minimum() {
        let err = check_minimum_version("1.20.0", "latest").unwrap_err();
        assert_eq!(err.reason(), "VersionUnparsable");
    }

    #[test]
    fn test_suffixes_never_affect_ordering() {
        assert_eq!(
            Version::parse("1.20.0-rc.1").unwrap(),
            Version::parse("v1.20.0+build.7").unwrap()
        );
        assert!(check_minimum_version("1.20.0-alpha", "1.20.0+zzz").is_ok());
    }

    #[test]
    fn test_ordering_is_numeric_not_lexical() {
        assert!(Version::parse("1.10.0").unwrap() > Version::parse("1.9.9").unwrap());
        assert!(check_minimum_version("1.9.9", "1.10.0").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::parse("v1.22.3-gke.1").unwrap().to_string(), "1.22.3");
    }
}
