//! Package version parsing and the satisfied-version check
//!
//! Salesforce package versions have up to four dot-separated numeric parts
//! (`major.minor.patch.build`). Missing parts compare as zero, so
//! `"1.0" < "1.0.1" < "1.1"`.

use crate::error::{OrgboxError, OrgboxResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed four-part package version with total ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl PackageVersion {
    pub fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Parse a version string like `"1.0"`, `"1.2.3"` or `"1.2.3.4"`
    pub fn parse(value: &str) -> OrgboxResult<Self> {
        value.parse()
    }
}

impl FromStr for PackageVersion {
    type Err = OrgboxError;

    fn from_str(s: &str) -> OrgboxResult<Self> {
        let invalid = |reason: &str| OrgboxError::VersionParse {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version string"));
        }

        let mut parts = [0u32; 4];
        let mut count = 0;
        for piece in trimmed.split('.') {
            if count == 4 {
                return Err(invalid("more than four version parts"));
            }
            parts[count] = piece
                .parse()
                .map_err(|_| invalid("version parts must be numeric"))?;
            count += 1;
        }

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            build: parts[3],
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 || self.build != 0 {
            write!(f, ".{}", self.patch)?;
        }
        if self.build != 0 {
            write!(f, ".{}", self.build)?;
        }
        Ok(())
    }
}

/// An installed package version observation: the remote's opaque version id
/// (an `04t` subscriber package version id) paired with its parsed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Opaque remote version identifier
    pub id: String,
    /// Parsed version number
    pub version: PackageVersion,
}

impl VersionRecord {
    pub fn new(id: impl Into<String>, version: PackageVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

/// Decide whether a list of installed version records satisfies a requirement.
///
/// - No records: not satisfied.
/// - No required version: any record satisfies (presence check).
/// - Exactly one record: satisfied iff its version is at least the
///   requirement.
/// - Multiple records under one key (for example several versions of one
///   namespace observed in a session): treated as "present, version unknown"
///   and reported satisfied. This is a deliberate coarsening carried over from
///   the original tool; callers rely on the conservative answer.
pub fn version_satisfied(installed: &[VersionRecord], required: Option<&PackageVersion>) -> bool {
    match (installed, required) {
        ([], _) => false,
        (_, None) => true,
        ([only], Some(required)) => only.version >= *required,
        _ => true,
    }
}
