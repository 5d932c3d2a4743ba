// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer format versions and compatibility classification.
//!
//! A persisted layer carries the schema version it was written with. When a
//! layer is loaded, [`Compatibility::classify`] compares that version with the
//! running engine's version to decide whether the layer can be used as-is,
//! needs an advisory migration, needs a confirmed migration, or must be
//! refused.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

/// A `major.minor[.patch]` layer schema version.
///
/// Ordering is lexicographic over (major, minor, patch). A version parsed
/// without a patch component has `patch == 0` and displays without it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatVersion {
    /// Breaking-change counter.
    pub major: u32,
    /// Additive-change counter.
    pub minor: u32,
    /// Patch counter; ignored by compatibility classification.
    pub patch: u32,
}

impl FormatVersion {
    /// The schema version this engine writes.
    pub const CURRENT: Self = Self::new(4, 5, 0);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `"M"`, `"M.m"`, or `"M.m.p"`.
    ///
    /// Missing components are zero. Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let trimmed = text.trim();
        let mut parts = trimmed.split('.');
        let mut next = |required: bool| -> Result<u32, VersionParseError> {
            match parts.next() {
                Some(part) => part
                    .parse::<u32>()
                    .map_err(|_| VersionParseError(String::from(trimmed))),
                None if required => Err(VersionParseError(String::from(trimmed))),
                None => Ok(0),
            }
        };
        let major = next(true)?;
        let minor = next(false)?;
        let patch = next(false)?;
        if parts.next().is_some() {
            return Err(VersionParseError(String::from(trimmed)));
        }
        Ok(Self::new(major, minor, patch))
    }

    /// Returns this version with the patch component dropped.
    #[must_use]
    pub const fn release(self) -> Self {
        Self::new(self.major, self.minor, 0)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl FromStr for FormatVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

/// A version string that is not `M`, `M.m`, or `M.m.p`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a valid layer format version")]
pub struct VersionParseError(pub String);

/// How a persisted layer relates to the running engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compatibility {
    /// Same major and minor version. Loaded as-is.
    Exact,
    /// Same major, older minor. Migrated after an advisory notice.
    MinorBehind,
    /// Older major. Migrated only after the user confirms.
    MajorBehind,
    /// Newer than the engine. Refused after an advisory notice.
    Ahead,
}

impl Compatibility {
    /// Classifies `persisted` against `running`. Patch components are
    /// ignored.
    #[must_use]
    pub fn classify(persisted: FormatVersion, running: FormatVersion) -> Self {
        use core::cmp::Ordering;

        match persisted.release().cmp(&running.release()) {
            Ordering::Equal => Self::Exact,
            Ordering::Greater => Self::Ahead,
            Ordering::Less if persisted.major < running.major => Self::MajorBehind,
            Ordering::Less => Self::MinorBehind,
        }
    }

    /// Returns whether a migration is required before use.
    #[must_use]
    pub fn needs_migration(self) -> bool {
        matches!(self, Self::MinorBehind | Self::MajorBehind)
    }

    /// Short lowercase label, used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::MinorBehind => "minor-behind",
            Self::MajorBehind => "major-behind",
            Self::Ahead => "ahead",
        }
    }
}
