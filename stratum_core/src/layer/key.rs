// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell identity.

use alloc::string::String;
use core::fmt;

/// A (technique id, tactic id) pair: one cell of the matrix.
///
/// Keys order by technique id first, so all cells of a technique are
/// adjacent in ordered collections.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TechniqueKey {
    /// Technique or sub-technique id.
    pub technique: String,
    /// Tactic id.
    pub tactic: String,
}

impl TechniqueKey {
    /// Creates a key.
    #[must_use]
    pub fn new(technique: impl Into<String>, tactic: impl Into<String>) -> Self {
        Self {
            technique: technique.into(),
            tactic: tactic.into(),
        }
    }
}

impl fmt::Debug for TechniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TechniqueKey({}^{})", self.technique, self.tactic)
    }
}

impl fmt::Display for TechniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.technique, self.tactic)
    }
}
