// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filter, sort, and selection-widening configuration.

use alloc::collections::BTreeSet;
use alloc::string::String;

use crate::catalog::Technique;
use crate::error::LayerError;

/// Predicates deciding which techniques are live under a tactic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    /// Platform allow-set. Empty retains every technique.
    pub platforms: BTreeSet<String>,
    /// Stage allow-set. Empty retains every technique; techniques without
    /// stage tags always pass.
    pub stages: BTreeSet<String>,
    /// Hide techniques whose annotation is disabled.
    pub hide_disabled: bool,
}

impl Filters {
    /// Returns whether `technique` passes the platform and stage predicates.
    ///
    /// The disabled predicate depends on the annotation and is applied by
    /// [`view`](crate::view).
    #[must_use]
    pub fn admits(&self, technique: &Technique) -> bool {
        let platforms_ok = self.platforms.is_empty()
            || technique.platforms.iter().any(|p| self.platforms.contains(p));
        let stages_ok = self.stages.is_empty()
            || technique.stages.is_empty()
            || technique.stages.iter().any(|s| self.stages.contains(s));
        platforms_ok && stages_ok
    }

    /// Rejects blank platform or stage names.
    pub fn validate(&self) -> Result<(), LayerError> {
        if self.platforms.iter().chain(&self.stages).any(|name| name.trim().is_empty()) {
            return Err(LayerError::invalid("filter values must not be blank"));
        }
        Ok(())
    }
}

/// Technique ordering within a tactic.
///
/// Every order breaks ties alphabetically by technique name (codepoint
/// order), then by id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Catalog order.
    #[default]
    None,
    /// By name, A to Z.
    NameAscending,
    /// By name, Z to A.
    NameDescending,
    /// By effective score, lowest first; unscored last.
    ScoreAscending,
    /// By effective score, highest first; unscored last.
    ScoreDescending,
}

/// How a selection gesture widens beyond the clicked cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SelectionBehavior {
    /// Selecting a technique selects it under every tactic it appears in.
    pub across_tactics: bool,
    /// Selecting a technique selects its sub-techniques; selecting a
    /// sub-technique selects its parent and siblings.
    pub subtechniques_with_parent: bool,
    /// A tactic click only affects techniques that pass the filters.
    pub visible_only: bool,
}

impl Default for SelectionBehavior {
    fn default() -> Self {
        Self {
            across_tactics: true,
            subtechniques_with_parent: false,
            visible_only: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_admit_everything() {
        let technique = Technique::new("T1", "One").on_platforms(["Windows"]);
        assert!(Filters::default().admits(&technique));
    }

    #[test]
    fn platform_filter_requires_intersection() {
        let mut filters = Filters::default();
        filters.platforms.insert(String::from("Linux"));
        assert!(!filters.admits(&Technique::new("T1", "One").on_platforms(["Windows"])));
        assert!(filters.admits(&Technique::new("T2", "Two").on_platforms(["Windows", "Linux"])));
    }

    #[test]
    fn stage_filter_skips_untagged() {
        let mut filters = Filters::default();
        filters.stages.insert(String::from("act"));
        assert!(filters.admits(&Technique::new("T1", "One")));
        assert!(!filters.admits(&Technique::new("T2", "Two").in_stages(["prepare"])));
    }

    #[test]
    fn blank_values_fail_validation() {
        let mut filters = Filters::default();
        filters.platforms.insert(String::from("  "));
        assert!(filters.validate().is_err());
    }
}
