// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Read-only technique catalog.
//!
//! The catalog is an external collaborator: it supplies the immutable
//! tactic → technique → sub-technique graph for a framework domain. Layers
//! refer to catalog entries by string id only, so reloading a catalog never
//! invalidates a [`LayerState`](crate::layer::LayerState); ids that vanished
//! are dropped by [`retain_known`](crate::layer::LayerState::retain_known).
//!
//! [`MatrixCatalog`] is a small in-memory implementation for embedding and
//! tests.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::layer::TechniqueKey;

/// A framework domain at a specific content version, e.g.
/// (`enterprise-attack`, `13`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainVersion {
    /// Domain identifier.
    pub domain: String,
    /// Framework content version.
    pub version: String,
}

impl DomainVersion {
    /// Creates a domain/version pair.
    #[must_use]
    pub fn new(domain: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for DomainVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.domain, self.version)
    }
}

/// A tactic column of the matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tactic {
    /// Short identifier used by layer files (e.g. `persistence`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Technique ids in catalog order.
    pub techniques: Vec<String>,
}

/// A technique or sub-technique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Technique {
    /// Identifier (e.g. `T1059` or `T1059.001`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ids of the tactics this technique appears under.
    pub tactics: Vec<String>,
    /// Sub-technique ids in catalog order. Empty for sub-techniques.
    pub subtechniques: Vec<String>,
    /// Parent technique id, for sub-techniques.
    pub parent: Option<String>,
    /// Platform tags.
    pub platforms: Vec<String>,
    /// Stage tags. Most catalogs leave this empty.
    pub stages: Vec<String>,
}

impl Technique {
    /// Creates a technique with no tactics, platforms, or sub-techniques.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds tactic membership.
    #[must_use]
    pub fn in_tactics<I, S>(mut self, tactics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tactics.extend(tactics.into_iter().map(Into::into));
        self
    }

    /// Adds platform tags.
    #[must_use]
    pub fn on_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms.extend(platforms.into_iter().map(Into::into));
        self
    }

    /// Adds stage tags.
    #[must_use]
    pub fn in_stages<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.extend(stages.into_iter().map(Into::into));
        self
    }

    /// Returns whether this entry is a sub-technique.
    #[must_use]
    pub fn is_subtechnique(&self) -> bool {
        self.parent.is_some()
    }
}

/// Lookup surface over an immutable technique graph.
///
/// The three required methods mirror the catalog loader's interface. The
/// provided methods are derived from them and may be overridden by
/// implementations with an index.
pub trait Catalog {
    /// Returns the tactics of `domain` in matrix order.
    fn tactics(&self, domain: &DomainVersion) -> Vec<Tactic>;

    /// Returns the techniques under `tactic_id`, in catalog order.
    fn techniques(&self, domain: &DomainVersion, tactic_id: &str) -> Vec<Technique>;

    /// Returns the sub-techniques of `technique_id`, in catalog order.
    fn subtechniques(&self, domain: &DomainVersion, technique_id: &str) -> Vec<Technique>;

    /// Looks up the technique or sub-technique addressed by `key`.
    fn lookup(&self, domain: &DomainVersion, key: &TechniqueKey) -> Option<Technique> {
        for technique in self.techniques(domain, &key.tactic) {
            if technique.id == key.technique {
                return Some(technique);
            }
            if technique.subtechniques.contains(&key.technique) {
                return self
                    .subtechniques(domain, &technique.id)
                    .into_iter()
                    .find(|sub| sub.id == key.technique);
            }
        }
        None
    }

    /// Returns whether `key` names a (technique, tactic) pair of `domain`.
    fn contains(&self, domain: &DomainVersion, key: &TechniqueKey) -> bool {
        self.lookup(domain, key).is_some()
    }

    /// Returns the ids of every tactic under which `technique_id` appears.
    ///
    /// Sub-techniques appear under the tactics of their parent.
    fn tactics_of(&self, domain: &DomainVersion, technique_id: &str) -> Vec<String> {
        self.tactics(domain)
            .into_iter()
            .filter(|tactic| self.contains(domain, &TechniqueKey::new(technique_id, &*tactic.id)))
            .map(|tactic| tactic.id)
            .collect()
    }
}

/// In-memory catalog for a single domain.
///
/// Requests for any other domain return empty results.
#[derive(Clone, Debug)]
pub struct MatrixCatalog {
    domain: DomainVersion,
    tactics: Vec<Tactic>,
    techniques: BTreeMap<String, Technique>,
}

impl MatrixCatalog {
    /// Creates an empty catalog for `domain`.
    #[must_use]
    pub fn new(domain: DomainVersion) -> Self {
        Self {
            domain,
            tactics: Vec::new(),
            techniques: BTreeMap::new(),
        }
    }

    /// Returns the domain this catalog serves.
    #[must_use]
    pub fn domain(&self) -> &DomainVersion {
        &self.domain
    }

    /// Appends a tactic column.
    #[must_use]
    pub fn with_tactic(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.tactics.push(Tactic {
            id: id.into(),
            name: name.into(),
            techniques: Vec::new(),
        });
        self
    }

    /// Adds a top-level technique and appends it to each of its tactics.
    ///
    /// Tactics that have not been added are ignored.
    #[must_use]
    pub fn with_technique(mut self, technique: Technique) -> Self {
        for tactic in &mut self.tactics {
            if technique.tactics.contains(&tactic.id) && !tactic.techniques.contains(&technique.id) {
                tactic.techniques.push(technique.id.clone());
            }
        }
        self.techniques.insert(technique.id.clone(), technique);
        self
    }

    /// Adds a sub-technique beneath `parent`, inheriting its tactics.
    ///
    /// A sub-technique whose parent is unknown is ignored.
    #[must_use]
    pub fn with_subtechnique(mut self, parent: &str, mut sub: Technique) -> Self {
        let Some(parent_entry) = self.techniques.get_mut(parent) else {
            return self;
        };
        if !parent_entry.subtechniques.contains(&sub.id) {
            parent_entry.subtechniques.push(sub.id.clone());
        }
        sub.tactics.clone_from(&parent_entry.tactics);
        sub.parent = Some(String::from(parent));
        self.techniques.insert(sub.id.clone(), sub);
        self
    }

    /// Returns the technique or sub-technique with `id`.
    #[must_use]
    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.techniques.get(id)
    }

    fn serves(&self, domain: &DomainVersion) -> bool {
        self.domain == *domain
    }
}

impl Catalog for MatrixCatalog {
    fn tactics(&self, domain: &DomainVersion) -> Vec<Tactic> {
        if !self.serves(domain) {
            return Vec::new();
        }
        self.tactics.clone()
    }

    fn techniques(&self, domain: &DomainVersion, tactic_id: &str) -> Vec<Technique> {
        if !self.serves(domain) {
            return Vec::new();
        }
        self.tactics
            .iter()
            .find(|tactic| tactic.id == tactic_id)
            .map(|tactic| {
                tactic
                    .techniques
                    .iter()
                    .filter_map(|id| self.techniques.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn subtechniques(&self, domain: &DomainVersion, technique_id: &str) -> Vec<Technique> {
        if !self.serves(domain) {
            return Vec::new();
        }
        self.techniques
            .get(technique_id)
            .map(|technique| {
                technique
                    .subtechniques
                    .iter()
                    .filter_map(|id| self.techniques.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lookup(&self, domain: &DomainVersion, key: &TechniqueKey) -> Option<Technique> {
        if !self.serves(domain) {
            return None;
        }
        let technique = self.techniques.get(&key.technique)?;
        technique.tactics.contains(&key.tactic).then(|| technique.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use alloc::vec;

    use super::*;

    /// A two-tactic catalog shared by tests across the crate.
    ///
    /// - `execution`: T1059 (subs T1059.001, T1059.003), T1106
    /// - `persistence`: T1053 (sub T1053.005), T1547
    /// - T1053 appears under both tactics.
    pub(crate) fn sample_catalog() -> MatrixCatalog {
        MatrixCatalog::new(sample_domain())
            .with_tactic("execution", "Execution")
            .with_tactic("persistence", "Persistence")
            .with_technique(
                Technique::new("T1059", "Command and Scripting Interpreter")
                    .in_tactics(["execution"])
                    .on_platforms(["Windows", "Linux", "macOS"]),
            )
            .with_subtechnique(
                "T1059",
                Technique::new("T1059.001", "PowerShell").on_platforms(["Windows"]),
            )
            .with_subtechnique(
                "T1059",
                Technique::new("T1059.003", "Windows Command Shell").on_platforms(["Windows"]),
            )
            .with_technique(
                Technique::new("T1106", "Native API")
                    .in_tactics(["execution"])
                    .on_platforms(["Windows", "Linux"]),
            )
            .with_technique(
                Technique::new("T1053", "Scheduled Task/Job")
                    .in_tactics(["execution", "persistence"])
                    .on_platforms(["Windows", "Linux"]),
            )
            .with_subtechnique(
                "T1053",
                Technique::new("T1053.005", "Scheduled Task").on_platforms(["Windows"]),
            )
            .with_technique(
                Technique::new("T1547", "Boot or Logon Autostart Execution")
                    .in_tactics(["persistence"])
                    .on_platforms(["Windows", "macOS"]),
            )
    }

    pub(crate) fn sample_domain() -> DomainVersion {
        DomainVersion::new("enterprise-attack", "13")
    }

    #[test]
    fn techniques_follow_tactic_order() {
        let catalog = sample_catalog();
        let ids: Vec<_> = catalog
            .techniques(&sample_domain(), "execution")
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["T1059", "T1106", "T1053"]);
    }

    #[test]
    fn subtechniques_inherit_parent_tactics() {
        let catalog = sample_catalog();
        let sub = catalog.technique("T1053.005").unwrap();
        assert_eq!(sub.parent.as_deref(), Some("T1053"));
        assert_eq!(sub.tactics, vec!["execution", "persistence"]);
        assert!(catalog.contains(&sample_domain(), &TechniqueKey::new("T1053.005", "persistence")));
    }

    #[test]
    fn other_domains_are_empty() {
        let catalog = sample_catalog();
        let mobile = DomainVersion::new("mobile-attack", "13");
        assert!(catalog.tactics(&mobile).is_empty());
        assert!(!catalog.contains(&mobile, &TechniqueKey::new("T1059", "execution")));
    }

    #[test]
    fn provided_lookup_matches_indexed_lookup() {
        struct Unindexed(MatrixCatalog);
        impl Catalog for Unindexed {
            fn tactics(&self, domain: &DomainVersion) -> Vec<Tactic> {
                self.0.tactics(domain)
            }
            fn techniques(&self, domain: &DomainVersion, tactic_id: &str) -> Vec<Technique> {
                self.0.techniques(domain, tactic_id)
            }
            fn subtechniques(&self, domain: &DomainVersion, technique_id: &str) -> Vec<Technique> {
                self.0.subtechniques(domain, technique_id)
            }
        }

        let catalog = Unindexed(sample_catalog());
        let domain = sample_domain();
        assert!(catalog.contains(&domain, &TechniqueKey::new("T1059.001", "execution")));
        assert!(!catalog.contains(&domain, &TechniqueKey::new("T1059.001", "persistence")));
        assert_eq!(catalog.tactics_of(&domain, "T1053"), vec!["execution", "persistence"]);
    }
}
