// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-layer mutable model.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;

use crate::catalog::{Catalog, DomainVersion};
use crate::error::LayerError;
use crate::version::FormatVersion;

use super::annotation::{Annotation, AnnotationPatch};
use super::controls::{Filters, SelectionBehavior, SortOrder};
use super::gradient::Gradient;
use super::key::TechniqueKey;
use super::presentation::Presentation;

/// Counts of entries removed by [`LayerState::retain_known`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StaleReport {
    /// Annotations whose pair is absent from the catalog.
    pub annotations: usize,
    /// Selected pairs absent from the catalog.
    pub selection: usize,
    /// Whether the highlighted pair was absent from the catalog.
    pub highlight: bool,
}

impl StaleReport {
    /// Returns whether nothing was dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The model behind one open layer.
///
/// Each layer exclusively owns its annotation map; cloning a layer deep-copies
/// it. Mutators that introduce a [`TechniqueKey`] check it against a
/// [`Catalog`] passed by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerState {
    name: String,
    description: String,
    domain: DomainVersion,
    format_version: FormatVersion,

    annotations: BTreeMap<TechniqueKey, Annotation>,
    selection: BTreeSet<TechniqueKey>,
    highlighted: Option<TechniqueKey>,

    filters: Filters,
    sort: SortOrder,
    gradient: Gradient,
    selection_behavior: SelectionBehavior,

    presentation: Presentation,
}

impl LayerState {
    /// Creates a blank layer targeting `domain` at the current format
    /// version.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: DomainVersion) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            domain,
            format_version: FormatVersion::CURRENT,
            annotations: BTreeMap::new(),
            selection: BTreeSet::new(),
            highlighted: None,
            filters: Filters::default(),
            sort: SortOrder::default(),
            gradient: Gradient::default(),
            selection_behavior: SelectionBehavior::default(),
            presentation: Presentation::default(),
        }
    }

    // -- Identity --

    /// Returns the layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the layer name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Returns the targeted domain and framework version.
    #[must_use]
    pub fn domain(&self) -> &DomainVersion {
        &self.domain
    }

    /// Returns the layer schema version.
    #[must_use]
    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    /// Sets the layer schema version.
    pub fn set_format_version(&mut self, version: FormatVersion) {
        self.format_version = version;
    }

    // -- Annotations --

    /// Returns all annotations in key order.
    #[must_use]
    pub fn annotations(&self) -> &BTreeMap<TechniqueKey, Annotation> {
        &self.annotations
    }

    /// Returns the annotation of `key`, if one exists.
    #[must_use]
    pub fn annotation(&self, key: &TechniqueKey) -> Option<&Annotation> {
        self.annotations.get(key)
    }

    /// Returns whether `key` is enabled. Cells without an annotation are.
    #[must_use]
    pub fn is_enabled(&self, key: &TechniqueKey) -> bool {
        self.annotations.get(key).is_none_or(|a| a.enabled)
    }

    /// Merges `patch` into the annotation of `key`, creating a default one if
    /// absent.
    ///
    /// Fails with [`LayerError::InvalidReference`] if `key` is not in the
    /// catalog, or [`LayerError::ValidationFailure`] for a non-finite score.
    /// On failure the layer is unchanged.
    pub fn set_annotation(
        &mut self,
        catalog: &dyn Catalog,
        key: &TechniqueKey,
        patch: &AnnotationPatch,
    ) -> Result<(), LayerError> {
        self.check_key(catalog, key)?;
        if let Some(score) = patch.non_finite_score() {
            return Err(LayerError::invalid(alloc::format!(
                "score {score} for {key} is not a finite number"
            )));
        }
        self.annotations.entry(key.clone()).or_default().apply(patch);
        Ok(())
    }

    /// Applies `patch` to every selected cell. Returns the number of cells
    /// updated.
    pub fn annotate_selected(
        &mut self,
        catalog: &dyn Catalog,
        patch: &AnnotationPatch,
    ) -> Result<usize, LayerError> {
        let keys: alloc::vec::Vec<_> = self.selection.iter().cloned().collect();
        // Validate everything up front so a failure leaves no partial edit.
        for key in &keys {
            self.check_key(catalog, key)?;
        }
        if let Some(score) = patch.non_finite_score() {
            return Err(LayerError::invalid(alloc::format!(
                "score {score} is not a finite number"
            )));
        }
        for key in &keys {
            self.annotations.entry(key.clone()).or_default().apply(patch);
        }
        Ok(keys.len())
    }

    /// Stores `annotation` for `key` without consulting a catalog.
    ///
    /// Used when building layers from trusted or bulk sources; follow with
    /// [`retain_known`](Self::retain_known) to enforce catalog membership.
    pub fn insert_annotation(&mut self, key: TechniqueKey, annotation: Annotation) {
        self.annotations.insert(key, annotation);
    }

    /// Removes the annotation of `key`.
    pub fn clear_annotation(&mut self, key: &TechniqueKey) -> Option<Annotation> {
        self.annotations.remove(key)
    }

    // -- Selection --

    /// Returns the selected pairs.
    #[must_use]
    pub fn selection(&self) -> &BTreeSet<TechniqueKey> {
        &self.selection
    }

    /// Returns the number of selected pairs.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Returns whether `key` is selected.
    #[must_use]
    pub fn is_selected(&self, key: &TechniqueKey) -> bool {
        self.selection.contains(key)
    }

    /// Adds `key` to the selection. Returns whether it was newly added.
    pub fn select(&mut self, catalog: &dyn Catalog, key: &TechniqueKey) -> Result<bool, LayerError> {
        self.check_key(catalog, key)?;
        Ok(self.selection.insert(key.clone()))
    }

    /// Removes `key` from the selection. Returns whether it was present.
    pub fn unselect(&mut self, key: &TechniqueKey) -> bool {
        self.selection.remove(key)
    }

    /// Empties the selection. Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let had_any = !self.selection.is_empty();
        self.selection.clear();
        had_any
    }

    // -- Highlight --

    /// Returns the highlighted pair.
    #[must_use]
    pub fn highlighted(&self) -> Option<&TechniqueKey> {
        self.highlighted.as_ref()
    }

    /// Replaces the highlighted pair.
    pub fn highlight(&mut self, catalog: &dyn Catalog, key: &TechniqueKey) -> Result<(), LayerError> {
        self.check_key(catalog, key)?;
        self.highlighted = Some(key.clone());
        Ok(())
    }

    /// Clears the highlight. Returns whether a pair was highlighted.
    pub fn clear_highlight(&mut self) -> bool {
        self.highlighted.take().is_some()
    }

    // -- Controls --

    /// Returns the filter configuration.
    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Replaces the filter configuration after validating it.
    pub fn set_filters(&mut self, filters: Filters) -> Result<(), LayerError> {
        filters.validate()?;
        self.filters = filters;
        Ok(())
    }

    /// Sets the "hide disabled" filter.
    pub fn set_hide_disabled(&mut self, hide: bool) {
        self.filters.hide_disabled = hide;
    }

    /// Returns the sort order.
    #[must_use]
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Sets the sort order.
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Returns the score gradient.
    #[must_use]
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    /// Replaces the score gradient.
    ///
    /// [`Gradient`] constructors already enforce its invariants, so this
    /// cannot fail.
    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.gradient = gradient;
    }

    /// Returns the selection widening configuration.
    #[must_use]
    pub fn selection_behavior(&self) -> SelectionBehavior {
        self.selection_behavior
    }

    /// Sets the selection widening configuration.
    pub fn set_selection_behavior(&mut self, behavior: SelectionBehavior) {
        self.selection_behavior = behavior;
    }

    /// Returns the presentation data.
    #[must_use]
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Returns the presentation data for editing.
    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    // -- Catalog reconciliation --

    /// Drops every annotation, selected pair, and highlight that the catalog
    /// does not contain.
    pub fn retain_known(&mut self, catalog: &dyn Catalog) -> StaleReport {
        let domain = &self.domain;
        let before = self.annotations.len();
        self.annotations.retain(|key, _| catalog.contains(domain, key));
        let annotations = before - self.annotations.len();

        let before = self.selection.len();
        self.selection.retain(|key| catalog.contains(domain, key));
        let selection = before - self.selection.len();

        let highlight = self
            .highlighted
            .as_ref()
            .is_some_and(|key| !catalog.contains(domain, key));
        if highlight {
            self.highlighted = None;
        }

        StaleReport {
            annotations,
            selection,
            highlight,
        }
    }

    /// Checks the layer's configuration invariants.
    pub fn validate(&self) -> Result<(), LayerError> {
        self.filters.validate()?;
        if self
            .annotations
            .values()
            .any(|a| a.score.is_some_and(|s| !s.is_finite()))
        {
            return Err(LayerError::invalid("annotation scores must be finite"));
        }
        Ok(())
    }

    fn check_key(&self, catalog: &dyn Catalog, key: &TechniqueKey) -> Result<(), LayerError> {
        if catalog.contains(&self.domain, key) {
            Ok(())
        } else {
            Err(LayerError::InvalidReference {
                technique: key.technique.clone(),
                tactic: key.tactic.clone(),
            })
        }
    }
}
