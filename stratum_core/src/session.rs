// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interactive session over one layer.
//!
//! A [`LayerSession`] bundles a [`LayerState`] with the catalog it refers to,
//! a [`SessionConfig`], and an [`Observers`] registry. It implements the
//! gesture semantics of the matrix: technique clicks, tactic clicks,
//! sub-technique expansion, and hover highlight. Every change it makes is
//! published as a [`LayerEvent`].
//!
//! Sessions share nothing with each other; any number may coexist.

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::catalog::{Catalog, DomainVersion};
use crate::config::SessionConfig;
use crate::error::LayerError;
use crate::events::{LayerEvent, LayerObserver, ObserverId, Observers};
use crate::layer::{AnnotationPatch, LayerState, StaleReport, TechniqueKey};
use crate::view::{self, TechniqueRow};

/// One open layer together with its catalog, configuration, and observers.
pub struct LayerSession {
    catalog: Arc<dyn Catalog>,
    config: SessionConfig,
    layer: LayerState,
    observers: Observers,
}

impl core::fmt::Debug for LayerSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayerSession")
            .field("config", &self.config)
            .field("layer", &self.layer.name())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl LayerSession {
    /// Opens a session over an existing layer.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, layer: LayerState, config: SessionConfig) -> Self {
        Self {
            catalog,
            config,
            layer,
            observers: Observers::new(),
        }
    }

    /// Opens a session over a new, empty layer.
    #[must_use]
    pub fn blank(
        catalog: Arc<dyn Catalog>,
        name: impl Into<alloc::string::String>,
        domain: DomainVersion,
        config: SessionConfig,
    ) -> Self {
        Self::new(catalog, LayerState::new(name, domain), config)
    }

    /// Returns the layer.
    #[must_use]
    pub fn layer(&self) -> &LayerState {
        &self.layer
    }

    /// Returns the layer for direct editing. Changes made this way are not
    /// published.
    pub fn layer_mut(&mut self) -> &mut LayerState {
        &mut self.layer
    }

    /// Closes the session and returns its layer.
    #[must_use]
    pub fn into_layer(self) -> LayerState {
        self.layer
    }

    /// Returns the catalog handle.
    #[must_use]
    pub fn catalog(&self) -> &dyn Catalog {
        &*self.catalog
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Registers an observer.
    pub fn subscribe(&mut self, observer: alloc::boxed::Box<dyn LayerObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<alloc::boxed::Box<dyn LayerObserver>> {
        self.observers.unsubscribe(id)
    }

    /// Returns the live rows of `tactic_id`.
    #[must_use]
    pub fn visible(&self, tactic_id: &str) -> Vec<TechniqueRow> {
        view::apply_controls(&self.layer, &*self.catalog, tactic_id)
    }

    /// Drops references the catalog no longer knows about.
    pub fn retain_known(&mut self) -> StaleReport {
        let before_selected = self.layer.selected_count();
        let before_highlight = self.layer.highlighted().cloned();
        let report = self.layer.retain_known(&*self.catalog);
        self.publish_selection(before_selected != self.layer.selected_count());
        if before_highlight.as_ref() != self.layer.highlighted() {
            self.observers
                .notify(&LayerEvent::HighlightChanged { highlighted: None });
        }
        report
    }

    // -- Technique clicks --

    /// Applies a click on the cell `key`.
    ///
    /// With `extend` (modifier held) the clicked cell is toggled. Without it:
    ///
    /// - when cells outside the clicked cell's group are selected, the
    ///   selection is replaced by the clicked group;
    /// - otherwise, if the clicked cell is selected it is cleared, else the
    ///   selection becomes the clicked group.
    ///
    /// The group is the clicked cell widened by the layer's
    /// [`SelectionBehavior`](crate::layer::SelectionBehavior).
    ///
    /// A no-op when selection is disabled in the session config.
    pub fn click_technique(&mut self, key: &TechniqueKey, extend: bool) -> Result<(), LayerError> {
        if !self.config.selecting_techniques {
            return Ok(());
        }
        self.check_key(key)?;
        let group = self.selection_group(key);
        let before = self.layer.selection().clone();

        if extend {
            if self.layer.is_selected(key) {
                self.unselect_all(&group);
            } else {
                self.select_all(&group)?;
            }
        } else if before.iter().any(|selected| !group.contains(selected)) {
            // Several groups selected: focus the clicked one.
            self.layer.clear_selection();
            self.select_all(&group)?;
        } else if self.layer.is_selected(key) {
            // Clicked group is the whole selection: clear it.
            self.layer.clear_selection();
        } else {
            self.layer.clear_selection();
            self.select_all(&group)?;
        }

        self.publish_selection(before != *self.layer.selection());
        Ok(())
    }

    /// Selects `key` and its group without touching the rest of the
    /// selection.
    pub fn select_technique(&mut self, key: &TechniqueKey) -> Result<(), LayerError> {
        if !self.config.selecting_techniques {
            return Ok(());
        }
        self.check_key(key)?;
        let group = self.selection_group(key);
        let before = self.layer.selected_count();
        self.select_all(&group)?;
        self.publish_selection(before != self.layer.selected_count());
        Ok(())
    }

    /// Unselects `key` and its group.
    pub fn unselect_technique(&mut self, key: &TechniqueKey) -> Result<(), LayerError> {
        if !self.config.selecting_techniques {
            return Ok(());
        }
        self.check_key(key)?;
        let group = self.selection_group(key);
        let before = self.layer.selected_count();
        self.unselect_all(&group);
        self.publish_selection(before != self.layer.selected_count());
        Ok(())
    }

    /// Empties the selection.
    pub fn clear_selection(&mut self) {
        if !self.config.selecting_techniques {
            return;
        }
        let changed = self.layer.clear_selection();
        self.publish_selection(changed);
    }

    // -- Tactic clicks --

    /// Returns whether every targeted technique of `tactic_id` is selected.
    ///
    /// The targets are the tactic's techniques, plus their sub-techniques
    /// when `subtechniques_with_parent` is set, restricted to live ones when
    /// `visible_only` is set. A tactic with no targets is never selected.
    #[must_use]
    pub fn is_tactic_selected(&self, tactic_id: &str) -> bool {
        let targets = self.tactic_targets(tactic_id);
        !targets.is_empty() && targets.iter().all(|key| self.layer.is_selected(key))
    }

    /// Applies a click on the header of `tactic_id`: unselects its targets if
    /// they are all selected, otherwise selects them all.
    pub fn click_tactic(&mut self, tactic_id: &str) -> Result<(), LayerError> {
        if !self.config.selecting_techniques {
            return Ok(());
        }
        if !self
            .catalog
            .tactics(self.layer.domain())
            .iter()
            .any(|tactic| tactic.id == tactic_id)
        {
            return Err(LayerError::invalid(format!(
                "tactic `{tactic_id}` does not exist in {}",
                self.layer.domain()
            )));
        }

        let targets = self.tactic_targets(tactic_id);
        let all_selected = !targets.is_empty() && targets.iter().all(|key| self.layer.is_selected(key));
        let before = self.layer.selection().clone();
        for key in &targets {
            let group = self.selection_group(key);
            if all_selected {
                self.unselect_all(&group);
            } else {
                self.select_all(&group)?;
            }
        }
        self.publish_selection(before != *self.layer.selection());
        Ok(())
    }

    // -- Expansion, highlight, annotations --

    /// Flips the sub-technique expansion of `key`.
    ///
    /// Returns `Ok(false)` without changing anything when the technique has
    /// no sub-techniques.
    pub fn toggle_subtechniques(&mut self, key: &TechniqueKey) -> Result<bool, LayerError> {
        let Some(technique) = self.catalog.lookup(self.layer.domain(), key) else {
            return Err(Self::invalid_reference(key));
        };
        if technique.subtechniques.is_empty() {
            return Ok(false);
        }
        let shown = self
            .layer
            .annotation(key)
            .is_some_and(|a| a.show_subtechniques);
        self.set_annotation(key, &AnnotationPatch::new().show_subtechniques(!shown))?;
        Ok(true)
    }

    /// Highlights `key`. A no-op when highlighting is disabled.
    pub fn highlight(&mut self, key: &TechniqueKey) -> Result<(), LayerError> {
        if !self.config.highlighting {
            return Ok(());
        }
        if self.layer.highlighted() == Some(key) {
            return Ok(());
        }
        self.layer.highlight(&*self.catalog, key)?;
        self.observers.notify(&LayerEvent::HighlightChanged {
            highlighted: Some(key.clone()),
        });
        Ok(())
    }

    /// Clears the highlight.
    pub fn clear_highlight(&mut self) {
        if self.layer.clear_highlight() {
            self.observers
                .notify(&LayerEvent::HighlightChanged { highlighted: None });
        }
    }

    /// Merges `patch` into the annotation of `key`.
    pub fn set_annotation(&mut self, key: &TechniqueKey, patch: &AnnotationPatch) -> Result<(), LayerError> {
        self.layer.set_annotation(&*self.catalog, key, patch)?;
        self.observers
            .notify(&LayerEvent::AnnotationChanged { key: key.clone() });
        Ok(())
    }

    /// Applies `patch` to every selected cell and returns how many changed.
    pub fn annotate_selected(&mut self, patch: &AnnotationPatch) -> Result<usize, LayerError> {
        let updated = self.layer.annotate_selected(&*self.catalog, patch)?;
        let keys: Vec<_> = self.layer.selection().iter().cloned().collect();
        for key in keys {
            self.observers.notify(&LayerEvent::AnnotationChanged { key });
        }
        Ok(updated)
    }

    // -- Internals --

    /// The cells a gesture on `key` acts on.
    fn selection_group(&self, key: &TechniqueKey) -> BTreeSet<TechniqueKey> {
        let domain = self.layer.domain();
        let behavior = self.layer.selection_behavior();

        let mut techniques = alloc::vec![key.technique.clone()];
        if behavior.subtechniques_with_parent
            && let Some(technique) = self.catalog.lookup(domain, key)
        {
            match technique.parent {
                Some(parent) => {
                    techniques.extend(
                        self.catalog
                            .subtechniques(domain, &parent)
                            .into_iter()
                            .map(|sibling| sibling.id),
                    );
                    techniques.push(parent);
                }
                None => techniques.extend(technique.subtechniques),
            }
        }

        let tactics = if behavior.across_tactics {
            self.catalog.tactics_of(domain, &key.technique)
        } else {
            alloc::vec![key.tactic.clone()]
        };

        let mut group = BTreeSet::new();
        group.insert(key.clone());
        for technique in &techniques {
            for tactic in &tactics {
                let candidate = TechniqueKey::new(&**technique, &**tactic);
                if self.catalog.contains(domain, &candidate) {
                    group.insert(candidate);
                }
            }
        }
        group
    }

    fn tactic_targets(&self, tactic_id: &str) -> Vec<TechniqueKey> {
        let domain = self.layer.domain();
        let behavior = self.layer.selection_behavior();
        let mut targets = Vec::new();
        if behavior.visible_only {
            for row in view::apply_controls(&self.layer, &*self.catalog, tactic_id) {
                if behavior.subtechniques_with_parent {
                    targets.extend(
                        row.subtechniques
                            .iter()
                            .map(|sub| TechniqueKey::new(&*sub.id, tactic_id)),
                    );
                }
                targets.push(row.key);
            }
        } else {
            for technique in self.catalog.techniques(domain, tactic_id) {
                targets.push(TechniqueKey::new(&*technique.id, tactic_id));
                if behavior.subtechniques_with_parent {
                    targets.extend(
                        technique
                            .subtechniques
                            .iter()
                            .map(|sub| TechniqueKey::new(&**sub, tactic_id)),
                    );
                }
            }
        }
        targets
    }

    fn select_all(&mut self, keys: &BTreeSet<TechniqueKey>) -> Result<(), LayerError> {
        for key in keys {
            self.layer.select(&*self.catalog, key)?;
        }
        Ok(())
    }

    fn unselect_all(&mut self, keys: &BTreeSet<TechniqueKey>) {
        for key in keys {
            self.layer.unselect(key);
        }
    }

    fn publish_selection(&mut self, changed: bool) {
        if changed {
            self.observers.notify(&LayerEvent::SelectionChanged {
                selected: self.layer.selected_count(),
            });
        }
    }

    fn check_key(&self, key: &TechniqueKey) -> Result<(), LayerError> {
        if self.catalog.contains(self.layer.domain(), key) {
            Ok(())
        } else {
            Err(Self::invalid_reference(key))
        }
    }

    fn invalid_reference(key: &TechniqueKey) -> LayerError {
        LayerError::InvalidReference {
            technique: key.technique.clone(),
            tactic: key.tactic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::catalog::tests::{sample_catalog, sample_domain};
    use crate::events::tests::Recorder;
    use crate::layer::{Filters, SelectionBehavior};

    fn session(config: SessionConfig) -> (LayerSession, Rc<RefCell<Vec<LayerEvent>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut session = LayerSession::blank(Arc::new(sample_catalog()), "session", sample_domain(), config);
        session.subscribe(Box::new(Recorder(Rc::clone(&log))));
        (session, log)
    }

    fn key(technique: &str, tactic: &str) -> TechniqueKey {
        TechniqueKey::new(technique, tactic)
    }

    fn selected(session: &LayerSession) -> Vec<String> {
        session
            .layer()
            .selection()
            .iter()
            .map(|k| alloc::format!("{k}"))
            .collect()
    }

    #[test]
    fn plain_click_toggles_a_sole_selection() {
        let (mut session, log) = session(SessionConfig::standard());
        let k = key("T1106", "execution");

        session.click_technique(&k, false).unwrap();
        assert_eq!(selected(&session), vec!["T1106^execution"]);
        session.click_technique(&k, false).unwrap();
        assert!(session.layer().selection().is_empty());

        assert_eq!(
            *log.borrow(),
            vec![
                LayerEvent::SelectionChanged { selected: 1 },
                LayerEvent::SelectionChanged { selected: 0 },
            ]
        );
    }

    #[test]
    fn click_selects_across_tactics_and_toggles_back() {
        let (mut session, _) = session(SessionConfig::standard());
        let k = key("T1053", "execution");

        session.click_technique(&k, false).unwrap();
        assert_eq!(selected(&session), vec!["T1053^execution", "T1053^persistence"]);
        session.click_technique(&k, false).unwrap();
        assert!(session.layer().selection().is_empty());
    }

    #[test]
    fn extend_click_toggles_without_clearing() {
        let (mut session, _) = session(SessionConfig::standard());
        let a = key("T1059", "execution");
        let b = key("T1106", "execution");

        session.click_technique(&a, false).unwrap();
        session.click_technique(&b, true).unwrap();
        assert_eq!(selected(&session), vec!["T1059^execution", "T1106^execution"]);
        session.click_technique(&a, true).unwrap();
        assert_eq!(selected(&session), vec!["T1106^execution"]);
    }

    #[test]
    fn plain_click_with_many_selected_focuses_the_clicked_cell() {
        let (mut session, _) = session(SessionConfig::standard());
        let a = key("T1059", "execution");
        let b = key("T1106", "execution");

        session.click_technique(&a, false).unwrap();
        session.click_technique(&b, true).unwrap();
        session.click_technique(&a, false).unwrap();
        assert_eq!(selected(&session), vec!["T1059^execution"]);

        session.click_technique(&b, true).unwrap();
        session.click_technique(&key("T1547", "persistence"), false).unwrap();
        assert_eq!(selected(&session), vec!["T1547^persistence"]);
    }

    #[test]
    fn subtechnique_click_selects_parent_and_siblings() {
        let (mut session, _) = session(SessionConfig::standard());
        session.layer_mut().set_selection_behavior(SelectionBehavior {
            across_tactics: false,
            subtechniques_with_parent: true,
            visible_only: false,
        });
        session
            .click_technique(&key("T1059.001", "execution"), false)
            .unwrap();
        assert_eq!(
            selected(&session),
            vec!["T1059^execution", "T1059.001^execution", "T1059.003^execution"]
        );
    }

    #[test]
    fn plain_click_on_a_widened_group_toggles_it_off() {
        let (mut session, log) = session(SessionConfig::standard());
        session.layer_mut().set_selection_behavior(SelectionBehavior {
            across_tactics: false,
            subtechniques_with_parent: true,
            visible_only: false,
        });
        let parent = key("T1059", "execution");

        session.click_technique(&parent, false).unwrap();
        assert_eq!(selected(&session).len(), 3);
        // The whole selection is the clicked group, so a second click clears it.
        session.click_technique(&parent, false).unwrap();
        assert!(session.layer().selection().is_empty());

        // A sibling outside the group refocuses instead of clearing.
        session.click_technique(&parent, false).unwrap();
        session.click_technique(&key("T1106", "execution"), true).unwrap();
        session.click_technique(&parent, false).unwrap();
        assert_eq!(
            selected(&session),
            vec!["T1059^execution", "T1059.001^execution", "T1059.003^execution"]
        );
        assert_eq!(log.borrow().len(), 5);
    }

    #[test]
    fn tactic_click_selects_then_unselects_everything() {
        let (mut session, _) = session(SessionConfig::standard());
        session.click_tactic("persistence").unwrap();
        assert!(session.is_tactic_selected("persistence"));
        assert_eq!(
            selected(&session),
            vec!["T1053^execution", "T1053^persistence", "T1547^persistence"]
        );
        assert!(!session.is_tactic_selected("execution"));

        session.click_tactic("persistence").unwrap();
        assert!(session.layer().selection().is_empty());
    }

    #[test]
    fn tactic_click_leaves_subtechniques_alone_by_default() {
        let (mut session, _) = session(SessionConfig::standard());
        session.layer_mut().set_selection_behavior(SelectionBehavior {
            across_tactics: false,
            subtechniques_with_parent: false,
            visible_only: false,
        });

        session.click_tactic("execution").unwrap();
        assert_eq!(
            selected(&session),
            vec!["T1053^execution", "T1059^execution", "T1106^execution"]
        );
        // Parents alone make the tactic selected.
        assert!(session.is_tactic_selected("execution"));
    }

    #[test]
    fn tactic_click_widens_to_subtechniques_with_parent() {
        let (mut session, _) = session(SessionConfig::standard());
        session.layer_mut().set_selection_behavior(SelectionBehavior {
            across_tactics: false,
            subtechniques_with_parent: true,
            visible_only: false,
        });

        session.click_tactic("execution").unwrap();
        assert_eq!(
            selected(&session),
            vec![
                "T1053^execution",
                "T1053.005^execution",
                "T1059^execution",
                "T1059.001^execution",
                "T1059.003^execution",
                "T1106^execution",
            ]
        );
        assert!(session.is_tactic_selected("execution"));

        session.unselect_technique(&key("T1059.003", "execution")).unwrap();
        assert!(!session.is_tactic_selected("execution"));
    }

    #[test]
    fn tactic_click_respects_visible_only() {
        let (mut session, _) = session(SessionConfig::standard());
        let mut filters = Filters::default();
        filters.platforms.insert(String::from("Linux"));
        session.layer_mut().set_filters(filters).unwrap();
        session.layer_mut().set_selection_behavior(SelectionBehavior {
            across_tactics: false,
            subtechniques_with_parent: false,
            visible_only: true,
        });

        session.click_tactic("persistence").unwrap();
        assert_eq!(selected(&session), vec!["T1053^persistence"]);
        assert!(session.is_tactic_selected("persistence"));
    }

    #[test]
    fn unknown_tactic_is_rejected() {
        let (mut session, _) = session(SessionConfig::standard());
        assert!(matches!(
            session.click_tactic("impact"),
            Err(LayerError::ValidationFailure(_))
        ));
    }

    #[test]
    fn toggle_subtechniques_ignores_leaf_techniques() {
        let (mut session, log) = session(SessionConfig::standard());
        assert!(!session.toggle_subtechniques(&key("T1106", "execution")).unwrap());
        assert!(session.layer().annotations().is_empty());
        assert!(log.borrow().is_empty());

        let parent = key("T1059", "execution");
        assert!(session.toggle_subtechniques(&parent).unwrap());
        assert!(session.layer().annotation(&parent).unwrap().show_subtechniques);
        assert!(session.toggle_subtechniques(&parent).unwrap());
        assert!(!session.layer().annotation(&parent).unwrap().show_subtechniques);
    }

    #[test]
    fn read_only_sessions_ignore_clicks_but_highlight() {
        let (mut session, log) = session(SessionConfig::read_only());
        let k = key("T1106", "execution");
        session.click_technique(&k, false).unwrap();
        session.click_tactic("execution").unwrap();
        assert!(session.layer().selection().is_empty());

        session.highlight(&k).unwrap();
        session.highlight(&k).unwrap();
        session.clear_highlight();
        assert_eq!(
            *log.borrow(),
            vec![
                LayerEvent::HighlightChanged {
                    highlighted: Some(k.clone())
                },
                LayerEvent::HighlightChanged { highlighted: None },
            ]
        );
    }

    #[test]
    fn clicks_on_unknown_cells_fail() {
        let (mut session, log) = session(SessionConfig::standard());
        let err = session
            .click_technique(&key("T1547", "execution"), false)
            .unwrap_err();
        assert!(matches!(err, LayerError::InvalidReference { .. }));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn annotate_selected_publishes_each_cell() {
        let (mut session, log) = session(SessionConfig::standard());
        session.click_technique(&key("T1053", "execution"), false).unwrap();
        log.borrow_mut().clear();

        let updated = session
            .annotate_selected(&AnnotationPatch::new().score(2.0))
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(log.borrow().len(), 2);
    }
}
