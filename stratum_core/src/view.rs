// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived view of a layer: filtering, sorting, and score roll-up.
//!
//! Everything here is a pure function of a [`LayerState`] and a [`Catalog`].
//! Nothing is cached; catalogs are small enough that recomputing a tactic on
//! each query is cheap.

use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::catalog::{Catalog, Tactic, Technique};
use crate::layer::{Color, LayerState, SortOrder, TechniqueKey};

/// A live technique under one tactic, with its live sub-techniques.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TechniqueRow {
    /// The (technique, tactic) pair.
    pub key: TechniqueKey,
    /// The catalog entry.
    pub technique: Technique,
    /// Sub-techniques that pass the filters, sorted like their parent.
    pub subtechniques: Vec<Technique>,
}

/// Returns whether `technique` is live under `tactic_id`.
#[must_use]
pub fn is_visible(layer: &LayerState, technique: &Technique, tactic_id: &str) -> bool {
    let filters = layer.filters();
    if filters.hide_disabled && !layer.is_enabled(&TechniqueKey::new(&*technique.id, tactic_id)) {
        return false;
    }
    filters.admits(technique)
}

/// Keeps the techniques that are live under `tactic_id`, in input order.
#[must_use]
pub fn filter_techniques(layer: &LayerState, tactic_id: &str, techniques: Vec<Technique>) -> Vec<Technique> {
    techniques
        .into_iter()
        .filter(|technique| is_visible(layer, technique, tactic_id))
        .collect()
}

/// Sorts `techniques` by the layer's [`SortOrder`]. The sort is stable.
pub fn sort_techniques(
    layer: &LayerState,
    catalog: &dyn Catalog,
    tactic_id: &str,
    techniques: &mut [Technique],
) {
    let by_name = |a: &Technique, b: &Technique| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id));
    match layer.sort() {
        SortOrder::None => {}
        SortOrder::NameAscending => techniques.sort_by(by_name),
        SortOrder::NameDescending => techniques.sort_by(|a, b| by_name(b, a)),
        order @ (SortOrder::ScoreAscending | SortOrder::ScoreDescending) => {
            let descending = order == SortOrder::ScoreDescending;
            // Score once per technique, not once per comparison.
            let mut scored: Vec<(Option<f64>, Technique)> = techniques
                .iter()
                .map(|t| {
                    let key = TechniqueKey::new(&*t.id, tactic_id);
                    (effective_score(layer, catalog, &key), t.clone())
                })
                .collect();
            scored.sort_by(|(sa, a), (sb, b)| {
                let by_score = match (sa, sb) {
                    (Some(x), Some(y)) if descending => y.total_cmp(x),
                    (Some(x), Some(y)) => x.total_cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                by_score.then_with(|| by_name(a, b))
            });
            for (slot, (_, technique)) in techniques.iter_mut().zip(scored) {
                *slot = technique;
            }
        }
    }
}

/// Returns the live techniques of `tactic_id`, filtered and sorted, each with
/// its live sub-techniques.
#[must_use]
pub fn apply_controls(layer: &LayerState, catalog: &dyn Catalog, tactic_id: &str) -> Vec<TechniqueRow> {
    let domain = layer.domain();
    let mut techniques = filter_techniques(layer, tactic_id, catalog.techniques(domain, tactic_id));
    sort_techniques(layer, catalog, tactic_id, &mut techniques);
    techniques
        .into_iter()
        .map(|technique| {
            let mut subtechniques =
                filter_techniques(layer, tactic_id, catalog.subtechniques(domain, &technique.id));
            sort_techniques(layer, catalog, tactic_id, &mut subtechniques);
            TechniqueRow {
                key: TechniqueKey::new(&*technique.id, tactic_id),
                technique,
                subtechniques,
            }
        })
        .collect()
}

/// Returns every tactic of the layer's domain with its live rows.
#[must_use]
pub fn matrix(layer: &LayerState, catalog: &dyn Catalog) -> Vec<(Tactic, Vec<TechniqueRow>)> {
    catalog
        .tactics(layer.domain())
        .into_iter()
        .map(|tactic| {
            let rows = apply_controls(layer, catalog, &tactic.id);
            (tactic, rows)
        })
        .collect()
}

/// Returns the score shown for `key`.
///
/// An explicit score wins. Otherwise a technique with sub-techniques takes
/// the gradient's aggregation over the scores of its sub-techniques under the
/// same tactic; unscored sub-techniques count as zero when the gradient's
/// `count_unscored` is set. Returns `None` when nothing is scored.
#[must_use]
pub fn effective_score(layer: &LayerState, catalog: &dyn Catalog, key: &TechniqueKey) -> Option<f64> {
    if let Some(score) = layer.annotation(key).and_then(|a| a.score) {
        return Some(score);
    }
    let subtechniques = catalog.subtechniques(layer.domain(), &key.technique);
    if subtechniques.is_empty() {
        return None;
    }
    let gradient = layer.gradient();
    let mut any_scored = false;
    let mut scores = Vec::with_capacity(subtechniques.len());
    for sub in &subtechniques {
        let sub_key = TechniqueKey::new(&*sub.id, &*key.tactic);
        match layer.annotation(&sub_key).and_then(|a| a.score) {
            Some(score) => {
                any_scored = true;
                scores.push(score);
            }
            None if gradient.count_unscored() => scores.push(0.0),
            None => {}
        }
    }
    if !any_scored {
        return None;
    }
    gradient.aggregation().apply(&scores)
}

/// Returns the fill color of `key`: the explicit annotation color, else the
/// gradient color of its effective score.
#[must_use]
pub fn cell_color(layer: &LayerState, catalog: &dyn Catalog, key: &TechniqueKey) -> Option<Color> {
    if let Some(color) = layer.annotation(key).and_then(|a| a.color) {
        return Some(color);
    }
    effective_score(layer, catalog, key).map(|score| layer.gradient().color_for(score))
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::*;
    use crate::catalog::tests::{sample_catalog, sample_domain};
    use crate::layer::{Aggregation, AnnotationPatch, Filters, Gradient};

    fn ids(rows: &[TechniqueRow]) -> Vec<&str> {
        rows.iter().map(|r| r.technique.id.as_str()).collect()
    }

    fn score(layer: &mut LayerState, technique: &str, tactic: &str, value: f64) {
        layer
            .set_annotation(
                &sample_catalog(),
                &TechniqueKey::new(technique, tactic),
                &AnnotationPatch::new().score(value),
            )
            .unwrap();
    }

    #[test]
    fn unsorted_keeps_catalog_order() {
        let catalog = sample_catalog();
        let layer = LayerState::new("view", sample_domain());
        let rows = apply_controls(&layer, &catalog, "execution");
        assert_eq!(ids(&rows), vec!["T1059", "T1106", "T1053"]);
        assert_eq!(rows[0].subtechniques.len(), 2);
    }

    #[test]
    fn name_orders() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        layer.set_sort(SortOrder::NameAscending);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1059", "T1106", "T1053"]
        );
        layer.set_sort(SortOrder::NameDescending);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1053", "T1106", "T1059"]
        );
    }

    #[test]
    fn score_orders_put_unscored_last() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        score(&mut layer, "T1106", "execution", 10.0);
        score(&mut layer, "T1053", "execution", 3.0);

        layer.set_sort(SortOrder::ScoreAscending);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1053", "T1106", "T1059"]
        );
        layer.set_sort(SortOrder::ScoreDescending);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1106", "T1053", "T1059"]
        );
    }

    #[test]
    fn equal_scores_break_ties_by_name() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        for id in ["T1059", "T1106", "T1053"] {
            score(&mut layer, id, "execution", 5.0);
        }
        layer.set_sort(SortOrder::ScoreDescending);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1059", "T1106", "T1053"]
        );
    }

    #[test]
    fn platform_filter_applies_to_subtechniques() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        let mut filters = Filters::default();
        filters.platforms.insert(String::from("Linux"));
        layer.set_filters(filters).unwrap();

        let rows = apply_controls(&layer, &catalog, "execution");
        assert_eq!(ids(&rows), vec!["T1059", "T1106", "T1053"]);
        assert!(rows[0].subtechniques.is_empty());

        let rows = apply_controls(&layer, &catalog, "persistence");
        assert_eq!(ids(&rows), vec!["T1053"]);
    }

    #[test]
    fn hide_disabled_is_per_tactic() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        layer
            .set_annotation(
                &catalog,
                &TechniqueKey::new("T1053", "execution"),
                &AnnotationPatch::new().enabled(false),
            )
            .unwrap();
        assert_eq!(apply_controls(&layer, &catalog, "execution").len(), 3);

        layer.set_hide_disabled(true);
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "execution")),
            vec!["T1059", "T1106"]
        );
        assert_eq!(
            ids(&apply_controls(&layer, &catalog, "persistence")),
            vec!["T1053", "T1547"]
        );
    }

    #[test]
    fn parent_score_rolls_up_from_subtechniques() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        let parent = TechniqueKey::new("T1059", "execution");
        assert_eq!(effective_score(&layer, &catalog, &parent), None);

        score(&mut layer, "T1059.001", "execution", 8.0);
        assert_eq!(effective_score(&layer, &catalog, &parent), Some(8.0));

        layer.set_gradient(Gradient::default().with_count_unscored(true));
        assert_eq!(effective_score(&layer, &catalog, &parent), Some(4.0));

        layer.set_gradient(Gradient::default().with_aggregation(Aggregation::Max));
        assert_eq!(effective_score(&layer, &catalog, &parent), Some(8.0));

        score(&mut layer, "T1059", "execution", 1.0);
        assert_eq!(effective_score(&layer, &catalog, &parent), Some(1.0));
    }

    #[test]
    fn explicit_color_wins_over_gradient() {
        let catalog = sample_catalog();
        let mut layer = LayerState::new("view", sample_domain());
        let key = TechniqueKey::new("T1106", "execution");
        assert_eq!(cell_color(&layer, &catalog, &key), None);

        score(&mut layer, "T1106", "execution", 0.0);
        assert_eq!(
            cell_color(&layer, &catalog, &key),
            Some(layer.gradient().colors()[0])
        );

        let blue = Color::rgb(0, 0, 255);
        layer
            .set_annotation(&catalog, &key, &AnnotationPatch::new().color(blue))
            .unwrap();
        assert_eq!(cell_color(&layer, &catalog, &key), Some(blue));
    }

    #[test]
    fn matrix_covers_every_tactic() {
        let catalog = sample_catalog();
        let layer = LayerState::new("view", sample_domain());
        let tactics: Vec<_> = matrix(&layer, &catalog)
            .into_iter()
            .map(|(tactic, rows)| (tactic.id, rows.len()))
            .collect();
        assert_eq!(
            tactics,
            vec![(String::from("execution"), 3), (String::from("persistence"), 2)]
        );
    }
}
