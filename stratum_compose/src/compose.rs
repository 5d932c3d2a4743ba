// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deriving a new layer from existing ones.
//!
//! [`compose`] evaluates a score expression once per (technique, tactic) pair
//! annotated by any operand and collects the results into a fresh
//! [`LayerState`]. Operands are untouched; on error nothing is produced.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;

use stratum_core::LayerError;
use stratum_core::catalog::DomainVersion;
use stratum_core::layer::{Annotation, LayerState, TechniqueKey};
use stratum_core::trace::{CompositionFinishedEvent, Tracer};

use crate::expr::{Expr, ExprError};

/// Errors from [`compose`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// The score expression is empty, malformed, or names a missing operand.
    #[error(transparent)]
    Expr(#[from] ExprError),
    /// An operand targets a different domain than the result.
    #[error("layer `{operand}` targets {found}, expected {expected}")]
    DomainMismatch {
        /// Operand name.
        operand: String,
        /// Domain of the result.
        expected: DomainVersion,
        /// Domain of the operand.
        found: DomainVersion,
    },
    /// An inheritance option names a layer that was not supplied.
    #[error("cannot inherit from unknown layer `{0}`")]
    UnknownSource(String),
    /// Inherited configuration was rejected by the result layer.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// How the `enabled` flags of operands combine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnabledLogic {
    /// Enabled only if every annotating operand is enabled.
    #[default]
    All,
    /// Enabled if any annotating operand is enabled.
    Any,
}

/// Operands whose non-score data is copied into the result.
///
/// Each field names an operand; `None` leaves the result at its default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inheritance {
    /// Gradient (colors, range, aggregation).
    pub gradient: Option<String>,
    /// Per-cell comments.
    pub comments: Option<String>,
    /// Per-cell explicit colors.
    pub colors: Option<String>,
    /// Per-cell metadata.
    pub metadata: Option<String>,
    /// Per-cell links.
    pub links: Option<String>,
    /// Filters.
    pub filters: Option<String>,
    /// Legend items.
    pub legend: Option<String>,
}

impl Inheritance {
    fn sources(&self) -> impl Iterator<Item = &str> {
        [
            &self.gradient,
            &self.comments,
            &self.colors,
            &self.metadata,
            &self.links,
            &self.filters,
            &self.legend,
        ]
        .into_iter()
        .filter_map(|source| source.as_deref())
    }
}

/// Options for [`compose`].
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeOptions {
    /// Name of the result layer.
    pub name: String,
    /// Description of the result layer.
    pub description: String,
    /// Score used for an operand that does not score a pair.
    pub default_score: f64,
    /// How `enabled` flags combine.
    pub enabled_logic: EnabledLogic,
    /// Data copied from named operands.
    pub inherit: Inheritance,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            name: String::from("layer by operation"),
            description: String::new(),
            default_score: 0.0,
            enabled_logic: EnabledLogic::All,
            inherit: Inheritance::default(),
        }
    }
}

/// Returns the conventional name of the operand at `index`: `a` through `z`,
/// then `aa`, `ab`, and so on.
#[must_use]
pub fn operand_name(index: usize) -> String {
    let mut name = alloc::vec::Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        #[expect(clippy::cast_possible_truncation, reason = "n % 26 is below 26")]
        name.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    name.reverse();
    name.into_iter().map(char::from).collect()
}

/// Builds a new layer whose scores are `expr` evaluated over `operands`.
///
/// See [`compose_with_tracer`].
pub fn compose(
    expr: &str,
    operands: &BTreeMap<String, &LayerState>,
    domain: &DomainVersion,
    options: &ComposeOptions,
) -> Result<LayerState, ComposeError> {
    compose_with_tracer(expr, operands, domain, options, &mut Tracer::none())
}

/// Builds a new layer whose scores are `expr` evaluated over `operands`.
///
/// The result contains one annotation per pair annotated by any operand. Its
/// score is `expr` with each operand replaced by that operand's score of the
/// pair, or by `options.default_score` when it has none. Results that are not
/// finite leave the pair unscored. Every operand must target `domain`.
pub fn compose_with_tracer(
    expr: &str,
    operands: &BTreeMap<String, &LayerState>,
    domain: &DomainVersion,
    options: &ComposeOptions,
    tracer: &mut Tracer<'_>,
) -> Result<LayerState, ComposeError> {
    let parsed = Expr::parse(expr)?;
    parsed.check_operands(&|name| operands.contains_key(name))?;

    for (name, layer) in operands {
        if layer.domain() != domain {
            return Err(ComposeError::DomainMismatch {
                operand: name.clone(),
                expected: domain.clone(),
                found: layer.domain().clone(),
            });
        }
    }
    if let Some(missing) = options
        .inherit
        .sources()
        .find(|source| !operands.contains_key(*source))
    {
        return Err(ComposeError::UnknownSource(String::from(missing)));
    }
    let source = |name: &Option<String>| name.as_deref().and_then(|n| operands.get(n).copied());

    let keys: BTreeSet<&TechniqueKey> = operands
        .values()
        .flat_map(|layer| layer.annotations().keys())
        .collect();

    let mut result = LayerState::new(options.name.clone(), domain.clone());
    result.set_description(options.description.clone());

    let mut scored = 0;
    for key in &keys {
        let value = parsed.eval(&|name| {
            operands
                .get(name)
                .and_then(|layer| layer.annotation(key))
                .and_then(|annotation| annotation.score)
                .unwrap_or(options.default_score)
        });
        let score = value.is_finite().then_some(value);
        scored += usize::from(score.is_some());

        let mut annotating = operands.values().filter_map(|layer| layer.annotation(key));
        let enabled = match options.enabled_logic {
            EnabledLogic::All => annotating.all(|a| a.enabled),
            EnabledLogic::Any => {
                let mut any_annotating = false;
                let any_enabled = annotating.any(|a| {
                    any_annotating = true;
                    a.enabled
                });
                any_enabled || !any_annotating
            }
        };

        let inherited = |name: &Option<String>| source(name).and_then(|layer| layer.annotation(key));
        let annotation = Annotation {
            score,
            enabled,
            color: inherited(&options.inherit.colors).and_then(|a| a.color),
            comment: inherited(&options.inherit.comments)
                .map(|a| a.comment.clone())
                .unwrap_or_default(),
            metadata: inherited(&options.inherit.metadata)
                .map(|a| a.metadata.clone())
                .unwrap_or_default(),
            links: inherited(&options.inherit.links)
                .map(|a| a.links.clone())
                .unwrap_or_default(),
            show_subtechniques: false,
        };
        result.insert_annotation((*key).clone(), annotation);
    }

    if let Some(layer) = source(&options.inherit.gradient) {
        result.set_gradient(layer.gradient().clone());
    }
    if let Some(layer) = source(&options.inherit.filters) {
        result.set_filters(layer.filters().clone())?;
    }
    if let Some(layer) = source(&options.inherit.legend) {
        result.presentation_mut().legend_items = layer.presentation().legend_items.clone();
    }

    tracer.composition_finished(&CompositionFinishedEvent {
        operands: operands.len(),
        techniques: keys.len(),
        scored,
    });
    Ok(result)
}
