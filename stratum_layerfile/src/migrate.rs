// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Schema migration over raw layer JSON.
//!
//! Each [`MigrationStep`] rewrites a layer object from one format version to
//! the next. Steps are total: they never fail, and every field a step
//! introduces gets an explicit default (existing values are kept). A
//! [`MigrationPipeline`] applies the steps in order, starting from the first
//! step that covers the persisted version.

use serde_json::{Map, Value, json};

use stratum_core::trace::{MigrationStepEvent, Tracer};
use stratum_core::version::FormatVersion;

use crate::error::IngestError;

/// A JSON layer object.
pub type LayerObject = Map<String, Value>;

/// One named schema upgrade.
#[derive(Clone, Copy, Debug)]
pub struct MigrationStep {
    /// Name, used in diagnostics.
    pub name: &'static str,
    /// Lowest version the step accepts.
    pub source: FormatVersion,
    /// Version the step produces.
    pub target: FormatVersion,
    /// The rewrite.
    pub apply: fn(LayerObject) -> LayerObject,
}

/// An ordered list of migration steps.
#[derive(Clone, Debug, Default)]
pub struct MigrationPipeline {
    steps: Vec<MigrationStep>,
}

impl MigrationPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in steps, from format 2 up to 4.5.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_step(MigrationStep {
                name: "2.x to 3.0",
                source: FormatVersion::new(2, 0, 0),
                target: FormatVersion::new(3, 0, 0),
                apply: v2_to_v3,
            })
            .with_step(MigrationStep {
                name: "3.x to 4.0",
                source: FormatVersion::new(3, 0, 0),
                target: FormatVersion::new(4, 0, 0),
                apply: v3_to_v4,
            })
            .with_step(MigrationStep {
                name: "4.0 to 4.1",
                source: FormatVersion::new(4, 0, 0),
                target: FormatVersion::new(4, 1, 0),
                apply: v4_0_to_v4_1,
            })
            .with_step(MigrationStep {
                name: "4.1 to 4.2",
                source: FormatVersion::new(4, 1, 0),
                target: FormatVersion::new(4, 2, 0),
                apply: v4_1_to_v4_2,
            })
            .with_step(MigrationStep {
                name: "4.2 to 4.3",
                source: FormatVersion::new(4, 2, 0),
                target: FormatVersion::new(4, 3, 0),
                apply: v4_2_to_v4_3,
            })
            .with_step(MigrationStep {
                name: "4.3 to 4.4",
                source: FormatVersion::new(4, 3, 0),
                target: FormatVersion::new(4, 4, 0),
                apply: v4_3_to_v4_4,
            })
            .with_step(MigrationStep {
                name: "4.4 to 4.5",
                source: FormatVersion::new(4, 4, 0),
                target: FormatVersion::new(4, 5, 0),
                apply: v4_4_to_v4_5,
            })
    }

    /// Appends a step. Steps must be added in ascending version order.
    #[must_use]
    pub fn with_step(mut self, step: MigrationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the steps in application order.
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Upgrades `layer` from `from` to `to` and stamps it with `to`.
    ///
    /// Patch components are ignored. Fails when the steps leave a gap
    /// between the two versions.
    pub fn run(
        &self,
        mut layer: LayerObject,
        from: FormatVersion,
        to: FormatVersion,
        tracer: &mut Tracer<'_>,
    ) -> Result<LayerObject, IngestError> {
        let goal = to.release();
        let mut current = from.release();
        for step in &self.steps {
            if current >= goal {
                break;
            }
            if step.target <= current {
                continue;
            }
            if step.source > current || step.target > goal {
                break;
            }
            layer = (step.apply)(layer);
            tracer.migration_step(&MigrationStepEvent {
                step: step.name,
                from: current,
                to: step.target,
            });
            current = step.target;
        }
        if current < goal {
            return Err(IngestError::Migration(format!(
                "no migration step leads from format {current} to {goal}"
            )));
        }
        stamp(&mut layer, to);
        Ok(layer)
    }
}

/// Records `version` as the layer's schema version.
fn stamp(layer: &mut LayerObject, version: FormatVersion) {
    layer.remove("version");
    with_object(layer, "versions", |versions| {
        versions.insert(String::from("layer"), Value::String(version.to_string()));
    });
}

/// Runs `f` on the object stored under `key`, creating it (or replacing a
/// non-object value) first.
fn with_object(layer: &mut LayerObject, key: &str, f: impl FnOnce(&mut LayerObject)) {
    let slot = layer.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(object) = slot {
        f(object);
    }
}

fn fill(object: &mut LayerObject, key: &str, value: Value) {
    object.entry(key).or_insert(value);
}

fn for_each_technique(layer: &mut LayerObject, mut f: impl FnMut(&mut LayerObject)) {
    if let Some(Value::Array(techniques)) = layer.get_mut("techniques") {
        for technique in techniques {
            if let Value::Object(technique) = technique {
                f(technique);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in steps
// ---------------------------------------------------------------------------

fn v2_to_v3(mut layer: LayerObject) -> LayerObject {
    fill(&mut layer, "hideDisabled", json!(false));
    fill(&mut layer, "showTacticRowBackground", json!(false));
    fill(&mut layer, "tacticRowBackground", json!("#dddddd"));
    fill(&mut layer, "selectTechniquesAcrossTactics", json!(true));
    for_each_technique(&mut layer, |technique| {
        fill(technique, "enabled", json!(true));
        fill(technique, "comment", json!(""));
    });
    layer
}

fn v3_to_v4(mut layer: LayerObject) -> LayerObject {
    if let Some(Value::String(domain)) = layer.get_mut("domain") {
        let renamed = match domain.as_str() {
            "mitre-enterprise" => Some("enterprise-attack"),
            "mitre-mobile" => Some("mobile-attack"),
            _ => None,
        };
        if let Some(renamed) = renamed {
            *domain = String::from(renamed);
        }
    }
    let mode = match layer.remove("viewMode").and_then(|v| v.as_u64()) {
        Some(1) => "flat",
        Some(2) => "mini",
        _ => "side",
    };
    with_object(&mut layer, "layout", |layout| fill(layout, "layout", json!(mode)));
    fill(&mut layer, "selectSubtechniquesWithParent", json!(false));
    for_each_technique(&mut layer, |technique| {
        fill(technique, "showSubtechniques", json!(false));
    });
    layer
}

fn v4_0_to_v4_1(mut layer: LayerObject) -> LayerObject {
    with_object(&mut layer, "layout", |layout| {
        fill(layout, "aggregateFunction", json!("average"));
        fill(layout, "showAggregateScores", json!(false));
        fill(layout, "countUnscored", json!(false));
    });
    layer
}

fn v4_1_to_v4_2(mut layer: LayerObject) -> LayerObject {
    fill(&mut layer, "links", json!([]));
    fill(&mut layer, "metadata", json!([]));
    for_each_technique(&mut layer, |technique| {
        fill(technique, "links", json!([]));
        fill(technique, "metadata", json!([]));
    });
    layer
}

fn v4_2_to_v4_3(mut layer: LayerObject) -> LayerObject {
    with_object(&mut layer, "layout", |layout| {
        fill(layout, "showID", json!(false));
        fill(layout, "showName", json!(true));
    });
    layer
}

fn v4_3_to_v4_4(mut layer: LayerObject) -> LayerObject {
    fill(&mut layer, "selectVisibleTechniques", json!(false));
    layer
}

fn v4_4_to_v4_5(mut layer: LayerObject) -> LayerObject {
    with_object(&mut layer, "layout", |layout| {
        fill(layout, "expandedSubtechniques", json!("none"));
    });
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> LayerObject {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn run(layer: Value, from: &str) -> Result<LayerObject, IngestError> {
        MigrationPipeline::standard().run(
            object(layer),
            from.parse().unwrap(),
            FormatVersion::CURRENT,
            &mut Tracer::none(),
        )
    }

    #[test]
    fn standard_steps_chain_without_gaps() {
        let steps = MigrationPipeline::standard();
        for pair in steps.steps().windows(2) {
            assert_eq!(pair[0].target, pair[1].source, "{} -> {}", pair[0].name, pair[1].name);
        }
        assert_eq!(steps.steps().last().unwrap().target, FormatVersion::CURRENT);
    }

    #[test]
    fn v3_layer_is_fully_upgraded() {
        let migrated = run(
            json!({
                "name": "old",
                "version": "3.0",
                "domain": "mitre-enterprise",
                "viewMode": 2,
                "techniques": [{ "techniqueID": "T1059", "tactic": "execution", "score": 3 }]
            }),
            "3.0",
        )
        .unwrap();

        assert_eq!(migrated["domain"], json!("enterprise-attack"));
        assert_eq!(migrated["layout"]["layout"], json!("mini"));
        assert_eq!(migrated["layout"]["aggregateFunction"], json!("average"));
        assert_eq!(migrated["layout"]["expandedSubtechniques"], json!("none"));
        assert_eq!(migrated["versions"]["layer"], json!("4.5"));
        assert_eq!(migrated["techniques"][0]["showSubtechniques"], json!(false));
        assert_eq!(migrated["techniques"][0]["links"], json!([]));
        assert!(!migrated.contains_key("version"));
        assert!(!migrated.contains_key("viewMode"));
    }

    #[test]
    fn minor_steps_keep_existing_values() {
        let migrated = run(
            json!({
                "name": "recent",
                "versions": { "layer": "4.2" },
                "domain": "enterprise-attack",
                "layout": { "layout": "flat", "showName": false }
            }),
            "4.2",
        )
        .unwrap();
        assert_eq!(migrated["layout"]["layout"], json!("flat"));
        assert_eq!(migrated["layout"]["showName"], json!(false));
        assert_eq!(migrated["layout"]["showID"], json!(false));
        assert_eq!(migrated["selectVisibleTechniques"], json!(false));
        // Steps before 4.2 did not run.
        assert!(migrated["layout"].get("aggregateFunction").is_none());
    }

    #[test]
    fn versions_without_a_path_fail() {
        let err = run(json!({ "name": "ancient", "version": "1.0" }), "1.0").unwrap_err();
        assert!(matches!(err, IngestError::Migration(_)));
    }

    #[test]
    fn patch_versions_start_at_their_release() {
        let migrated = run(json!({ "name": "p", "versions": { "layer": "4.4.2" } }), "4.4.2").unwrap();
        assert_eq!(migrated["layout"]["expandedSubtechniques"], json!("none"));
        assert_eq!(migrated["versions"]["layer"], json!("4.5"));
    }
}
