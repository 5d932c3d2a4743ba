// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The persisted layer file schema.
//!
//! Field names follow the established camelCase layer format, so files
//! written by other tools load unchanged. Unknown fields are ignored and
//! absent fields take the defaults of the current format.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use stratum_core::catalog::{Catalog, DomainVersion};
use stratum_core::layer::{
    Aggregation, Annotation, Color, Filters, Gradient, LayerState, Layout, LegendItem, Link,
    MetadataEntry, SelectionBehavior, SortOrder, StaleReport, TechniqueKey,
};
use stratum_core::version::FormatVersion;

use crate::error::IngestError;

/// A layer file as it appears on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerFile {
    /// Layer name.
    pub name: String,
    /// Schema and content versions.
    #[serde(default)]
    pub versions: Versions,
    /// Domain identifier, e.g. `enterprise-attack`.
    pub domain: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Platform and stage filters.
    #[serde(default)]
    pub filters: FileFilters,
    /// Sort order code; absent means catalog order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<u8>,
    /// Layout and aggregation options.
    #[serde(default)]
    pub layout: FileLayout,
    /// Hide disabled techniques.
    #[serde(default)]
    pub hide_disabled: bool,
    /// Per-cell annotations.
    #[serde(default)]
    pub techniques: Vec<FileTechnique>,
    /// Score gradient.
    #[serde(default)]
    pub gradient: FileGradient,
    /// Legend entries.
    #[serde(default)]
    pub legend_items: Vec<FileLegendItem>,
    /// Layer metadata.
    #[serde(default)]
    pub metadata: Vec<FileMetadata>,
    /// Layer links.
    #[serde(default)]
    pub links: Vec<FileLink>,
    /// Whether the tactic header row is painted.
    #[serde(default)]
    pub show_tactic_row_background: bool,
    /// Tactic header row color.
    #[serde(default = "default_tactic_row_background")]
    pub tactic_row_background: String,
    /// Selecting a technique selects it under every tactic.
    #[serde(default = "yes")]
    pub select_techniques_across_tactics: bool,
    /// Selecting a technique selects its sub-techniques, and vice versa.
    #[serde(default)]
    pub select_subtechniques_with_parent: bool,
    /// Tactic clicks only affect visible techniques.
    #[serde(default)]
    pub select_visible_techniques: bool,
}

/// The `versions` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    /// Framework content version, e.g. `13`.
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub attack: Option<String>,
    /// Version of the tool that wrote the file. Informational.
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub navigator: Option<String>,
    /// Layer schema version.
    #[serde(default, deserialize_with = "lenient_text")]
    pub layer: String,
}

/// The `filters` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilters {
    /// Allowed platforms; empty allows all.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Allowed stages; empty allows all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<String>,
}

/// The `layout` block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileLayout {
    /// `side`, `flat`, or `mini`.
    pub layout: String,
    /// `average`, `min`, `max`, or `sum`.
    pub aggregate_function: String,
    /// Show technique ids.
    #[serde(rename = "showID")]
    pub show_id: bool,
    /// Show technique names.
    pub show_name: bool,
    /// Show rolled-up scores on parents.
    pub show_aggregate_scores: bool,
    /// Count unscored sub-techniques as zero.
    pub count_unscored: bool,
    /// `none`, `all`, or `annotated`.
    pub expanded_subtechniques: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            layout: layout.mode,
            aggregate_function: String::from(Aggregation::default().as_str()),
            show_id: layout.show_id,
            show_name: layout.show_name,
            show_aggregate_scores: layout.show_aggregate_scores,
            count_unscored: false,
            expanded_subtechniques: layout.expanded_subtechniques,
        }
    }
}

/// One entry of the `techniques` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTechnique {
    /// Technique or sub-technique id.
    #[serde(rename = "techniqueID")]
    pub technique_id: String,
    /// Tactic id; absent applies the entry under every tactic of the
    /// technique.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    /// Score. Numeric strings are accepted; empty strings mean unscored.
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    /// Explicit color, or empty.
    #[serde(default)]
    pub color: String,
    /// Comment.
    #[serde(default)]
    pub comment: String,
    /// Enabled flag.
    #[serde(default = "yes")]
    pub enabled: bool,
    /// Metadata entries.
    #[serde(default)]
    pub metadata: Vec<FileMetadata>,
    /// Links.
    #[serde(default)]
    pub links: Vec<FileLink>,
    /// Sub-technique expansion.
    #[serde(default)]
    pub show_subtechniques: bool,
}

/// The `gradient` block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGradient {
    /// Hex colors, low to high.
    pub colors: Vec<String>,
    /// Score mapped to the first color.
    pub min_value: f64,
    /// Score mapped to the last color.
    pub max_value: f64,
}

impl Default for FileGradient {
    fn default() -> Self {
        Self::from(&Gradient::default())
    }
}

impl From<&Gradient> for FileGradient {
    fn from(gradient: &Gradient) -> Self {
        Self {
            colors: gradient.colors().iter().map(ToString::to_string).collect(),
            min_value: gradient.min_value(),
            max_value: gradient.max_value(),
        }
    }
}

/// A legend entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLegendItem {
    /// Legend text.
    pub label: String,
    /// Hex color.
    pub color: String,
}

/// A metadata entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Entry name.
    #[serde(default)]
    pub name: String,
    /// Entry value.
    #[serde(default)]
    pub value: String,
}

/// A link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    /// Link text.
    #[serde(default)]
    pub label: String,
    /// Target URL.
    #[serde(default)]
    pub url: String,
}

fn yes() -> bool {
    true
}

fn default_tactic_row_background() -> String {
    String::from("#dddddd")
}

/// A version field written either as a string or as a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<TextOrNumber> for String {
    fn from(value: TextOrNumber) -> Self {
        match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(String::from)
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(String::from))
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(score)) => Ok(Some(score)),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Text(text)) => match text.trim().parse::<f64>() {
            Ok(score) if score.is_finite() => Ok(Some(score)),
            Ok(_) => Err(de::Error::custom(format!("score `{text}` is not finite"))),
            Err(_) => Err(de::Error::custom(format!("score `{text}` is not a number"))),
        },
    }
}

fn sort_from_code(code: Option<u8>) -> SortOrder {
    match code {
        Some(0) => SortOrder::NameAscending,
        Some(1) => SortOrder::NameDescending,
        Some(2) => SortOrder::ScoreAscending,
        Some(3) => SortOrder::ScoreDescending,
        _ => SortOrder::None,
    }
}

fn sort_to_code(sort: SortOrder) -> Option<u8> {
    match sort {
        SortOrder::None => None,
        SortOrder::NameAscending => Some(0),
        SortOrder::NameDescending => Some(1),
        SortOrder::ScoreAscending => Some(2),
        SortOrder::ScoreDescending => Some(3),
    }
}

fn parse_color(text: &str) -> Result<Option<Color>, IngestError> {
    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(Color::parse(text)?))
    }
}

impl LayerFile {
    /// Returns the domain the file targets, using `default_attack_version`
    /// when the file does not name a framework version.
    #[must_use]
    pub fn domain_version(&self, default_attack_version: &str) -> DomainVersion {
        let version = self
            .versions
            .attack
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default_attack_version);
        DomainVersion::new(self.domain.clone(), version)
    }

    /// Builds a layer targeting `domain`.
    ///
    /// Entries without a tactic are applied under every tactic of their
    /// technique. Entries the catalog does not know are dropped and counted
    /// in the returned report.
    pub fn into_state(
        self,
        catalog: &dyn Catalog,
        domain: DomainVersion,
    ) -> Result<(LayerState, StaleReport), IngestError> {
        let mut layer = LayerState::new(self.name, domain.clone());
        layer.set_description(self.description);
        if !self.versions.layer.is_empty() {
            layer.set_format_version(FormatVersion::parse(&self.versions.layer)?);
        }

        let mut unplaced = 0;
        for entry in self.techniques {
            let annotation = Annotation {
                color: parse_color(&entry.color)?,
                score: entry.score,
                enabled: entry.enabled,
                comment: entry.comment,
                metadata: entry
                    .metadata
                    .into_iter()
                    .map(|m| MetadataEntry::new(m.name, m.value))
                    .collect(),
                links: entry
                    .links
                    .into_iter()
                    .map(|l| Link::new(l.label, l.url))
                    .collect(),
                show_subtechniques: entry.show_subtechniques,
            };
            let tactics = match entry.tactic {
                Some(tactic) => vec![tactic],
                None => catalog.tactics_of(&domain, &entry.technique_id),
            };
            if tactics.is_empty() {
                unplaced += 1;
            }
            for tactic in tactics {
                layer.insert_annotation(
                    TechniqueKey::new(entry.technique_id.clone(), tactic),
                    annotation.clone(),
                );
            }
        }

        let colors = self
            .gradient
            .colors
            .iter()
            .map(|c| Color::parse(c))
            .collect::<Result<Vec<_>, _>>()?;
        let gradient = Gradient::new(colors, self.gradient.min_value, self.gradient.max_value)?
            .with_aggregation(Aggregation::parse(&self.layout.aggregate_function)?)
            .with_count_unscored(self.layout.count_unscored);
        layer.set_gradient(gradient);

        layer.set_filters(Filters {
            platforms: self.filters.platforms.into_iter().collect(),
            stages: self.filters.stages.into_iter().collect(),
            hide_disabled: self.hide_disabled,
        })?;
        layer.set_sort(sort_from_code(self.sorting));
        layer.set_selection_behavior(SelectionBehavior {
            across_tactics: self.select_techniques_across_tactics,
            subtechniques_with_parent: self.select_subtechniques_with_parent,
            visible_only: self.select_visible_techniques,
        });

        let presentation = layer.presentation_mut();
        presentation.legend_items = self
            .legend_items
            .into_iter()
            .map(|item| {
                Ok(LegendItem {
                    color: Color::parse(&item.color)?,
                    label: item.label,
                })
            })
            .collect::<Result<_, IngestError>>()?;
        presentation.layout = Layout {
            mode: self.layout.layout,
            show_id: self.layout.show_id,
            show_name: self.layout.show_name,
            show_aggregate_scores: self.layout.show_aggregate_scores,
            expanded_subtechniques: self.layout.expanded_subtechniques,
        };
        presentation.metadata = self
            .metadata
            .into_iter()
            .map(|m| MetadataEntry::new(m.name, m.value))
            .collect();
        presentation.links = self
            .links
            .into_iter()
            .map(|l| Link::new(l.label, l.url))
            .collect();
        presentation.tactic_row_background = if self.show_tactic_row_background {
            parse_color(&self.tactic_row_background)?
        } else {
            None
        };

        layer.validate()?;
        let mut report = layer.retain_known(catalog);
        report.annotations += unplaced;
        Ok((layer, report))
    }

    /// Describes `layer` in the current file format.
    #[must_use]
    pub fn from_state(layer: &LayerState) -> Self {
        let gradient = layer.gradient();
        let presentation = layer.presentation();
        let filters = layer.filters();
        let behavior = layer.selection_behavior();
        let metadata = |entries: &[MetadataEntry]| -> Vec<FileMetadata> {
            entries
                .iter()
                .map(|m| FileMetadata {
                    name: m.name.clone(),
                    value: m.value.clone(),
                })
                .collect()
        };
        let links = |entries: &[Link]| -> Vec<FileLink> {
            entries
                .iter()
                .map(|l| FileLink {
                    label: l.label.clone(),
                    url: l.url.clone(),
                })
                .collect()
        };

        Self {
            name: layer.name().to_owned(),
            versions: Versions {
                attack: Some(layer.domain().version.clone()),
                navigator: None,
                layer: layer.format_version().to_string(),
            },
            domain: layer.domain().domain.clone(),
            description: layer.description().to_owned(),
            filters: FileFilters {
                platforms: filters.platforms.iter().cloned().collect(),
                stages: filters.stages.iter().cloned().collect(),
            },
            sorting: sort_to_code(layer.sort()),
            layout: FileLayout {
                layout: presentation.layout.mode.clone(),
                aggregate_function: String::from(gradient.aggregation().as_str()),
                show_id: presentation.layout.show_id,
                show_name: presentation.layout.show_name,
                show_aggregate_scores: presentation.layout.show_aggregate_scores,
                count_unscored: gradient.count_unscored(),
                expanded_subtechniques: presentation.layout.expanded_subtechniques.clone(),
            },
            hide_disabled: filters.hide_disabled,
            techniques: layer
                .annotations()
                .iter()
                .map(|(key, annotation)| FileTechnique {
                    technique_id: key.technique.clone(),
                    tactic: Some(key.tactic.clone()),
                    score: annotation.score,
                    color: annotation.color.map(|c| c.to_string()).unwrap_or_default(),
                    comment: annotation.comment.clone(),
                    enabled: annotation.enabled,
                    metadata: metadata(&annotation.metadata),
                    links: links(&annotation.links),
                    show_subtechniques: annotation.show_subtechniques,
                })
                .collect(),
            gradient: FileGradient::from(gradient),
            legend_items: presentation
                .legend_items
                .iter()
                .map(|item| FileLegendItem {
                    label: item.label.clone(),
                    color: item.color.to_string(),
                })
                .collect(),
            metadata: metadata(&presentation.metadata),
            links: links(&presentation.links),
            show_tactic_row_background: presentation.tactic_row_background.is_some(),
            tactic_row_background: presentation
                .tactic_row_background
                .map_or_else(default_tactic_row_background, |c| c.to_string()),
            select_techniques_across_tactics: behavior.across_tactics,
            select_subtechniques_with_parent: behavior.subtechniques_with_parent,
            select_visible_techniques: behavior.visible_only,
        }
    }
}
