// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Version-gated ingestion of layer files.

use core::future::Future;

use serde_json::Value;

use stratum_core::catalog::{Catalog, DomainVersion};
use stratum_core::layer::{LayerState, StaleReport};
use stratum_core::trace::{StaleDroppedEvent, Tracer, VersionClassifiedEvent};
use stratum_core::version::{Compatibility, FormatVersion};

use crate::error::IngestError;
use crate::format::LayerFile;
use crate::migrate::MigrationPipeline;

/// The user-facing side of ingestion.
///
/// `advise` is fire-and-forget. `confirm` is the only point at which
/// ingestion suspends; it has no timeout.
pub trait Prompt {
    /// Shows an informational message.
    fn advise(&mut self, message: &str);

    /// Asks a yes/no question. Resolves to `true` to proceed.
    fn confirm(&mut self, message: &str) -> impl Future<Output = bool>;
}

/// Settings for [`ingest`].
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Format version of the running engine.
    pub running: FormatVersion,
    /// Steps used to upgrade older files.
    pub pipeline: MigrationPipeline,
    /// Framework version assumed when a file does not name one.
    pub default_attack_version: String,
    /// When set, load the layer into this domain instead of the file's.
    pub domain_override: Option<DomainVersion>,
}

impl IngestConfig {
    /// The current format with the built-in migration steps.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            running: FormatVersion::CURRENT,
            pipeline: MigrationPipeline::standard(),
            default_attack_version: String::from("13"),
            domain_override: None,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// A successfully ingested layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Ingested {
    /// The layer, stamped with the running format version if it was migrated.
    pub layer: LayerState,
    /// How the file's version related to the running one.
    pub compatibility: Compatibility,
    /// Version found in the file.
    pub persisted: FormatVersion,
    /// References the catalog did not know, which were dropped.
    pub stale: StaleReport,
}

/// Reads the format version of a raw layer.
///
/// Current files keep it in `versions.layer`; files before format 4 use a
/// top-level `version`. Either may be a string or a number.
pub fn persisted_version(layer: &Value) -> Result<FormatVersion, IngestError> {
    let raw = layer
        .pointer("/versions/layer")
        .filter(|v| !v.is_null())
        .or_else(|| layer.get("version"))
        .ok_or(IngestError::MissingVersion)?;
    match raw {
        Value::String(text) => Ok(FormatVersion::parse(text)?),
        Value::Number(number) => Ok(FormatVersion::parse(&number.to_string())?),
        _ => Err(IngestError::MissingVersion),
    }
}

/// Parses, version-gates, migrates, and loads a layer file.
///
/// See [`ingest_with_tracer`].
pub async fn ingest<P: Prompt>(
    text: &str,
    catalog: &dyn Catalog,
    config: &IngestConfig,
    prompt: &mut P,
) -> Result<Ingested, IngestError> {
    ingest_with_tracer(text, catalog, config, prompt, &mut Tracer::none()).await
}

/// Parses, version-gates, migrates, and loads a layer file.
///
/// - Same major and minor as the running version: loaded as-is.
/// - Older minor: `prompt` is advised, then the file is migrated.
/// - Older major: `prompt` must confirm, else [`IngestError::UserCancelled`].
/// - Newer: `prompt` is advised, then
///   [`IngestError::UnsupportedFutureVersion`].
///
/// Entries that reference pairs unknown to `catalog` are dropped and
/// counted. Nothing is returned unless every stage succeeds.
pub async fn ingest_with_tracer<P: Prompt>(
    text: &str,
    catalog: &dyn Catalog,
    config: &IngestConfig,
    prompt: &mut P,
    tracer: &mut Tracer<'_>,
) -> Result<Ingested, IngestError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(IngestError::NotAnObject);
    }
    let persisted = persisted_version(&value)?;
    let Value::Object(object) = value else {
        return Err(IngestError::NotAnObject);
    };

    let running = config.running;
    let compatibility = Compatibility::classify(persisted, running);
    tracer.version_classified(&VersionClassifiedEvent {
        persisted,
        running,
        compatibility,
    });

    let object = match compatibility {
        Compatibility::Exact => object,
        Compatibility::MinorBehind => {
            prompt.advise(&format!(
                "This layer was saved in format {persisted} and will be upgraded to format {running}."
            ));
            config.pipeline.run(object, persisted, running, tracer)?
        }
        Compatibility::MajorBehind => {
            let accepted = prompt
                .confirm(&format!(
                    "This layer was saved in format {persisted}, which is not compatible with \
                     format {running}. Upgrade it? Some annotations may be lost."
                ))
                .await;
            if !accepted {
                return Err(IngestError::UserCancelled);
            }
            config.pipeline.run(object, persisted, running, tracer)?
        }
        Compatibility::Ahead => {
            prompt.advise(&format!(
                "This layer was saved in format {persisted}, which is newer than the supported \
                 format {running}."
            ));
            return Err(IngestError::UnsupportedFutureVersion { persisted, running });
        }
    };

    let file: LayerFile = serde_json::from_value(Value::Object(object))?;
    let domain = config
        .domain_override
        .clone()
        .unwrap_or_else(|| file.domain_version(&config.default_attack_version));
    let (mut layer, stale) = file.into_state(catalog, domain)?;
    if compatibility.needs_migration() {
        layer.set_format_version(running);
    }
    tracer.stale_dropped(&StaleDroppedEvent { report: stale });

    Ok(Ingested {
        layer,
        compatibility,
        persisted,
        stale,
    })
}

/// Serializes `layer` as a pretty-printed layer file.
pub fn to_json(layer: &LayerState) -> Result<String, IngestError> {
    Ok(serde_json::to_string_pretty(&LayerFile::from_state(layer))?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn version_locations() {
        assert_eq!(
            persisted_version(&json!({ "versions": { "layer": "4.5" } })).unwrap(),
            FormatVersion::new(4, 5, 0)
        );
        assert_eq!(
            persisted_version(&json!({ "version": "3.0" })).unwrap(),
            FormatVersion::new(3, 0, 0)
        );
        assert_eq!(
            persisted_version(&json!({ "version": 2.2 })).unwrap(),
            FormatVersion::new(2, 2, 0)
        );
        assert!(matches!(
            persisted_version(&json!({ "name": "x" })),
            Err(IngestError::MissingVersion)
        ));
        assert!(matches!(
            persisted_version(&json!({ "versions": { "layer": "four" } })),
            Err(IngestError::InvalidVersion(_))
        ));
    }
}
