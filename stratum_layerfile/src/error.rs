// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ingestion errors.

use stratum_core::LayerError;
use stratum_core::version::{FormatVersion, VersionParseError};

/// Error returned when a layer file cannot be turned into a layer.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The user declined a major-version upgrade.
    #[error("layer upgrade was declined")]
    UserCancelled,
    /// The file was written by a newer engine.
    #[error("layer format {persisted} is newer than the supported format {running}")]
    UnsupportedFutureVersion {
        /// Version found in the file.
        persisted: FormatVersion,
        /// Version of the running engine.
        running: FormatVersion,
    },
    /// The file's version string is malformed.
    #[error(transparent)]
    InvalidVersion(#[from] VersionParseError),
    /// The file carries no version.
    #[error("layer file does not declare a format version")]
    MissingVersion,
    /// The top-level JSON value is not an object.
    #[error("layer file must contain a JSON object")]
    NotAnObject,
    /// Malformed JSON, or JSON that does not match the layer schema.
    #[error("malformed layer file: {0}")]
    Json(#[from] serde_json::Error),
    /// No migration path leads from the persisted version to the running one.
    #[error("cannot migrate layer: {0}")]
    Migration(String),
    /// The file's contents violate a layer invariant.
    #[error(transparent)]
    Layer(#[from] LayerError),
}
