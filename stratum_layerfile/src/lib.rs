// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted layer files for stratum.
//!
//! Layer files are JSON documents in the established camelCase layer format.
//! Loading one goes through three stages:
//!
//! 1. **Gate**: the file's format version is classified against the running
//!    version ([`Compatibility`](stratum_core::version::Compatibility)).
//!    Older files may need the user's consent, newer ones are refused. The
//!    caller supplies a [`Prompt`] for the conversation.
//! 2. **Migrate**: older files are upgraded one [`MigrationStep`] at a time
//!    over the raw JSON, then stamped with the running version.
//! 3. **Load**: the upgraded JSON is deserialized into a [`LayerFile`] and
//!    converted to a [`LayerState`](stratum_core::layer::LayerState); entries
//!    the catalog does not know are dropped and counted.
//!
//! [`to_json`] writes a layer back out in the current format.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Reports version classification,
//!   migration steps, and dropped entries to a
//!   [`TraceSink`](stratum_core::trace::TraceSink).

mod error;
mod format;
mod gate;
mod migrate;

pub use error::IngestError;
pub use format::{
    FileFilters, FileGradient, FileLayout, FileLegendItem, FileLink, FileMetadata, FileTechnique,
    LayerFile, Versions,
};
pub use gate::{IngestConfig, Ingested, Prompt, ingest, ingest_with_tracer, persisted_version, to_json};
pub use migrate::{LayerObject, MigrationPipeline, MigrationStep};
