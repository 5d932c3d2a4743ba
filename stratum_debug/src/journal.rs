// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON event journal.
//!
//! [`JournalSink`] records every trace event and session change as a JSON
//! object with a `kind` field, in arrival order. [`JournalSink::export`]
//! writes the whole journal as one JSON array.

use std::io::{self, Write};

use serde_json::{Value, json};

use stratum_core::events::{LayerEvent, LayerObserver};
use stratum_core::trace::{
    CompositionFinishedEvent, MigrationStepEvent, StaleDroppedEvent, TraceSink,
    VersionClassifiedEvent,
};

/// Collects events as JSON values.
#[derive(Clone, Debug, Default)]
pub struct JournalSink {
    entries: Vec<Value>,
}

impl JournalSink {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Consumes the journal and returns it as a JSON array.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Array(self.entries)
    }

    /// Writes the journal as a pretty-printed JSON array.
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.entries)?;
        writeln!(writer)
    }
}

impl TraceSink for JournalSink {
    fn on_stale_dropped(&mut self, e: &StaleDroppedEvent) {
        self.entries.push(json!({
            "kind": "stale_dropped",
            "annotations": e.report.annotations,
            "selection": e.report.selection,
            "highlight": e.report.highlight,
        }));
    }

    fn on_composition_finished(&mut self, e: &CompositionFinishedEvent) {
        self.entries.push(json!({
            "kind": "composition_finished",
            "operands": e.operands,
            "techniques": e.techniques,
            "scored": e.scored,
        }));
    }

    fn on_migration_step(&mut self, e: &MigrationStepEvent) {
        self.entries.push(json!({
            "kind": "migration_step",
            "step": e.step,
            "from": e.from.to_string(),
            "to": e.to.to_string(),
        }));
    }

    fn on_version_classified(&mut self, e: &VersionClassifiedEvent) {
        self.entries.push(json!({
            "kind": "version_classified",
            "persisted": e.persisted.to_string(),
            "running": e.running.to_string(),
            "compatibility": e.compatibility.as_str(),
        }));
    }
}

impl LayerObserver for JournalSink {
    fn on_event(&mut self, event: &LayerEvent) {
        let entry = match event {
            LayerEvent::SelectionChanged { selected } => json!({
                "kind": "selection_changed",
                "selected": selected,
            }),
            LayerEvent::HighlightChanged { highlighted } => json!({
                "kind": "highlight_changed",
                "highlighted": highlighted.as_ref().map(ToString::to_string),
            }),
            LayerEvent::AnnotationChanged { key } => json!({
                "kind": "annotation_changed",
                "technique": key.technique,
                "tactic": key.tactic,
            }),
        };
        self.entries.push(entry);
    }
}
