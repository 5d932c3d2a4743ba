// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for load, composition, and migration.
//!
//! The engine does not log. Instead, instrumented operations report through a
//! [`TraceSink`], whose methods all default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Sinks for humans and for JSON export live in the `stratum_debug` crate.

use crate::layer::StaleReport;
use crate::version::{Compatibility, FormatVersion};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when stale catalog references are dropped from a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaleDroppedEvent {
    /// What was dropped.
    pub report: StaleReport,
}

/// Emitted when a composition has produced its result layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionFinishedEvent {
    /// Number of operand layers.
    pub operands: usize,
    /// Number of (technique, tactic) pairs in the result.
    pub techniques: usize,
    /// How many of those received a finite score.
    pub scored: usize,
}

/// Emitted after each migration step runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MigrationStepEvent {
    /// Step name.
    pub step: &'static str,
    /// Version before the step.
    pub from: FormatVersion,
    /// Version after the step.
    pub to: FormatVersion,
}

/// Emitted once per ingestion, after the persisted version is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionClassifiedEvent {
    /// Version found in the file.
    pub persisted: FormatVersion,
    /// Version of the running engine.
    pub running: FormatVersion,
    /// Outcome of the comparison.
    pub compatibility: Compatibility,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when stale references were dropped.
    fn on_stale_dropped(&mut self, e: &StaleDroppedEvent) {
        _ = e;
    }

    /// Called when a composition finished.
    fn on_composition_finished(&mut self, e: &CompositionFinishedEvent) {
        _ = e;
    }

    /// Called after a migration step.
    fn on_migration_step(&mut self, e: &MigrationStepEvent) {
        _ = e;
    }

    /// Called when a persisted version has been classified.
    fn on_version_classified(&mut self, e: &VersionClassifiedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`StaleDroppedEvent`]. Empty reports are not forwarded.
    #[inline]
    pub fn stale_dropped(&mut self, e: &StaleDroppedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink
            && !e.report.is_empty()
        {
            s.on_stale_dropped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CompositionFinishedEvent`].
    #[inline]
    pub fn composition_finished(&mut self, e: &CompositionFinishedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_composition_finished(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MigrationStepEvent`].
    #[inline]
    pub fn migration_step(&mut self, e: &MigrationStepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_migration_step(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`VersionClassifiedEvent`].
    #[inline]
    pub fn version_classified(&mut self, e: &VersionClassifiedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_version_classified(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
