// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and JSON journal sinks for stratum diagnostics.
//!
//! Both sinks implement [`TraceSink`](stratum_core::trace::TraceSink) for
//! engine events and [`LayerObserver`](stratum_core::events::LayerObserver)
//! for session changes:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`journal::JournalSink`]: collects events as JSON objects and exports
//!   them as a single array.

pub mod journal;
pub mod pretty;
