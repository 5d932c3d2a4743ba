// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer state, catalog interface, and selection engine for technique-matrix
//! layers.
//!
//! `stratum_core` provides the in-memory model behind one *layer*: a scored,
//! colored overlay on a matrix of techniques grouped by tactics. It is
//! `no_std` compatible (with `alloc`) and has no I/O of its own.
//!
//! # Architecture
//!
//! ```text
//!   Catalog (read-only, external)
//!       │
//!       ▼
//!   LayerState ◄── set_annotation / select / highlight
//!       │
//!       ▼
//!   view::apply_controls() ──► Vec<TechniqueRow>   (filter + sort, per tactic)
//!       │
//!       ▼
//!   LayerSession::click_*() ──► Observers::notify(LayerEvent)
//! ```
//!
//! **[`catalog`]**: the [`Catalog`](catalog::Catalog) trait through which
//! tactics, techniques, and sub-techniques are looked up, plus an in-memory
//! [`MatrixCatalog`](catalog::MatrixCatalog).
//!
//! **[`layer`]**: [`LayerState`](layer::LayerState) and its value types
//! (annotations, gradient, filters, sort order).
//!
//! **[`view`]**: pure derivation of the visible, filtered, and sorted
//! techniques of a tactic, and of effective (rolled-up) scores.
//!
//! **[`session`]**: [`LayerSession`](session::LayerSession), which owns a
//! layer together with its catalog handle, configuration, and observers, and
//! implements the click semantics for techniques and tactics.
//!
//! **[`events`]**: the publish/subscribe channel for selection and highlight
//! changes.
//!
//! **[`version`]**: layer format versions and their compatibility
//! classification.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! engine diagnostics, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod session;
pub mod trace;
pub mod version;
pub mod view;

pub use error::LayerError;
