// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer data model.
//!
//! A *layer* is one scored, colored overlay on the technique matrix. Each
//! [`LayerState`] has:
//!
//! - Identity and provenance: name, description, the [`DomainVersion`] it
//!   targets, and the [`FormatVersion`] of its schema.
//! - **Annotations** keyed by [`TechniqueKey`], a (technique, tactic) pair.
//!   A technique that appears under two tactics carries two independent
//!   annotations.
//! - **Interaction state**: the selection set and at most one highlighted
//!   pair. The two are independent flags.
//! - **Controls**: [`Filters`], [`SortOrder`], [`SelectionBehavior`], and the
//!   [`Gradient`] used to paint scores.
//! - **Presentation** data (legend, layout, layer-level metadata and links)
//!   that the engine passes through unmodified.
//!
//! Every key held by a layer must reference a pair that exists in the
//! catalog. Live mutations reject unknown pairs with
//! [`LayerError::InvalidReference`](crate::LayerError::InvalidReference);
//! bulk loads drop them with [`LayerState::retain_known`].
//!
//! [`DomainVersion`]: crate::catalog::DomainVersion
//! [`FormatVersion`]: crate::version::FormatVersion

mod annotation;
mod controls;
mod gradient;
mod key;
mod presentation;
mod state;

pub use annotation::{Annotation, AnnotationPatch, Link, MetadataEntry};
pub use controls::{Filters, SelectionBehavior, SortOrder};
pub use gradient::{Aggregation, Color, Gradient};
pub use key::TechniqueKey;
pub use presentation::{Layout, LegendItem, Presentation};
pub use state::{LayerState, StaleReport};
