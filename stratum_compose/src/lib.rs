// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Score expressions and multi-layer composition.
//!
//! A new layer can be derived from existing ones by writing a score
//! expression over them, e.g. `a + b` or `(a - b) / 2`. Operands are named
//! by the caller; [`operand_name`] gives the conventional `a`, `b`, … names
//! by position.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use stratum_compose::{ComposeOptions, compose, operand_name};
//! use stratum_core::catalog::DomainVersion;
//! use stratum_core::layer::{Annotation, LayerState, TechniqueKey};
//!
//! let domain = DomainVersion::new("enterprise-attack", "13");
//! let key = TechniqueKey::new("T1059", "execution");
//!
//! let mut first = LayerState::new("first", domain.clone());
//! first.insert_annotation(key.clone(), Annotation { score: Some(2.0), ..Annotation::default() });
//! let second = LayerState::new("second", domain.clone());
//!
//! let operands = BTreeMap::from([(operand_name(0), &first), (operand_name(1), &second)]);
//! let result = compose("a * 3 + b", &operands, &domain, &ComposeOptions::default())?;
//! assert_eq!(result.annotation(&key).and_then(|a| a.score), Some(6.0));
//! # Ok::<(), stratum_compose::ComposeError>(())
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Reports finished compositions to a
//!   [`TraceSink`](stratum_core::trace::TraceSink).

#![no_std]

extern crate alloc;

mod compose;
mod expr;

pub use compose::{
    ComposeError, ComposeOptions, EnabledLogic, Inheritance, compose, compose_with_tracer, operand_name,
};
pub use expr::{BinaryOp, Expr, ExprError, MAX_DEPTH, validate_expression};
