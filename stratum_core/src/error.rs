// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by layer mutations and validation.

use alloc::string::String;

/// Error returned by [`LayerState`](crate::layer::LayerState) mutators and
/// validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// The (technique, tactic) pair does not exist in the catalog.
    #[error("technique `{technique}` does not exist under tactic `{tactic}`")]
    InvalidReference {
        /// Technique or sub-technique id.
        technique: String,
        /// Tactic id.
        tactic: String,
    },
    /// Malformed gradient, filter, color, or score value.
    #[error("validation failed: {0}")]
    ValidationFailure(String),
}

impl LayerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationFailure(message.into())
    }
}
