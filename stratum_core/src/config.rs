// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Session configuration.

/// Feature switches for a [`LayerSession`](crate::session::LayerSession).
///
/// Disabled features turn the corresponding session calls into no-ops rather
/// than errors, so a read-only viewer can share code with an editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    /// Whether clicks change the selection.
    pub selecting_techniques: bool,
    /// Whether hovering changes the highlight.
    pub highlighting: bool,
}

impl SessionConfig {
    /// An interactive editor: selection and highlight both enabled.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            selecting_techniques: true,
            highlighting: true,
        }
    }

    /// A viewer that only highlights.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            selecting_techniques: false,
            highlighting: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::standard()
    }
}
