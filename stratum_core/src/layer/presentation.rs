// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presentation data carried by a layer. The engine only derives the tactic
//! header text color from it.

use alloc::string::String;
use alloc::vec::Vec;

use super::annotation::{Link, MetadataEntry};
use super::gradient::Color;

/// One legend entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendItem {
    /// Legend text.
    pub label: String,
    /// Swatch color.
    pub color: Color,
}

/// Matrix layout options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Layout mode (`side`, `flat`, or `mini`).
    pub mode: String,
    /// Show technique ids in cells.
    pub show_id: bool,
    /// Show technique names in cells.
    pub show_name: bool,
    /// Show aggregate scores on parent techniques.
    pub show_aggregate_scores: bool,
    /// Which sub-techniques start expanded (`none`, `all`, or `annotated`).
    pub expanded_subtechniques: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            mode: String::from("side"),
            show_id: false,
            show_name: true,
            show_aggregate_scores: false,
            expanded_subtechniques: String::from("none"),
        }
    }
}

/// Layer-level presentation state, passed through unmodified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Presentation {
    /// Legend entries.
    pub legend_items: Vec<LegendItem>,
    /// Layout options.
    pub layout: Layout,
    /// Layer-level metadata.
    pub metadata: Vec<MetadataEntry>,
    /// Layer-level links.
    pub links: Vec<Link>,
    /// Tactic header background, when shown.
    pub tactic_row_background: Option<Color>,
}

impl Presentation {
    /// Returns the text color for the tactic header row, when it has a
    /// background.
    #[must_use]
    pub fn tactic_row_text(&self) -> Option<Color> {
        self.tactic_row_background.map(Color::readable_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tactic_row_text_follows_the_background() {
        let mut presentation = Presentation::default();
        assert_eq!(presentation.tactic_row_text(), None);
        presentation.tactic_row_background = Some(Color::rgb(0x20, 0x20, 0x40));
        assert_eq!(presentation.tactic_row_text(), Some(Color::WHITE));
        presentation.tactic_row_background = Some(Color::rgb(0xdd, 0xdd, 0xdd));
        assert_eq!(presentation.tactic_row_text(), Some(Color::BLACK));
    }
}
