// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-cell annotations and partial updates.

use alloc::string::String;
use alloc::vec::Vec;

use super::gradient::Color;

/// A name/value pair attached to a cell or a layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataEntry {
    /// Entry name.
    pub name: String,
    /// Entry value.
    pub value: String,
}

impl MetadataEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A labelled hyperlink attached to a cell or a layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    /// Link text.
    pub label: String,
    /// Target URL. Not validated.
    pub url: String,
}

impl Link {
    /// Creates a link.
    #[must_use]
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Analyst-supplied state of one (technique, tactic) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Explicit color; overrides the gradient color of the score.
    pub color: Option<Color>,
    /// Numeric score. Always finite.
    pub score: Option<f64>,
    /// Whether the cell is enabled. Disabled cells are hidden when the
    /// layer's `hide_disabled` filter is on.
    pub enabled: bool,
    /// Free-form comment.
    pub comment: String,
    /// Ordered metadata entries.
    pub metadata: Vec<MetadataEntry>,
    /// Ordered links.
    pub links: Vec<Link>,
    /// Whether the technique's sub-techniques are expanded.
    pub show_subtechniques: bool,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            color: None,
            score: None,
            enabled: true,
            comment: String::new(),
            metadata: Vec::new(),
            links: Vec::new(),
            show_subtechniques: false,
        }
    }
}

impl Annotation {
    /// Returns whether every field still has its default value.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the fields set in `patch`, leaving the others untouched.
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(comment) = &patch.comment {
            self.comment.clone_from(comment);
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata.clone_from(metadata);
        }
        if let Some(links) = &patch.links {
            self.links.clone_from(links);
        }
        if let Some(show) = patch.show_subtechniques {
            self.show_subtechniques = show;
        }
    }
}

/// A partial update to an [`Annotation`].
///
/// `None` means "leave unchanged". For the nullable fields (`color`,
/// `score`), `Some(None)` clears the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationPatch {
    /// New color, or `Some(None)` to clear.
    pub color: Option<Option<Color>>,
    /// New score, or `Some(None)` to clear.
    pub score: Option<Option<f64>>,
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New comment.
    pub comment: Option<String>,
    /// Replacement metadata list.
    pub metadata: Option<Vec<MetadataEntry>>,
    /// Replacement link list.
    pub links: Option<Vec<Link>>,
    /// New sub-technique expansion flag.
    pub show_subtechniques: Option<bool>,
}

impl AnnotationPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the score.
    #[must_use]
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(Some(score));
        self
    }

    /// Clears the score.
    #[must_use]
    pub fn clear_score(mut self) -> Self {
        self.score = Some(None);
        self
    }

    /// Sets the explicit color.
    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(Some(color));
        self
    }

    /// Clears the explicit color.
    #[must_use]
    pub fn clear_color(mut self) -> Self {
        self.color = Some(None);
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Replaces the metadata list.
    #[must_use]
    pub fn metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Replaces the link list.
    #[must_use]
    pub fn links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }

    /// Sets the sub-technique expansion flag.
    #[must_use]
    pub fn show_subtechniques(mut self, show: bool) -> Self {
        self.show_subtechniques = Some(show);
        self
    }

    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combines two patches; fields set in `later` win.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            color: later.color.or(self.color),
            score: later.score.or(self.score),
            enabled: later.enabled.or(self.enabled),
            comment: later.comment.or(self.comment),
            metadata: later.metadata.or(self.metadata),
            links: later.links.or(self.links),
            show_subtechniques: later.show_subtechniques.or(self.show_subtechniques),
        }
    }

    /// Returns the score being set, if it is not a finite number.
    pub(crate) fn non_finite_score(&self) -> Option<f64> {
        match self.score {
            Some(Some(score)) if !score.is_finite() => Some(score),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn apply_leaves_unspecified_fields() {
        let mut annotation = Annotation {
            comment: String::from("keep"),
            score: Some(3.0),
            ..Annotation::default()
        };
        annotation.apply(&AnnotationPatch::new().enabled(false));
        assert_eq!(annotation.comment, "keep");
        assert_eq!(annotation.score, Some(3.0));
        assert!(!annotation.enabled);
    }

    #[test]
    fn nullable_fields_can_be_cleared() {
        let mut annotation = Annotation {
            score: Some(3.0),
            color: Some(Color::rgb(1, 2, 3)),
            ..Annotation::default()
        };
        annotation.apply(&AnnotationPatch::new().clear_score().clear_color());
        assert!(annotation.is_default());
    }

    #[test]
    fn disjoint_patches_commute_with_merge() {
        let first = AnnotationPatch::new()
            .score(7.5)
            .links(vec![Link::new("ref", "https://example.org")]);
        let second = AnnotationPatch::new()
            .comment("seen in the wild")
            .metadata(vec![MetadataEntry::new("owner", "blue team")]);

        let mut sequential = Annotation::default();
        sequential.apply(&first);
        sequential.apply(&second);

        let mut reversed = Annotation::default();
        reversed.apply(&second);
        reversed.apply(&first);

        let mut merged = Annotation::default();
        merged.apply(&first.clone().merge(second.clone()));

        assert_eq!(sequential, merged);
        assert_eq!(reversed, merged);
    }

    #[test]
    fn merge_prefers_later_fields() {
        let merged = AnnotationPatch::new()
            .score(1.0)
            .merge(AnnotationPatch::new().score(2.0));
        assert_eq!(merged.score, Some(Some(2.0)));
        assert!(AnnotationPatch::new().is_empty());
    }
}
