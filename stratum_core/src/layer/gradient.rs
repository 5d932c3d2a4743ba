// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors, score gradients, and sub-technique score aggregation.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::error::LayerError;

/// An sRGB color with alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Creates a color with alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb`, or `#rrggbbaa` (the `#` is optional).
    pub fn parse(text: &str) -> Result<Self, LayerError> {
        let hex = text.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || LayerError::invalid(format!("`{text}` is not a hex color"));
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize, width: usize| -> Result<u8, LayerError> {
            let digits = &hex[i..i + width];
            let value = u8::from_str_radix(digits, 16).map_err(|_| bad())?;
            // `#abc` expands each digit: a → aa.
            Ok(if width == 1 { value * 0x11 } else { value })
        };
        match hex.len() {
            3 => Ok(Self::rgb(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
            6 => Ok(Self::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            8 => Ok(Self::rgba(
                channel(0, 2)?,
                channel(2, 2)?,
                channel(4, 2)?,
                channel(6, 2)?,
            )),
            _ => Err(bad()),
        }
    }

    /// Returns black or white, whichever has the higher contrast ratio
    /// against `self`. Alpha is ignored.
    ///
    /// The sRGB transfer curve is approximated by a square.
    #[must_use]
    pub fn readable_text(self) -> Self {
        let linear = |channel: u8| {
            let v = f64::from(channel) / 255.0;
            v * v
        };
        let luminance = 0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b);
        // (L + 0.05) / 0.05 against black vs 1.05 / (L + 0.05) against white.
        if (luminance + 0.05) * (luminance + 0.05) > 1.05 * 0.05 {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1).
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let value = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "value is within 0..=255 and rounded by the +0.5 offset"
            )]
            let rounded = (value + 0.5) as u8;
            rounded
        };
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl FromStr for Color {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// How a parent technique's score is derived from its sub-techniques when
/// the parent has no explicit score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Arithmetic mean.
    #[default]
    Average,
    /// Smallest score.
    Min,
    /// Largest score.
    Max,
    /// Sum of scores.
    Sum,
}

impl Aggregation {
    /// Returns the layer-file name of this function.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
        }
    }

    /// Parses a layer-file name.
    pub fn parse(name: &str) -> Result<Self, LayerError> {
        match name {
            "average" => Ok(Self::Average),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            other => Err(LayerError::invalid(format!(
                "unknown aggregate function `{other}`"
            ))),
        }
    }

    /// Applies the function. Returns `None` for an empty input.
    #[must_use]
    pub fn apply(self, scores: &[f64]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        let iter = scores.iter().copied();
        Some(match self {
            Self::Average => iter.sum::<f64>() / scores.len() as f64,
            Self::Min => iter.fold(f64::INFINITY, f64::min),
            Self::Max => iter.fold(f64::NEG_INFINITY, f64::max),
            Self::Sum => iter.sum(),
        })
    }
}

/// A color ramp over a numeric domain.
///
/// Invariants, checked by every constructor: at least two colors, finite
/// bounds, and `min_value < max_value`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    colors: Vec<Color>,
    min_value: f64,
    max_value: f64,
    aggregation: Aggregation,
    count_unscored: bool,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::rgb(0xff, 0x66, 0x66),
                Color::rgb(0xff, 0xe7, 0x66),
                Color::rgb(0x8e, 0xc8, 0x43),
            ],
            min_value: 0.0,
            max_value: 100.0,
            aggregation: Aggregation::Average,
            count_unscored: false,
        }
    }
}

impl Gradient {
    /// Creates a gradient, validating its invariants.
    pub fn new(colors: Vec<Color>, min_value: f64, max_value: f64) -> Result<Self, LayerError> {
        if colors.len() < 2 {
            return Err(LayerError::invalid(format!(
                "gradient needs at least two colors, got {}",
                colors.len()
            )));
        }
        if !min_value.is_finite() || !max_value.is_finite() {
            return Err(LayerError::invalid("gradient bounds must be finite"));
        }
        if min_value >= max_value {
            return Err(LayerError::invalid(format!(
                "gradient minimum {min_value} must be below maximum {max_value}"
            )));
        }
        Ok(Self {
            colors,
            min_value,
            max_value,
            aggregation: Aggregation::Average,
            count_unscored: false,
        })
    }

    /// Returns one of the named presets, spanning 0 to 100.
    ///
    /// Known names: `redgreen`, `greenred`, `bluered`, `redblue`,
    /// `transparentblue`, `transparentred`.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        const RED: Color = Color::rgb(0xff, 0x66, 0x66);
        const YELLOW: Color = Color::rgb(0xff, 0xe7, 0x66);
        const GREEN: Color = Color::rgb(0x8e, 0xc8, 0x43);
        const BLUE: Color = Color::rgb(0x66, 0xb1, 0xff);
        const PINK: Color = Color::rgb(0xff, 0x66, 0xf4);
        const CLEAR: Color = Color::rgba(0xff, 0xff, 0xff, 0x00);
        let colors = match name {
            "redgreen" => vec![RED, YELLOW, GREEN],
            "greenred" => vec![GREEN, YELLOW, RED],
            "bluered" => vec![BLUE, PINK, RED],
            "redblue" => vec![RED, PINK, BLUE],
            "transparentblue" => vec![CLEAR, BLUE],
            "transparentred" => vec![CLEAR, RED],
            _ => return None,
        };
        Self::new(colors, 0.0, 100.0).ok()
    }

    /// Sets the sub-technique aggregation function.
    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Sets whether unscored sub-techniques count as zero when aggregating.
    #[must_use]
    pub fn with_count_unscored(mut self, count_unscored: bool) -> Self {
        self.count_unscored = count_unscored;
        self
    }

    /// Returns the color stops.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Returns the lower bound of the domain.
    #[must_use]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Returns the upper bound of the domain.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Returns the sub-technique aggregation function.
    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Returns whether unscored sub-techniques count as zero.
    #[must_use]
    pub fn count_unscored(&self) -> bool {
        self.count_unscored
    }

    /// Maps a score onto the ramp. Scores outside the domain clamp to the
    /// end colors.
    #[must_use]
    pub fn color_for(&self, score: f64) -> Color {
        let span = self.max_value - self.min_value;
        let t = ((score - self.min_value) / span).clamp(0.0, 1.0);
        let segments = self.colors.len() - 1;
        let position = t * segments as f64;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "position is within 0..=segments"
        )]
        let index = (position as usize).min(segments - 1);
        self.colors[index].lerp(self.colors[index + 1], position - index as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readable_text_picks_the_stronger_contrast() {
        assert_eq!(Color::WHITE.readable_text(), Color::BLACK);
        assert_eq!(Color::rgb(0xdd, 0xdd, 0xdd).readable_text(), Color::BLACK);
        assert_eq!(Color::rgb(0xff, 0xe7, 0x66).readable_text(), Color::BLACK);
        assert_eq!(Color::BLACK.readable_text(), Color::WHITE);
        assert_eq!(Color::rgb(0x00, 0x00, 0x80).readable_text(), Color::WHITE);
        assert_eq!(Color::rgb(0x8b, 0x00, 0x00).readable_text(), Color::WHITE);
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse("#ff6666").unwrap(), Color::rgb(0xff, 0x66, 0x66));
        assert_eq!(Color::parse("abc").unwrap(), Color::rgb(0xaa, 0xbb, 0xcc));
        assert_eq!(
            Color::parse("#ff666680").unwrap(),
            Color::rgba(0xff, 0x66, 0x66, 0x80)
        );
        assert!(Color::parse("#ff66").is_err());
        assert!(Color::parse("#gg0000").is_err());
    }

    #[test]
    fn display_round_trips() {
        for text in ["#e60d0d", "#ffffff00"] {
            assert_eq!(alloc::format!("{}", Color::parse(text).unwrap()), text);
        }
    }

    #[test]
    fn gradient_rejects_bad_domain() {
        let colors = vec![Color::WHITE, Color::rgb(0, 0, 0)];
        assert!(Gradient::new(colors.clone(), 10.0, 10.0).is_err());
        assert!(Gradient::new(colors.clone(), 10.0, 0.0).is_err());
        assert!(Gradient::new(colors, 0.0, f64::NAN).is_err());
        assert!(Gradient::new(vec![Color::WHITE], 0.0, 1.0).is_err());
    }

    #[test]
    fn color_for_hits_stops_and_clamps() {
        let gradient = Gradient::default();
        assert_eq!(gradient.color_for(0.0), Color::rgb(0xff, 0x66, 0x66));
        assert_eq!(gradient.color_for(50.0), Color::rgb(0xff, 0xe7, 0x66));
        assert_eq!(gradient.color_for(100.0), Color::rgb(0x8e, 0xc8, 0x43));
        assert_eq!(gradient.color_for(-5.0), gradient.color_for(0.0));
        assert_eq!(gradient.color_for(500.0), gradient.color_for(100.0));
    }

    #[test]
    fn color_for_interpolates() {
        let gradient =
            Gradient::new(vec![Color::rgb(0, 0, 0), Color::rgb(200, 100, 0)], 0.0, 10.0).unwrap();
        assert_eq!(gradient.color_for(5.0), Color::rgb(100, 50, 0));
    }

    #[test]
    fn aggregation_functions() {
        let scores = [1.0, 4.0, 7.0];
        assert_eq!(Aggregation::Average.apply(&scores), Some(4.0));
        assert_eq!(Aggregation::Min.apply(&scores), Some(1.0));
        assert_eq!(Aggregation::Max.apply(&scores), Some(7.0));
        assert_eq!(Aggregation::Sum.apply(&scores), Some(12.0));
        assert_eq!(Aggregation::Sum.apply(&[]), None);
        assert_eq!(Aggregation::parse("max").unwrap(), Aggregation::Max);
        assert!(Aggregation::parse("median").is_err());
    }

    #[test]
    fn presets_are_valid() {
        for name in ["redgreen", "greenred", "bluered", "redblue", "transparentblue", "transparentred"] {
            assert!(Gradient::preset(name).is_some(), "{name} should be a preset");
        }
        assert!(Gradient::preset("rainbow").is_none());
    }
}
