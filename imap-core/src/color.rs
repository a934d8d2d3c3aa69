//! Marker color derivation and the marker style table.
//!
//! Every marker's color is a pure function of its query's base color and
//! the feature's target type: `forte` targets are lightened, `regular`
//! targets darkened, each channel clamped to `0..=255`.

use crate::error::{Error, Result};
use crate::query::TargetType;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Percentage step applied to `forte` markers.
pub const LIGHTEN_PERCENT: u32 = 30;

/// Percentage step applied to `regular` markers.
pub const DARKEN_PERCENT: u32 = 20;

/// Base color used when a feature carries no (or an unreadable) query color.
pub const FALLBACK_COLOR: Rgb = Rgb(0x6B7280);

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub fn from_channels(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn channels(&self) -> [u8; 3] {
        [
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        ]
    }

    /// Raise every channel by `round(2.55 * percent)`, saturating at 255.
    pub fn lighten(self, percent: u32) -> Self {
        self.shift(channel_step(percent) as i32)
    }

    /// Lower every channel by `round(2.55 * percent)`, saturating at 0.
    pub fn darken(self, percent: u32) -> Self {
        self.shift(-(channel_step(percent) as i32))
    }

    fn shift(self, amount: i32) -> Self {
        let [r, g, b] = self.channels().map(|c| (c as i32 + amount).clamp(0, 255) as u8);
        Rgb::from_channels(r, g, b)
    }

    /// Parse a color, falling back to [`FALLBACK_COLOR`].
    pub fn parse_or_fallback(value: Option<&str>) -> Self {
        value
            .and_then(|s| s.parse().ok())
            .unwrap_or(FALLBACK_COLOR)
    }
}

// round(2.55 * percent) in integer arithmetic, half away from zero
fn channel_step(percent: u32) -> u32 {
    (255 * percent + 50) / 100
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|_| Error::InvalidColor(s.to_string()))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0 & 0xFF_FFFF)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Display color of a marker for `target` given its query's base color.
pub fn derive_marker_color(base: Rgb, target: TargetType) -> Rgb {
    match target {
        TargetType::Forte => base.lighten(LIGHTEN_PERCENT),
        TargetType::Regular => base.darken(DARKEN_PERCENT),
    }
}

/// Glyph drawn for a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    Circle,
    Square,
}

/// Size (px), opacity and glyph of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub size: u32,
    pub opacity: f32,
    pub shape: MarkerShape,
}

pub const AUXILIARY_STYLE: MarkerStyle = MarkerStyle {
    size: 8,
    opacity: 0.7,
    shape: MarkerShape::Square,
};

pub const MAIN_REGULAR_STYLE: MarkerStyle = MarkerStyle {
    size: 10,
    opacity: 0.85,
    shape: MarkerShape::Circle,
};

pub const MAIN_FORTE_STYLE: MarkerStyle = MarkerStyle {
    size: 14,
    opacity: 1.0,
    shape: MarkerShape::Circle,
};

/// Marker style lookup. Auxiliary markers share one style regardless of
/// target type.
pub fn marker_style(target: TargetType, is_auxiliary: bool) -> MarkerStyle {
    match (is_auxiliary, target) {
        (true, _) => AUXILIARY_STYLE,
        (false, TargetType::Regular) => MAIN_REGULAR_STYLE,
        (false, TargetType::Forte) => MAIN_FORTE_STYLE,
    }
}
