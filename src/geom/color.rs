//! Display colors for cluster rectangles and point clouds.
//!
//! [`color_for`] derives a stable color from a cluster identifier; [`palette`]
//! produces evenly hue-spaced colors when a whole set is colored client-side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lowest value any channel of a hash-derived color may take, so that colors
/// stay visible against the dark canvas.
pub const BRIGHTNESS_FLOOR: u8 = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color `{0}`, expected #rrggbb")]
pub struct ColorParseError(pub String);

/// 8-bit RGB color, serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::from_hex_u32(0xff_ff_ff);
    pub const GRAY: Self = Self::from_hex_u32(0x80_80_80);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn from_hex_u32(value: u32) -> Self {
        Self::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        )
    }

    /// Builds a color from unit-range channels, clamping out-of-range input.
    #[must_use]
    pub fn from_unit_rgb(rgb: [f64; 3]) -> Self {
        let to_byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    #[must_use]
    pub const fn min_channel(self) -> u8 {
        let rg = if self.r < self.g { self.r } else { self.g };
        if rg < self.b { rg } else { self.b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorParseError(s.to_owned()))?;
        let value = u32::from_str_radix(digits, 16).map_err(|_| ColorParseError(s.to_owned()))?;
        Ok(Self::from_hex_u32(value))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Deterministic color for a cluster identifier.
///
/// The identifier is hashed with 32-bit FNV-1a; the low three bytes become the
/// channels, rescaled into `[BRIGHTNESS_FLOOR, 255]`.
#[must_use]
pub fn color_for(cluster_id: &str) -> Color {
    let hash = fnv1a(cluster_id.as_bytes());
    let scale = |byte: u32| {
        let span = u32::from(255 - BRIGHTNESS_FLOOR);
        (u32::from(BRIGHTNESS_FLOOR) + (byte & 0xff) * span / 255) as u8
    };
    Color::new(scale(hash >> 16), scale(hash >> 8), scale(hash))
}

fn fnv1a(bytes: &[u8]) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    bytes
        .iter()
        .fold(OFFSET, |hash, &byte| (hash ^ u32::from(byte)).wrapping_mul(PRIME))
}

/// `count` colors with hues spaced `360° / count` apart.
///
/// Saturation and lightness alternate slightly so neighbouring entries stay
/// distinguishable when `count` is large.
#[must_use]
pub fn palette(count: usize) -> Vec<Color> {
    (0..count)
        .map(|i| {
            let hue = i as f64 / count as f64;
            let saturation = 0.7 + 0.1 * (i % 3) as f64;
            let lightness = 0.5 + 0.1 * (i % 2) as f64;
            Color::from_unit_rgb(hsl_to_rgb(hue, saturation, lightness))
        })
        .collect()
}

/// HSL to unit-range RGB. Saturation and lightness are in `[0, 1]`; the hue
/// is a fraction of a full turn and wraps.
#[must_use]
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> [f64; 3] {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue.rem_euclid(1.0) * 6.0;
    let secondary = chroma * (1.0 - (sector % 2.0 - 1.0).abs());

    let (r, g, b) = match sector as u8 {
        0 => (chroma, secondary, 0.0),
        1 => (secondary, chroma, 0.0),
        2 => (0.0, chroma, secondary),
        3 => (0.0, secondary, chroma),
        4 => (secondary, 0.0, chroma),
        _ => (chroma, 0.0, secondary),
    };
    let base = lightness - chroma / 2.0;
    [r + base, g + base, b + base]
}
