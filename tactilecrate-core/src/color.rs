//! RGB color value type

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGB color.
///
/// Colors order lexicographically by `(r, g, b)`, which is the order distinct
/// colors are enumerated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels as floating point values, for centroid arithmetic.
    pub fn to_f64(self) -> [f64; 3] {
        [self.r as f64, self.g as f64, self.b as f64]
    }

    /// Squared Euclidean distance in RGB space. Exact, so it is safe to use
    /// for tie-sensitive comparisons.
    pub fn distance_squared(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Euclidean distance in RGB space.
    pub fn distance(self, other: Color) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Snap every channel to the centre of its bucket of width `radius`.
    ///
    /// With `radius = 16`, values 0..=15 become 8, 16..=31 become 24 and so on.
    /// A radius of 0 or 1 leaves the color unchanged.
    pub fn grouped(self, radius: u8) -> Color {
        if radius <= 1 {
            return self;
        }
        let snap = |c: u8| -> u8 {
            let r = radius as u16;
            ((c as u16 / r) * r + r / 2).min(255) as u8
        };
        Color::new(snap(self.r), snap(self.g), snap(self.b))
    }

    /// Lowercase `#rrggbb` representation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` or `rrggbb` (case insensitive).
    pub fn from_hex(hex: &str) -> Result<Color> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::InvalidData(format!("'{hex}' is not a #rrggbb color")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| Error::InvalidData(format!("'{hex}' is not a #rrggbb color")))
        };
        Ok(Color::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::from_hex(s)
    }
}

impl From<[u8; 3]> for Color {
    fn from(c: [u8; 3]) -> Self {
        Color::new(c[0], c[1], c[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        c.channels()
    }
}
