//! RGBA colours
//!
//! Tile tables write colours either as a name (`"dark_gray"`) or as a hex
//! string (`"#RRGGBB"` / `"#RRGGBBAA"`). Blending is done in normalized
//! float space via glam.

use std::fmt;
use std::str::FromStr;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// An 8-bit-per-channel RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Look up a named colour (case-insensitive, `-`/space treated as `_`)
    pub fn named(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace(['-', ' '], "_");
        let color = match key.as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::rgb(255, 0, 0),
            "dark_red" => Color::rgb(139, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "dark_green" => Color::rgb(0, 100, 0),
            "blue" => Color::rgb(0, 0, 255),
            "dark_blue" => Color::rgb(0, 0, 139),
            "yellow" => Color::rgb(255, 255, 0),
            "gold" => Color::rgb(255, 215, 0),
            "orange" => Color::rgb(255, 165, 0),
            "brown" => Color::rgb(139, 69, 19),
            "cyan" => Color::rgb(0, 255, 255),
            "magenta" => Color::rgb(255, 0, 255),
            "purple" => Color::rgb(128, 0, 128),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "dark_gray" | "dark_grey" => Color::rgb(64, 64, 64),
            "light_gray" | "light_grey" => Color::rgb(192, 192, 192),
            "transparent" => Color::rgba(0, 0, 0, 0),
            _ => return None,
        };
        Some(color)
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Normalized [0, 1] channels
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32,
            self.g as f32,
            self.b as f32,
            self.a as f32,
        ) / 255.0
    }

    /// Inverse of [`Color::to_vec4`], clamping out-of-range channels
    pub fn from_vec4(v: Vec4) -> Self {
        let c = (v.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
        Self::rgba(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }

    /// Linear blend toward `other` (t = 0 keeps self, t = 1 gives other)
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::from_vec4(self.to_vec4().lerp(other.to_vec4(), t.clamp(0.0, 1.0)))
    }

    /// Scale RGB by `factor`, keeping alpha
    pub fn scale(self, factor: f32) -> Self {
        let mut v = self.to_vec4();
        let alpha = v.w;
        v *= factor.max(0.0);
        v.w = alpha;
        Self::from_vec4(v)
    }

    /// Blend toward black by `ratio` (0 = unchanged, 1 = black), keeping alpha
    pub fn dimmed(self, ratio: f32) -> Self {
        self.scale(1.0 - ratio.clamp(0.0, 1.0))
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            Self::from_hex(trimmed)
        } else {
            Self::named(trimmed)
        }
        .ok_or_else(|| Error::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
