//! Colors and stroke/fill styles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA8 color, serialized as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`, or the keyword `transparent`.
    pub fn from_hex(color: &str) -> Option<Self> {
        let color = color.trim();
        if color.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }
        let hex = color.strip_prefix('#')?;
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
        match hex.len() {
            3 => {
                let r = channel(0..1)?;
                let g = channel(1..2)?;
                let b = channel(2..3)?;
                Some(Self::new(r * 17, g * 17, b * 17, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Hex form without alpha (`#rrggbb`), as used by SVG `fill`/`stroke`.
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a 0.0..=1.0 fraction.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

impl fmt::Display for SerializableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.to_rgb_hex())
        } else {
            write!(f, "{}{:02x}", self.to_rgb_hex(), self.a)
        }
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

/// Style properties for scene objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    #[serde(default)]
    pub fill: Option<SerializableColor>,
    /// Stroke color.
    pub stroke: SerializableColor,
    /// Stroke width in world units.
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: SerializableColor::new(30, 30, 30, 255),
            stroke_width: 2.0,
            opacity: 1.0,
        }
    }
}

impl ShapeStyle {
    /// Outline-only style with the given color and width.
    pub fn stroke_only(stroke: SerializableColor, stroke_width: f64) -> Self {
        Self {
            fill: None,
            stroke,
            stroke_width,
            opacity: 1.0,
        }
    }

    /// Same style with a fill color.
    pub fn with_fill(mut self, fill: SerializableColor) -> Self {
        self.fill = Some(fill);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(
            SerializableColor::from_hex("#fff"),
            Some(SerializableColor::white())
        );
        assert_eq!(
            SerializableColor::from_hex("#1e90ff"),
            Some(SerializableColor::new(0x1e, 0x90, 0xff, 255))
        );
        assert_eq!(
            SerializableColor::from_hex("#00000080"),
            Some(SerializableColor::new(0, 0, 0, 0x80))
        );
        assert_eq!(
            SerializableColor::from_hex("transparent"),
            Some(SerializableColor::transparent())
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SerializableColor::from_hex("red").is_none());
        assert!(SerializableColor::from_hex("#12345").is_none());
        assert!(SerializableColor::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&SerializableColor::new(255, 0, 0, 128)).unwrap();
        assert_eq!(json, "\"#ff000080\"");
        let back: SerializableColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SerializableColor::new(255, 0, 0, 128));
    }
}
