//! RGBA colors, the named palette, and hex parsing.

use serde::Deserialize;

/// An 8-bit-per-channel RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Return the same color with a different alpha value.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const CLEAR: Self = Self::rgba(0, 0, 0, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const YELLOW: Self = Self::rgb(255, 235, 4);

    /// Build a color from channel values on the 0-255 scale.
    ///
    /// Values are clamped and rounded, so `300.0` saturates to 255.
    pub fn from_channels(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::rgba(channel(r), channel(g), channel(b), channel(a))
    }

    /// Look up a palette color by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        PALETTE
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, color)| *color)
    }

    /// `RRGGBB` in upper-case hex, without the leading `#`.
    pub fn to_hex_rgb(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Named colors accepted by [`Color::from_name`].
pub const PALETTE: &[(&str, Color)] = &[
    ("black", Color::BLACK),
    ("blue", Color::BLUE),
    ("clear", Color::CLEAR),
    ("cyan", Color::CYAN),
    ("gray", Color::GRAY),
    ("green", Color::GREEN),
    ("grey", Color::GRAY),
    ("magenta", Color::MAGENTA),
    ("red", Color::RED),
    ("white", Color::WHITE),
    ("yellow", Color::YELLOW),
];

fn channel(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

/// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#')?;
    if !s.is_ascii() {
        return None;
    }
    let short = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).ok().map(|v| v * 17);
    let long = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        3 => Some(Color::rgb(short(0)?, short(1)?, short(2)?)),
        4 => Some(Color::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
        6 => Some(Color::rgb(long(0)?, long(2)?, long(4)?)),
        8 => Some(Color::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
        _ => None,
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        parse_hex_color(&value)
            .or_else(|| Color::from_name(&value))
            .ok_or_else(|| format!("invalid color: {value}"))
    }
}
