use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if !s.is_ascii() || (s.len() != 6 && s.len() != 8) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        let a = if s.len() == 8 { byte(6)? as f64 / 255.0 } else { 1.0 };
        Some(Self { r: byte(0)?, g: byte(2)?, b: byte(4)?, a })
    }

    /// Like [`parse`](Self::parse) but black on malformed input.
    pub fn hex(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn to_svg_fill(&self) -> String {
        if (self.a - 1.0).abs() < 1e-6 {
            self.to_hex()
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance in [0, 1], used to pick readable text on a fill.
    pub fn luminance(&self) -> f64 {
        (0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
    }

    /// Linear interpolation between two colors.
    pub fn lerp(a: Color, b: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f64 * (1.0 - t) + y as f64 * t).round() as u8;
        Color { r: mix(a.r, b.r), g: mix(a.g, b.g), b: mix(a.b, b.b), a: a.a * (1.0 - t) + b.a * t }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg_fill())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if (self.a - 1.0).abs() < 1e-6 {
            serializer.serialize_str(&self.to_hex())
        } else {
            let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
            serializer.serialize_str(&format!("{}{a:02x}", self.to_hex()))
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{s}', expected #RRGGBB")))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// --- Sequential colormaps for 2D maps ---

const VIRIDIS: &[&str] = &["#440154", "#3b528b", "#21918c", "#5ec962", "#fde725"];
const INFERNO: &[&str] = &["#000004", "#57106e", "#bc3754", "#f98e09", "#fcffa4"];
// Blue to yellow, close to ROOT's kBird.
const BIRD: &[&str] = &[
    "#352a87", "#0f5cdd", "#1481d6", "#06a4ca", "#2eb7a4", "#87bf77", "#d1bb59", "#fec832",
    "#f9fb0e",
];
const GREYS: &[&str] = &["#ffffff", "#000000"];

/// Sample a named sequential colormap at `t` in [0, 1].
///
/// Known names: `viridis`, `inferno`, `bird`, `greys`. Anything else falls
/// back to `viridis`.
pub fn colormap(name: &str, t: f64) -> Color {
    let stops = match name.to_lowercase().as_str() {
        "inferno" => INFERNO,
        "bird" => BIRD,
        "greys" | "grays" => GREYS,
        _ => VIRIDIS,
    };
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let span = (stops.len() - 1) as f64;
    let pos = t * span;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    Color::lerp(Color::hex(stops[i]), Color::hex(stops[i + 1]), pos - i as f64)
}

pub fn is_known_colormap(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "viridis" | "inferno" | "bird" | "greys" | "grays")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let c = Color::hex("#1D4ED8");
        assert_eq!((c.r, c.g, c.b), (0x1D, 0x4E, 0xD8));
        assert!((c.a - 1.0).abs() < 1e-9);

        let c = Color::parse("1d4ed880").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(Color::parse("#12").is_none());
        assert!(Color::parse("#zzzzzz").is_none());
        assert!(Color::parse("#ééé").is_none());
        assert_eq!(Color::hex("nope"), Color::BLACK);
    }

    #[test]
    fn svg_fill_alpha() {
        assert_eq!(Color::rgb(29, 78, 216).to_svg_fill(), "#1d4ed8");
        assert_eq!(Color::rgb(29, 78, 216).with_alpha(0.5).to_svg_fill(), "rgba(29,78,216,0.500)");
    }

    #[test]
    fn colormap_endpoints() {
        assert_eq!(colormap("viridis", 0.0), Color::hex("#440154"));
        assert_eq!(colormap("viridis", 1.0), Color::hex("#fde725"));
        assert_eq!(colormap("greys", 0.5), Color::rgb(128, 128, 128));
        assert_eq!(colormap("unknown", 1.0), colormap("viridis", 1.0));
        assert_eq!(colormap("bird", f64::NAN), Color::hex("#352a87"));
    }
}
