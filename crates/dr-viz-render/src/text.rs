//! Approximate text metrics for layout.
//!
//! Fonts are resolved at raster time from the system font database, so the
//! exact face is unknown while laying out. Widths use per-glyph advance
//! factors typical of sans-serif faces; this is good enough for margins and
//! box sizes.

use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Advance width of `ch` in ems.
fn advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | 'I' => 0.28,
        ' ' | 'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.34,
        'm' | 'w' | 'M' | 'W' | '%' | '@' => 0.86,
        '0'..='9' | '±' | '+' | '=' | '<' | '>' => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_lowercase() => 0.53,
        // Superscript digits and signs.
        '\u{2070}'..='\u{209F}' | '\u{00B2}' | '\u{00B3}' | '\u{00B9}' => 0.36,
        _ => 0.6,
    }
}

/// Measure `text` in points for the size and weight of `style`.
pub fn measure_text(text: &str, style: &TextStyle) -> TextMetrics {
    let bold = if style.weight == FontWeight::Bold { 1.07 } else { 1.0 };
    let ems: f64 = text.chars().map(advance).sum();
    TextMetrics {
        width: ems * style.size * bold,
        height: style.size * 1.2,
        ascent: style.size * 0.93,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_hello() {
        let m = measure_text("Hello", &TextStyle::sized(12.0));
        assert!(m.width > 20.0 && m.width < 45.0, "{}", m.width);
        assert!(m.height > 12.0);
        assert!(m.ascent > 0.0);
    }

    #[test]
    fn bold_is_wider() {
        let r = measure_text("Entries", &TextStyle::sized(10.0));
        let bold = TextStyle { weight: FontWeight::Bold, ..TextStyle::sized(10.0) };
        let b = measure_text("Entries", &bold);
        assert!(b.width > r.width);
    }

    #[test]
    fn wide_glyphs_measure_wider() {
        let s = TextStyle::sized(10.0);
        assert!(measure_text("mmmm", &s).width > measure_text("iiii", &s).width);
        assert_eq!(measure_text("", &s).width, 0.0);
    }
}
