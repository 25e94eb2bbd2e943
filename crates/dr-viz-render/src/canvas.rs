use std::fmt::{self, Write as FmtWrite};

use crate::RenderError;
use crate::primitives::*;
use crate::text::{TextMetrics, measure_text};

/// Font stack written into every text element. The rasterizer picks the
/// first family present in the system font database.
pub const FONT_FAMILY: &str = "DejaVu Sans, Liberation Sans, Helvetica, Arial, sans-serif";

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect { x: f64, y: f64, w: f64, h: f64, style: Style },
    Line { x1: f64, y1: f64, x2: f64, y2: f64, style: LineStyle },
    Polyline { points: Vec<(f64, f64)>, style: LineStyle },
    Text { x: f64, y: f64, content: String, style: TextStyle, rotate: Option<f64> },
    Path { d: String, style: Style },
    Circle { cx: f64, cy: f64, r: f64, style: Style },
    Group { clip_id: String, children: Vec<SvgElement> },
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<SvgElement>,
    defs: Vec<String>,
    clip_stack: Vec<String>,
    next_clip_id: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(RenderError::Layout(format!("invalid canvas size {width}x{height}")));
        }
        Ok(Self {
            width,
            height,
            elements: Vec::new(),
            defs: Vec::new(),
            clip_stack: Vec::new(),
            next_clip_id: 0,
        })
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        self.push(SvgElement::Polyline { points: points.to_vec(), style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.push(SvgElement::Circle { cx, cy, r, style: style.clone() });
    }

    /// Closed region under the outline `top` down to the horizontal line
    /// `baseline` (used for filled histograms).
    pub fn fill_under(&mut self, top: &[(f64, f64)], baseline: f64, style: &Style) {
        let (Some(first), Some(last)) = (top.first(), top.last()) else {
            return;
        };
        let mut d = String::new();
        // Infallible: formatting into a String.
        let _ = write!(d, "M{:.2},{:.2}", first.0, baseline);
        for (x, y) in top {
            let _ = write!(d, " L{x:.2},{y:.2}");
        }
        let _ = write!(d, " L{:.2},{:.2} Z", last.0, baseline);
        self.push(SvgElement::Path { d, style: style.clone() });
    }

    /// Vertical error bar with optional caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap_width: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap_width > 0.0 {
            let half = cap_width / 2.0;
            self.line(x - half, y_lo, x + half, y_lo, style);
            self.line(x - half, y_hi, x + half, y_hi, style);
        }
    }

    /// Filled circular data marker.
    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        let style =
            Style { fill: Some(marker.color), stroke: Some(marker.color), stroke_width: 0.5 };
        self.circle(x, y, marker.size, &style);
    }

    // --- Clip paths ---

    /// Clip everything drawn until the matching [`pop_clip`](Self::pop_clip)
    /// to the given rectangle.
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.next_clip_id);
        self.next_clip_id += 1;
        self.defs.push(format!(
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
        ));
        self.clip_stack.push(id.clone());
        id
    }

    pub fn pop_clip(&mut self) {
        self.clip_stack.pop();
    }

    // --- Text measurement ---

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_text(content, style)
    }

    // --- SVG output ---

    fn push(&mut self, elem: SvgElement) {
        let Some(clip) = self.clip_stack.last() else {
            self.elements.push(elem);
            return;
        };
        if let Some(SvgElement::Group { clip_id, children }) = self.elements.last_mut()
            && clip_id == clip
        {
            children.push(elem);
            return;
        }
        self.elements.push(SvgElement::Group { clip_id: clip.clone(), children: vec![elem] });
    }

    /// Serialize the canvas to a standalone SVG document.
    pub fn finish_svg(&self) -> crate::Result<String> {
        let mut out = String::with_capacity(32 * 1024);
        self.write_svg(&mut out).map_err(|e| RenderError::Layout(e.to_string()))?;
        Ok(out)
    }

    fn write_svg(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        )?;

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }

        writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, self.width, self.height)?;

        for elem in &self.elements {
            render_element(out, elem)?;
        }

        out.push_str("</svg>\n");
        Ok(())
    }
}

fn render_element(out: &mut String, elem: &SvgElement) -> fmt::Result {
    match elem {
        SvgElement::Rect { x, y, w, h, style } => {
            write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#)?;
            write_style_attrs(out, style)?;
        }
        SvgElement::Line { x1, y1, x2, y2, style } => {
            write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#)?;
            write_line_attrs(out, style)?;
        }
        SvgElement::Polyline { points, style } => {
            out.push_str(r#"<polyline points=""#);
            for (i, (x, y)) in points.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write!(out, "{x:.2},{y:.2}")?;
            }
            out.push_str(r#"" fill="none""#);
            write_line_attrs(out, style)?;
        }
        SvgElement::Text { x, y, content, style, rotate } => {
            write!(out, r#"<text x="{x:.2}" y="{y:.2}""#)?;
            write!(out, r#" font-family="{FONT_FAMILY}" font-size="{:.1}""#, style.size)?;
            write!(out, r#" fill="{}""#, style.color.to_svg_fill())?;
            write!(out, r#" text-anchor="{}""#, style.anchor.as_str())?;
            write!(out, r#" dominant-baseline="{}""#, style.baseline.as_str())?;
            if style.weight == FontWeight::Bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if style.style == FontStyle::Italic {
                out.push_str(r#" font-style="italic""#);
            }
            if let Some(angle) = rotate {
                write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#)?;
            }
            out.push('>');
            escape_xml(out, content);
            out.push_str("</text>\n");
            return Ok(());
        }
        SvgElement::Path { d, style } => {
            write!(out, r#"<path d="{d}""#)?;
            write_style_attrs(out, style)?;
        }
        SvgElement::Circle { cx, cy, r, style } => {
            write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#)?;
            write_style_attrs(out, style)?;
        }
        SvgElement::Group { clip_id, children } => {
            writeln!(out, r#"<g clip-path="url(#{clip_id})">"#)?;
            for child in children {
                render_element(out, child)?;
            }
            out.push_str("</g>\n");
            return Ok(());
        }
    }
    out.push_str(" />\n");
    Ok(())
}

fn escape_xml(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn write_style_attrs(out: &mut String, style: &Style) -> fmt::Result {
    match &style.fill {
        Some(fill) => write!(out, r#" fill="{}""#, fill.to_svg_fill())?,
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        write!(out, r#" stroke="{}""#, stroke.to_svg_fill())?;
        write!(out, r#" stroke-width="{:.2}""#, style.stroke_width)?;
    }
    Ok(())
}

fn write_line_attrs(out: &mut String, style: &LineStyle) -> fmt::Result {
    write!(out, r#" stroke="{}""#, style.color.to_svg_fill())?;
    write!(out, r#" stroke-width="{:.2}""#, style.width)?;
    if let Some(dash) = &style.dash {
        write!(out, r#" stroke-dasharray="{dash}""#)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn empty_canvas() {
        let svg = Canvas::new(100.0, 50.0).unwrap().finish_svg().unwrap();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn rejects_degenerate_size() {
        assert!(Canvas::new(0.0, 50.0).is_err());
        assert!(Canvas::new(f64::NAN, 50.0).is_err());
    }

    #[test]
    fn rect_rendering() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.rect(10.0, 20.0, 50.0, 30.0, &Style::filled(Color::hex("#ff0000")));
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("width=\"50.00\""));
    }

    #[test]
    fn text_is_escaped() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        c.text(10.0, 20.0, "p < 5 & q", &TextStyle::default());
        let svg = c.finish_svg().unwrap();
        assert!(svg.contains("p &lt; 5 &amp; q"));
        assert!(svg.contains("font-family=\"DejaVu Sans"));
    }

    #[test]
    fn clipped_elements_are_grouped() {
        let mut c = Canvas::new(200.0, 100.0).unwrap();
        let id = c.push_clip(0.0, 0.0, 50.0, 50.0);
        c.line(0.0, 0.0, 100.0, 100.0, &LineStyle::default());
        c.circle(10.0, 10.0, 2.0, &Style::filled(Color::BLACK));
        c.pop_clip();
        c.line(0.0, 100.0, 100.0, 0.0, &LineStyle::default());
        let svg = c.finish_svg().unwrap();
        assert_eq!(svg.matches(&format!("clip-path=\"url(#{id})\"")).count(), 1);
        assert!(svg.contains("<clipPath id=\"clip0\">"));
        let group_end = svg.find("</g>").unwrap();
        let unclipped = svg.rfind("<line").unwrap();
        assert!(unclipped > group_end);
    }
}
