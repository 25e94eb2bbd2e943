use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// One `key  value` row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub key: String,
    pub value: String,
}

impl StatsRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }
}

/// Draw a framed two-column box anchored at the top-right of the plot area.
///
/// Returns the box height so callers can stack a second box below it.
pub fn draw_stats_box(
    canvas: &mut Canvas,
    area: &PlotArea,
    y_offset: f64,
    rows: &[StatsRow],
    font_size: f64,
) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }

    let row_height = font_size + 3.0;
    let padding = 5.0;
    let gap = 10.0;

    let key_style =
        TextStyle { size: font_size, baseline: TextBaseline::Central, ..Default::default() };
    let value_style = TextStyle { anchor: TextAnchor::End, ..key_style.clone() };

    let mut key_w = 0.0_f64;
    let mut value_w = 0.0_f64;
    for r in rows {
        key_w = key_w.max(canvas.measure_text(&r.key, &key_style).width);
        value_w = value_w.max(canvas.measure_text(&r.value, &value_style).width);
    }

    let box_w = padding + key_w + gap + value_w + padding;
    let box_h = padding + rows.len() as f64 * row_height + padding;
    let bx = area.right() - box_w - 4.0;
    let by = area.top + 4.0 + y_offset;

    let bg = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.92)),
        stroke: Some(Color::rgb(120, 120, 120)),
        stroke_width: 0.6,
    };
    canvas.rect(bx, by, box_w, box_h, &bg);

    for (i, row) in rows.iter().enumerate() {
        let y = by + padding + (i as f64 + 0.5) * row_height;
        canvas.text(bx + padding, y, &row.key, &key_style);
        canvas.text(bx + box_w - padding, y, &row.value, &value_style);
    }
    box_h
}
