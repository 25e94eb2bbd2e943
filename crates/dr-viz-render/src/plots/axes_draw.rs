use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Dashed grid lines at the major ticks. Drawn before the data.
pub fn draw_grid(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    if !config.grid.show {
        return;
    }
    let grid_style = LineStyle::dashed(config.grid.color.with_alpha(config.grid.alpha), 0.5);
    for &val in &x_axis.tick_positions {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if inside(px, area.left, area.right()) {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
    }
    for &val in &y_axis.tick_positions {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if inside(py, area.top, area.bottom()) {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
    }
}

fn inside(px: f64, lo: f64, hi: f64) -> bool {
    px >= lo - 0.5 && px <= hi + 0.5
}

/// Frame, major/minor ticks, tick labels and axis labels.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let fg = config.colors.foreground;
    let frame_style = LineStyle::solid(fg, 0.8);
    let major_style = LineStyle::solid(fg, 0.6);
    let minor_style = LineStyle::solid(fg, 0.4);

    // Tick direction: +1 into the frame, -1 outward.
    let dir = if config.axes.tick_direction == "in" { 1.0 } else { -1.0 };
    let outward = if dir > 0.0 { 0.0 } else { config.axes.tick_length };
    let tl = config.axes.tick_length * dir;
    let mtl = config.axes.minor_tick_length * dir;

    draw_frame(canvas, area, &frame_style);

    // --- X axis ---
    let x_label_style = TextStyle {
        size: config.font.tick_size,
        color: fg,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if !inside(px, area.left, area.right()) {
            continue;
        }
        canvas.line(px, area.bottom(), px, area.bottom() - tl, &major_style);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + tl, &major_style);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            canvas.text(px, area.bottom() + outward + 3.0, label, &x_label_style);
        }
    }
    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if !inside(px, area.left, area.right()) {
            continue;
        }
        canvas.line(px, area.bottom(), px, area.bottom() - mtl, &minor_style);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + mtl, &minor_style);
        }
    }

    // --- Y axis ---
    let y_label_style = TextStyle {
        size: config.font.tick_size,
        color: fg,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let mut widest_label = 0.0_f64;
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if !inside(py, area.top, area.bottom()) {
            continue;
        }
        canvas.line(area.left, py, area.left + tl, py, &major_style);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - tl, py, &major_style);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            canvas.text(area.left - outward - 4.0, py, label, &y_label_style);
            widest_label = widest_label.max(canvas.measure_text(label, &y_label_style).width);
        }
    }
    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if !inside(py, area.top, area.bottom()) {
            continue;
        }
        canvas.line(area.left, py, area.left + mtl, py, &minor_style);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - mtl, py, &minor_style);
        }
    }

    // --- Axis titles, flush with the far end like ROOT ---
    let title_style = TextStyle {
        size: config.font.label_size,
        color: fg,
        anchor: TextAnchor::End,
        ..Default::default()
    };
    if !x_axis.label.is_empty() {
        let y = area.bottom() + outward + config.font.tick_size + 6.0 + config.font.label_size;
        canvas.text(area.right(), y, &x_axis.label, &title_style);
    }
    if !y_axis.label.is_empty() {
        let x = area.left - outward - 4.0 - widest_label - 6.0;
        canvas.text_rotated(x, area.top, &y_axis.label, &title_style, -90.0);
    }
}

pub fn draw_frame(canvas: &mut Canvas, area: &PlotArea, style: &LineStyle) {
    canvas.line(area.left, area.top, area.right(), area.top, style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), style);
    canvas.line(area.left, area.top, area.left, area.bottom(), style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), style);
}
