use dr_viz::Hist2dArtifact;

use crate::RenderError;
use crate::canvas::Canvas;
use crate::color;
use crate::config::VizConfig;
use crate::header::draw_header;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;
use crate::text::measure_text;

use super::axes_draw::{draw_axes, draw_frame};

const COLORBAR_W: f64 = 12.0;
const COLORBAR_GAP: f64 = 8.0;
const COLORBAR_STEPS: usize = 64;

/// Color map of a 2D histogram with a color bar on the right. Empty cells
/// stay blank.
pub fn render(art: &Hist2dArtifact, config: &VizConfig) -> crate::Result<String> {
    validate(art)?;
    let (nx, ny) = (art.x_edges.len() - 1, art.y_edges.len() - 1);

    let x_axis =
        Axis::bounded(art.x_edges[0], art.x_edges[nx], 7).with_label(art.x_label.as_str());
    let y_axis =
        Axis::bounded(art.y_edges[0], art.y_edges[ny], 7).with_label(art.y_label.as_str());
    let z_axis = z_axis_for(art, config.hist2d.log_z);

    let tick_style = TextStyle::sized(config.font.tick_size);
    let z_label_w = z_axis
        .tick_labels
        .iter()
        .map(|l| measure_text(l, &tick_style).width)
        .fold(0.0_f64, f64::max);
    let reserve = COLORBAR_GAP + COLORBAR_W + 4.0 + z_label_w;

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?;
    let area = PlotArea::auto(&canvas, &x_axis, &y_axis, reserve, config);

    let cmap = config.hist2d.colormap.as_str();
    canvas.push_clip(area.left, area.top, area.width, area.height);
    for (iy, row) in art.z.iter().enumerate() {
        let y_top = y_axis.data_to_pixel(art.y_edges[iy + 1], area.bottom(), area.top);
        let y_bot = y_axis.data_to_pixel(art.y_edges[iy], area.bottom(), area.top);
        for (ix, &z) in row.iter().enumerate() {
            if z <= 0.0 {
                continue;
            }
            let x_lo = x_axis.data_to_pixel(art.x_edges[ix], area.left, area.right());
            let x_hi = x_axis.data_to_pixel(art.x_edges[ix + 1], area.left, area.right());
            let fill = color::colormap(cmap, z_axis.fraction(z));
            // Overlap by a hair so antialiasing leaves no seams.
            canvas.rect(x_lo, y_top, x_hi - x_lo + 0.3, y_bot - y_top + 0.3, &Style::filled(fill));
        }
    }
    canvas.pop_clip();

    let mut axes_config = config.clone();
    axes_config.grid.show = false;
    draw_axes(&mut canvas, &area, &x_axis, &y_axis, &axes_config);
    draw_header(&mut canvas, &area, &art.title, config);
    draw_colorbar(&mut canvas, &area, &z_axis, cmap, config);

    canvas.finish_svg()
}

fn validate(art: &Hist2dArtifact) -> crate::Result<()> {
    let fail = |what: &str| Err(RenderError::Layout(format!("histogram '{}': {what}", art.name)));
    if art.x_edges.len() < 2 || art.y_edges.len() < 2 {
        return fail("no bins");
    }
    let (nx, ny) = (art.x_edges.len() - 1, art.y_edges.len() - 1);
    if art.z.len() != ny || art.z.iter().any(|row| row.len() != nx) {
        return fail("cell grid does not match the bin edges");
    }
    let increasing = |e: &[f64]| e.windows(2).all(|w| w[0].is_finite() && w[1] > w[0]);
    if !increasing(art.x_edges.as_slice()) || !increasing(art.y_edges.as_slice()) {
        return fail("bin edges must be finite and strictly increasing");
    }
    if art.z.iter().flatten().any(|v| !v.is_finite()) {
        return fail("non-finite cell content");
    }
    Ok(())
}

fn z_axis_for(art: &Hist2dArtifact, log_z: bool) -> Axis {
    let z_max = if art.z_max > 0.0 { art.z_max } else { 1.0 };
    if log_z {
        let z_min = art.z.iter().flatten().copied().filter(|&v| v > 0.0).fold(z_max, f64::min);
        Axis::auto_log(z_min, z_max)
    } else {
        Axis::bounded(0.0, z_max, 6)
    }
}

fn draw_colorbar(
    canvas: &mut Canvas,
    area: &PlotArea,
    z_axis: &Axis,
    cmap: &str,
    config: &VizConfig,
) {
    let x = area.right() + COLORBAR_GAP;
    let step_h = area.height / COLORBAR_STEPS as f64;
    for i in 0..COLORBAR_STEPS {
        // Top of the bar is the maximum.
        let t = 1.0 - (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        let y = area.top + i as f64 * step_h;
        canvas.rect(x, y, COLORBAR_W, step_h + 0.5, &Style::filled(color::colormap(cmap, t)));
    }
    let bar = PlotArea { left: x, top: area.top, width: COLORBAR_W, height: area.height };
    draw_frame(canvas, &bar, &LineStyle::solid(config.colors.foreground, 0.6));

    let label_style = TextStyle {
        size: config.font.tick_size,
        color: config.colors.foreground,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let tick = LineStyle::solid(config.colors.foreground, 0.5);
    for (val, label) in z_axis.tick_positions.iter().zip(&z_axis.tick_labels) {
        if !z_axis.contains(*val) {
            continue;
        }
        let py = z_axis.data_to_pixel(*val, bar.bottom(), bar.top);
        canvas.line(bar.right() - 3.0, py, bar.right(), py, &tick);
        canvas.text(bar.right() + 3.0, py, label, &label_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_hist::{AxisLabels, Binning, Histogram2D};
    use dr_viz::hist2d_artifact;

    fn artifact() -> Hist2dArtifact {
        let mut h = Histogram2D::new(
            "n2DHitS",
            Binning::new(10, 0.0, 25.0).unwrap(),
            Binning::new(10, 0.0, 25.0).unwrap(),
        )
        .with_labels(AxisLabels::new("Hit map", "x [mm]", "y [mm]"));
        h.fill_weighted(5.0, 7.5, 40.0);
        h.fill_weighted(12.0, 12.0, 400.0);
        h.fill_weighted(20.0, 2.0, 1.0);
        hist2d_artifact(&h.finalize())
    }

    #[test]
    fn only_filled_cells_are_drawn() {
        let svg = render(&artifact(), &VizConfig::default()).unwrap();
        // Only the three filled cells sit inside the clip group.
        let group = svg.split("clip-path").nth(1).unwrap();
        let cells = group.split("</g>").next().unwrap().matches("<rect").count();
        assert_eq!(cells, 3);
        assert!(svg.contains(">x [mm]</text>"));
        assert!(svg.contains(">Hit map</text>"));
    }

    #[test]
    fn colorbar_spans_zero_to_max() {
        let svg = render(&artifact(), &VizConfig::default()).unwrap();
        let top = color::colormap("bird", 1.0 - 0.5 / COLORBAR_STEPS as f64).to_svg_fill();
        assert!(svg.contains(&format!("fill=\"{top}\"")));
        assert!(svg.contains(">400</text>"));
        assert!(svg.contains(">0</text>"));
    }

    #[test]
    fn log_z_uses_decade_labels() {
        let mut config = VizConfig::default();
        config.hist2d.log_z = true;
        let svg = render(&artifact(), &config).unwrap();
        assert!(svg.contains(">10\u{00B2}</text>"));
    }

    #[test]
    fn empty_map_renders() {
        let mut art = artifact();
        art.z.iter_mut().flatten().for_each(|v| *v = 0.0);
        art.z_max = 0.0;
        render(&art, &VizConfig::default()).unwrap();
    }

    #[test]
    fn ragged_grid_is_rejected() {
        let mut art = artifact();
        art.z[3].pop();
        assert!(matches!(render(&art, &VizConfig::default()), Err(RenderError::Layout(_))));
    }
}
