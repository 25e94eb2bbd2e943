use dr_viz::{FitOverlay, Hist1dArtifact, Hist1dStyle};

use crate::RenderError;
use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_header;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::layout::stats_box::{StatsRow, draw_stats_box};
use crate::primitives::*;

use super::axes_draw::{draw_axes, draw_grid};

pub fn render(art: &Hist1dArtifact, config: &VizConfig) -> crate::Result<String> {
    validate(art)?;
    let n = art.n_bins();
    let edges = &art.bin_edges;

    let x_axis = Axis::bounded(edges[0], edges[n], 7).with_label(art.x_label.as_str());
    let y_axis = y_axis_for(art).with_label(art.y_label.as_str());

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?;
    let area = PlotArea::auto(&canvas, &x_axis, &y_axis, 0.0, config);
    draw_grid(&mut canvas, &area, &x_axis, &y_axis, config);

    canvas.push_clip(area.left, area.top, area.width, area.height);
    let px = |x: f64| x_axis.data_to_pixel(x, area.left, area.right());
    let py = |y: f64| y_axis.data_to_pixel(y, area.bottom(), area.top);
    match art.style {
        Hist1dStyle::Step => {
            let mut outline = Vec::with_capacity(2 * n);
            for (i, &y) in art.y.iter().enumerate() {
                outline.push((px(edges[i]), py(y)));
                outline.push((px(edges[i + 1]), py(y)));
            }
            if config.hist1d.fill_alpha > 0.0 {
                let fill = config.colors.fill.with_alpha(config.hist1d.fill_alpha);
                canvas.fill_under(&outline, area.bottom(), &Style::filled(fill));
            }
            let base = area.bottom();
            let mut closed = Vec::with_capacity(outline.len() + 2);
            closed.push((outline[0].0, base));
            closed.extend_from_slice(&outline);
            closed.push((px(edges[n]), base));
            canvas.polyline(&closed, &LineStyle::solid(config.colors.line, 1.2));
        }
        Hist1dStyle::Markers => {
            let bar = LineStyle::solid(config.colors.line, 0.8);
            let marker =
                MarkerStyle { color: config.colors.line, size: config.hist1d.marker_size };
            for i in 0..n {
                let (y, err) = (art.y[i], art.yerr[i]);
                if y == 0.0 && err == 0.0 {
                    continue;
                }
                let cx = px(0.5 * (edges[i] + edges[i + 1]));
                canvas.error_bar(cx, py(y - err), py(y + err), 0.0, &bar);
                canvas.line(px(edges[i]), py(y), px(edges[i + 1]), py(y), &bar);
                canvas.marker(cx, py(y), &marker);
            }
        }
    }
    if let Some(fit) = &art.fit {
        let curve: Vec<(f64, f64)> =
            fit.curve_x.iter().zip(&fit.curve_y).map(|(&x, &y)| (px(x), py(y))).collect();
        canvas.polyline(&curve, &LineStyle::solid(config.colors.fit, 1.5));
    }
    canvas.pop_clip();

    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);
    draw_header(&mut canvas, &area, &art.title, config);

    let box_font = config.font.tick_size;
    let mut offset = 0.0;
    if config.hist1d.show_stats {
        offset += draw_stats_box(&mut canvas, &area, offset, &stats_rows(art), box_font) + 4.0;
    }
    if config.hist1d.show_fit_box
        && let Some(fit) = &art.fit
    {
        draw_stats_box(&mut canvas, &area, offset, &fit_rows(fit), box_font);
    }

    canvas.finish_svg()
}

fn validate(art: &Hist1dArtifact) -> crate::Result<()> {
    let n = art.n_bins();
    let fail = |what: &str| Err(RenderError::Layout(format!("histogram '{}': {what}", art.name)));
    if n == 0 {
        return fail("no bins");
    }
    if art.bin_edges.len() != n + 1 || art.yerr.len() != n {
        return fail("bin edges, contents and errors disagree in length");
    }
    if !art.bin_edges.windows(2).all(|w| w[0].is_finite() && w[1].is_finite() && w[1] > w[0]) {
        return fail("bin edges must be finite and strictly increasing");
    }
    if !art.y.iter().chain(&art.yerr).all(|v| v.is_finite()) {
        return fail("non-finite bin content");
    }
    Ok(())
}

/// Headroom above the tallest bin leaves space for the boxes.
fn y_axis_for(art: &Hist1dArtifact) -> Axis {
    let with_err = art.style == Hist1dStyle::Markers;
    let bins = art.y.iter().zip(&art.yerr).map(|(y, e)| if with_err { y + e } else { *y });
    let curve = art.fit.iter().flat_map(|f| f.curve_y.iter().copied());
    let top = bins.chain(curve).fold(0.0_f64, f64::max);

    if art.log_y {
        let lo = art.min_positive().unwrap_or(1.0) * 0.5;
        Axis::auto_log(lo, top.max(lo) * 5.0)
    } else {
        let bottom = art.y.iter().copied().fold(0.0_f64, f64::min);
        let top = if top > 0.0 { top * 1.25 } else { 1.0 };
        Axis::auto_linear(bottom, top, 6)
    }
}

fn stats_rows(art: &Hist1dArtifact) -> Vec<StatsRow> {
    let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), fmt_sig);
    vec![
        StatsRow::new("Entries", art.entries.to_string()),
        StatsRow::new("Mean", opt(art.mean)),
        StatsRow::new("Std Dev", opt(art.std_dev)),
        StatsRow::new("Underflow", fmt_sig(art.underflow)),
        StatsRow::new("Overflow", fmt_sig(art.overflow)),
    ]
}

fn fit_rows(fit: &FitOverlay) -> Vec<StatsRow> {
    let mut rows = vec![StatsRow::new(
        "\u{03C7}\u{00B2} / ndf",
        format!("{} / {}", fmt_sig(fit.chi2), fit.ndf),
    )];
    if let Some(p) = fit.p_value {
        rows.push(StatsRow::new("Prob", fmt_sig(p)));
    }
    rows.extend(fit.parameters.iter().map(|p| {
        StatsRow::new(p.name.as_str(), format!("{} \u{00B1} {}", fmt_sig(p.value), fmt_sig(p.error)))
    }));
    rows
}

/// Four significant digits, scientific outside [1e-3, 1e5).
fn fmt_sig(v: f64) -> String {
    if v == 0.0 || !v.is_finite() {
        return format!("{v}");
    }
    let mag = v.abs().log10().floor() as i32;
    if !(-3..5).contains(&mag) {
        return format!("{v:.3e}");
    }
    let decimals = (3 - mag).max(0) as usize;
    format!("{v:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_hist::{AxisLabels, Binning, Histogram1D};
    use dr_viz::{FitParameterRow, hist1d_artifact};

    fn artifact(style: Hist1dStyle, log_y: bool) -> Hist1dArtifact {
        let mut h = Histogram1D::new("E_S", Binning::new(20, 10.0, 30.0).unwrap())
            .with_labels(AxisLabels::new("Scintillation Energy", "GeV", "Evt"));
        for i in 0..200 {
            h.fill(20.0 + ((i % 13) as f64 - 6.0) * 0.7);
        }
        h.fill(5.0);
        hist1d_artifact(&h.finalize(), style, log_y)
    }

    fn overlay() -> FitOverlay {
        let curve_x: Vec<f64> = (0..=40).map(|i| 15.0 + i as f64 * 0.25).collect();
        let curve_y =
            curve_x.iter().map(|x| 40.0 * (-0.5 * ((x - 20.0) / 2.5_f64).powi(2)).exp()).collect();
        FitOverlay {
            model: "gaus".into(),
            curve_x,
            curve_y,
            chi2: 12.5,
            ndf: 7,
            p_value: Some(0.085),
            parameters: vec![
                FitParameterRow { name: "amplitude".into(), value: 40.0, error: 1.2 },
                FitParameterRow { name: "mean".into(), value: 20.01, error: 0.04 },
                FitParameterRow { name: "sigma".into(), value: 2.5, error: 0.03 },
            ],
        }
    }

    #[test]
    fn step_histogram_renders() {
        let svg = render(&artifact(Hist1dStyle::Step, false), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">Scintillation Energy</text>"));
        assert!(svg.contains(">GeV</text>"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(">Entries</text>"));
        assert!(svg.contains(">201</text>"));
        assert!(svg.contains(">Underflow</text>"));
        assert!(svg.contains("clip-path"));
    }

    #[test]
    fn markers_with_fit_show_curve_and_fit_box() {
        let config = VizConfig::default();
        let mut art = artifact(Hist1dStyle::Markers, false);
        art.fit = Some(overlay());
        let svg = render(&art, &config).unwrap();
        assert!(svg.contains(&format!("stroke=\"{}\"", config.colors.fit.to_svg_fill())));
        assert!(svg.contains("\u{03C7}\u{00B2} / ndf"));
        assert!(svg.contains(">12.50 / 7</text>"));
        assert!(svg.contains("20.01 \u{00B1} 0.04000"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn log_axis_tolerates_empty_bins() {
        let svg = render(&artifact(Hist1dStyle::Step, true), &VizConfig::default()).unwrap();
        assert!(svg.contains("10\u{00B9}"));
        let mut empty = artifact(Hist1dStyle::Step, true);
        empty.y.iter_mut().for_each(|v| *v = 0.0);
        render(&empty, &VizConfig::default()).unwrap();
    }

    #[test]
    fn boxes_can_be_disabled() {
        let mut config = VizConfig::default();
        config.hist1d.show_stats = false;
        config.hist1d.show_fit_box = false;
        let mut art = artifact(Hist1dStyle::Markers, false);
        art.fit = Some(overlay());
        let svg = render(&art, &config).unwrap();
        assert!(!svg.contains(">Entries</text>"));
        assert!(!svg.contains("ndf"));
    }

    #[test]
    fn malformed_artifacts_are_rejected() {
        let mut art = artifact(Hist1dStyle::Step, false);
        art.bin_edges.pop();
        assert!(matches!(render(&art, &VizConfig::default()), Err(RenderError::Layout(_))));

        let mut art = artifact(Hist1dStyle::Step, false);
        art.bin_edges.swap(0, 1);
        assert!(render(&art, &VizConfig::default()).is_err());

        let mut art = artifact(Hist1dStyle::Step, false);
        art.y.clear();
        art.yerr.clear();
        art.bin_edges.truncate(1);
        assert!(render(&art, &VizConfig::default()).is_err());
    }

    #[test]
    fn significant_digit_formatting() {
        assert_eq!(fmt_sig(20.0134), "20.01");
        assert_eq!(fmt_sig(0.085), "0.08500");
        assert_eq!(fmt_sig(1234.4), "1234");
        assert_eq!(fmt_sig(2.5e6), "2.500e6");
        assert_eq!(fmt_sig(0.0), "0");
    }
}
