use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw the header above the frame: **name** *status* on the left and the
/// plot title on the right. The experiment `label` goes inside the frame.
pub fn draw_header(canvas: &mut Canvas, area: &PlotArea, title: &str, config: &VizConfig) {
    let fg = config.colors.foreground;
    let y = area.top - 6.0;

    if !config.experiment.name.is_empty() {
        let header_size = config.font.label_size * 1.3;
        let x = area.left;
        let bold_style = TextStyle {
            size: header_size,
            color: fg,
            weight: FontWeight::Bold,
            ..Default::default()
        };
        canvas.text(x, y, &config.experiment.name, &bold_style);

        if !config.experiment.status.is_empty() {
            let name_w = canvas.measure_text(&config.experiment.name, &bold_style).width;
            let italic_style = TextStyle {
                size: header_size * 0.85,
                color: fg,
                style: FontStyle::Italic,
                ..Default::default()
            };
            canvas.text(x + name_w + 5.0, y, &config.experiment.status, &italic_style);
        }
    }

    if !title.is_empty() {
        let title_style = TextStyle {
            size: config.font.size,
            color: fg,
            anchor: TextAnchor::End,
            ..Default::default()
        };
        canvas.text(area.right(), y, title, &title_style);
    }

    if !config.experiment.label.is_empty() {
        let label_style = TextStyle {
            size: config.font.size,
            color: fg,
            baseline: TextBaseline::Hanging,
            ..Default::default()
        };
        canvas.text(area.left + 8.0, area.top + 8.0, &config.experiment.label, &label_style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlotArea {
        PlotArea { left: 60.0, top: 40.0, width: 400.0, height: 250.0 }
    }

    #[test]
    fn header_has_name_status_and_title() {
        let mut canvas = Canvas::new(500.0, 320.0).unwrap();
        let mut config = VizConfig::default();
        config.experiment.label = "e\u{207B} 20 GeV".into();
        draw_header(&mut canvas, &area(), "Scintillation Energy", &config);
        let svg = canvas.finish_svg().unwrap();
        assert!(svg.contains(">DRC</text>"));
        assert!(svg.contains("font-style=\"italic\""));
        assert!(svg.contains(">Scintillation Energy</text>"));
        assert!(svg.contains("e\u{207B} 20 GeV"));
    }

    #[test]
    fn empty_name_skips_experiment_block() {
        let mut canvas = Canvas::new(500.0, 320.0).unwrap();
        let mut config = VizConfig::default();
        config.experiment.name.clear();
        draw_header(&mut canvas, &area(), "", &config);
        let svg = canvas.finish_svg().unwrap();
        assert!(!svg.contains("<text"));
    }
}
