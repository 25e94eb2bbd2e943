use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Margins sized from tick labels, axis labels and the header.
    ///
    /// `right_reserve` is extra space kept free on the right (color bars).
    pub fn auto(
        canvas: &Canvas,
        x_axis: &Axis,
        y_axis: &Axis,
        right_reserve: f64,
        config: &VizConfig,
    ) -> Self {
        let tick_style = TextStyle::sized(config.font.tick_size);
        let label_size = config.font.label_size;
        let outward =
            if config.axes.tick_direction == "in" { 0.0 } else { config.axes.tick_length };

        let max_tick_w = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = 12.0 + outward + max_tick_w + 6.0;
        if !y_axis.label.is_empty() {
            left += label_size + 8.0;
        }

        let mut bottom = 10.0 + outward + tick_style.size + 6.0;
        if !x_axis.label.is_empty() {
            bottom += label_size + 6.0;
        }

        let top = if config.experiment.name.is_empty() { 24.0 } else { label_size * 1.3 + 16.0 };
        let right = 16.0 + right_reserve;

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;
        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_reserve_shrink_the_area() {
        let config = VizConfig::default();
        let canvas = Canvas::new(500.0, 350.0).unwrap();
        let x = Axis::bounded(0.0, 150.0, 6);
        let y = Axis::auto_linear(0.0, 1200.0, 6);
        let bare = PlotArea::auto(&canvas, &x, &y, 0.0, &config);
        let labelled = PlotArea::auto(
            &canvas,
            &x.clone().with_label("x"),
            &y.clone().with_label("y"),
            40.0,
            &config,
        );
        assert!(labelled.left > bare.left);
        assert!(labelled.width < bare.width - 40.0);
        assert!(labelled.bottom() < bare.bottom());
        assert!(bare.right() <= canvas.width);
    }
}
