/// Axis limits, ticks and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub log: bool,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Linear axis widened to "nice" limits around the data.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(data_min, data_max, target_ticks);
        Self::with_ticks(nice_min, nice_max, step)
    }

    /// Linear axis with exactly the given limits and nice ticks inside them.
    ///
    /// Histogram x axes use this so the frame matches the binning range.
    pub fn bounded(min: f64, max: f64, target_ticks: usize) -> Self {
        let (min, max) = if max > min { (min, max) } else { (min - 1.0, min + 1.0) };
        let (_, _, step) = nice_range(min, max, target_ticks);
        let first = (min / step).ceil() * step;
        let last = (max / step).floor() * step;
        let mut axis = Self::with_ticks(first, last, step);
        axis.min = min;
        axis.max = max;
        axis
    }

    fn with_ticks(first: f64, last: f64, step: f64) -> Self {
        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let n = ((last - first) / step + 1e-6).floor().max(0.0) as usize;
        for i in 0..=n {
            let v = first + i as f64 * step;
            ticks.push(v);
            labels.push(format_tick(v, step));
        }

        // 5 minor subdivisions per major, continued up to one step past each end.
        let minor_step = step / 5.0;
        let minor = (-4..=(5 * n as i64 + 4))
            .filter(|k| k % 5 != 0)
            .map(|k| first + k as f64 * minor_step)
            .collect();

        Self {
            min: first,
            max: last,
            log: false,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Logarithmic axis covering whole decades around the data.
    ///
    /// Non-positive inputs are clamped; callers pass the smallest positive
    /// content for `data_min`.
    pub fn auto_log(data_min: f64, data_max: f64) -> Self {
        let data_min = if data_min > 0.0 { data_min } else { 0.1 };
        let data_max = if data_max > data_min { data_max } else { data_min * 10.0 };
        let log_min = data_min.log10().floor() as i32;
        let log_max = (data_max.log10().ceil() as i32).max(log_min + 1);

        let mut ticks = Vec::new();
        let mut labels = Vec::new();
        let mut minor = Vec::new();
        for exp in log_min..=log_max {
            let v = 10.0_f64.powi(exp);
            ticks.push(v);
            labels.push(format!("10{}", superscript(exp)));
            if exp < log_max {
                minor.extend((2..=9).map(|m| m as f64 * v));
            }
        }

        Self {
            min: 10.0_f64.powi(log_min),
            max: 10.0_f64.powi(log_max),
            log: true,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to a pixel coordinate. Values at or below zero on a
    /// log axis map to the axis minimum.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        px_min + self.fraction(value) * (px_max - px_min)
    }

    /// Position of `value` along the axis, 0 at `min` and 1 at `max`.
    pub fn fraction(&self, value: f64) -> f64 {
        if self.log {
            let lo = self.min.ln();
            let hi = self.max.ln();
            (value.max(self.min).ln() - lo) / (hi - lo)
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let eps = (self.max - self.min).abs() * 1e-9;
        value >= self.min - eps && value <= self.max + eps
    }
}

/// "Nice numbers" limits and step for about `target_ticks` ticks.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if !(data_max - data_min).is_normal() || data_max < data_min {
        return (data_min - 1.0, data_min + 1.0, 0.5);
    }
    let rough_step = (data_max - data_min) / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

/// Tick label with as many decimals as the step needs; large values switch
/// to scientific notation.
pub(crate) fn format_tick(value: f64, step: f64) -> String {
    if value.abs() < step * 1e-6 {
        return "0".into();
    }
    if step >= 1e5 {
        return format!("{value:.1e}");
    }
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    format!("{value:.decimals$}")
}

fn superscript(n: i32) -> String {
    n.to_string()
        .chars()
        .map(|c| match c {
            '-' => '\u{207B}',
            '0' => '\u{2070}',
            '1' => '\u{00B9}',
            '2' => '\u{00B2}',
            '3' => '\u{00B3}',
            '4'..='9' => char::from_u32(0x2074 + (c as u32 - '4' as u32)).unwrap_or(c),
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn auto_linear_covers_data() {
        let ax = Axis::auto_linear(0.0, 10.3, 6);
        assert!(ax.min <= 0.0);
        assert!(ax.max >= 10.3);
        assert_eq!(ax.tick_positions.len(), ax.tick_labels.len());
        assert_eq!(ax.tick_labels.first().map(String::as_str), Some("0"));
    }

    #[test]
    fn bounded_keeps_limits() {
        let ax = Axis::bounded(0.0, 150.0, 6);
        assert_eq!((ax.min, ax.max), (0.0, 150.0));
        assert!(ax.tick_positions.iter().all(|&t| (0.0..=150.0).contains(&t)));
        assert_eq!(ax.tick_labels.last().map(String::as_str), Some("140"));

        let ax = Axis::bounded(17.5, 22.5, 6);
        assert_eq!(ax.tick_positions.first().copied(), Some(18.0));
        assert!(ax.minor_ticks.iter().any(|&m| m < 18.0));
    }

    #[test]
    fn bounded_survives_degenerate_range() {
        let ax = Axis::bounded(5.0, 5.0, 6);
        assert!(ax.max > ax.min);
    }

    #[test]
    fn data_to_pixel_linear() {
        let ax = Axis::auto_linear(0.0, 100.0, 5);
        assert_relative_eq!(ax.data_to_pixel(50.0, 0.0, 500.0), 250.0, epsilon = 1e-9);
        // Inverted pixel direction for y axes.
        assert_relative_eq!(ax.data_to_pixel(100.0, 300.0, 0.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn auto_log_decades() {
        let ax = Axis::auto_log(0.3, 4200.0);
        assert!(ax.log);
        assert_eq!((ax.min, ax.max), (0.1, 10_000.0));
        assert_eq!(ax.tick_labels[0], "10\u{207B}\u{00B9}");
        assert_eq!(ax.tick_labels[5], "10\u{2074}");
        assert_relative_eq!(ax.fraction(100.0), 0.6, epsilon = 1e-12);
        assert_eq!(ax.fraction(0.0), 0.0);
    }

    #[test]
    fn auto_log_handles_empty_histogram() {
        let ax = Axis::auto_log(0.0, 0.0);
        assert!(ax.max > ax.min && ax.min > 0.0);
    }

    #[test]
    fn nice_step_values() {
        assert_relative_eq!(nice_step(3.2), 2.0);
        assert_relative_eq!(nice_step(0.7), 0.5);
        assert_relative_eq!(nice_step(15.0), 10.0);
        assert_relative_eq!(nice_step(4.5), 5.0);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(0.25, 0.05), "0.25");
        assert_eq!(format_tick(-1e-17, 0.5), "0");
        assert_eq!(format_tick(2000.0, 500.0), "2000");
        assert_eq!(format_tick(3e6, 1e6), "3.0e6");
    }
}
