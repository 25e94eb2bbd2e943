use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// Light grid, filled step histograms.
    Drc,
    /// Classic analysis-framework look: no grid, black lines, ticks on all sides.
    Root,
    /// Outward ticks on two sides, no header.
    Minimal,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "root" => Self::Root,
            "minimal" => Self::Minimal,
            "" | "drc" => Self::Drc,
            other => {
                log::warn!("unknown theme '{other}', using drc");
                Self::Drc
            }
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Drc => drc(),
            Self::Root => root(),
            Self::Minimal => minimal(),
        }
    }
}

fn drc() -> VizConfig {
    VizConfig {
        theme: "drc".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        experiment: ExperimentConfig::default(),
        colors: ColorsConfig::default(),
        hist1d: Hist1dConfig::default(),
        hist2d: Hist2dConfig::default(),
        output: OutputConfig::default(),
    }
}

fn root() -> VizConfig {
    VizConfig {
        theme: "root".into(),
        figure: FigureConfig { width: 504.0, height: 360.0 },
        font: FontConfig { size: 10.0, label_size: 11.0, tick_size: 9.0 },
        grid: GridConfig { show: false, ..GridConfig::default() },
        colors: ColorsConfig {
            line: Color::hex("#000080"),
            fill: Color::hex("#000080"),
            fit: Color::hex("#FF0000"),
            foreground: Color::BLACK,
        },
        hist1d: Hist1dConfig { fill_alpha: 0.0, ..Hist1dConfig::default() },
        ..drc()
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 432.0, height: 302.4 },
        font: FontConfig { size: 9.0, label_size: 10.0, tick_size: 8.0 },
        axes: AxesConfig {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        experiment: ExperimentConfig {
            name: String::new(),
            status: String::new(),
            label: String::new(),
        },
        hist1d: Hist1dConfig { show_stats: false, ..Hist1dConfig::default() },
        hist2d: Hist2dConfig { colormap: "viridis".into(), log_z: false },
        ..drc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(BuiltinTheme::parse("ROOT"), BuiltinTheme::Root);
        assert_eq!(BuiltinTheme::parse(""), BuiltinTheme::Drc);
        assert_eq!(BuiltinTheme::parse("nope"), BuiltinTheme::Drc);
    }

    #[test]
    fn presets_validate() {
        for t in [BuiltinTheme::Drc, BuiltinTheme::Root, BuiltinTheme::Minimal] {
            t.base_config().validate().unwrap();
        }
        assert!(BuiltinTheme::Minimal.base_config().experiment.name.is_empty());
    }
}
