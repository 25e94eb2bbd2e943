use serde::{Deserialize, Serialize};

use crate::RenderError;
use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub hist1d: Hist1dConfig,
    pub hist2d: Hist2dConfig,
    pub output: OutputConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Drc.base_config()
    }
}

impl VizConfig {
    /// Reject values that cannot produce a drawable figure.
    pub fn validate(&self) -> crate::Result<()> {
        let bad = |msg: String| Err(RenderError::Config(msg));
        if !(self.figure.width > 0.0 && self.figure.height > 0.0) {
            return bad(format!(
                "figure size must be positive, got {}x{}",
                self.figure.width, self.figure.height
            ));
        }
        if !(self.font.size > 0.0 && self.font.label_size > 0.0 && self.font.tick_size > 0.0) {
            return bad("font sizes must be positive".into());
        }
        if self.output.dpi == 0 {
            return bad("output.dpi must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.hist1d.fill_alpha) {
            let alpha = self.hist1d.fill_alpha;
            return bad(format!("hist1d.fill_alpha must be in [0, 1], got {alpha}"));
        }
        if !crate::color::is_known_colormap(&self.hist2d.colormap) {
            log::warn!("unknown colormap '{}', using viridis", self.hist2d.colormap);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 504.0,  // 7" * 72
            height: 360.0, // 5" * 72
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, label_size: 11.0, tick_size: 8.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#CBD5E1"), alpha: 0.55 }
    }
}

/// Header text drawn above the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Bold label at the top left; empty disables the header.
    pub name: String,
    /// Italic status next to the name.
    pub status: String,
    /// Free text drawn inside the frame at the top left (e.g. beam energy).
    pub label: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self { name: "DRC".into(), status: "Simulation".into(), label: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Histogram outline and data markers.
    pub line: Color,
    /// Fill under step histograms.
    pub fill: Color,
    /// Fitted curve.
    pub fit: Color,
    /// Frame, ticks and text.
    pub foreground: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            line: Color::hex("#1D4ED8"),
            fill: Color::hex("#93C5FD"),
            fit: Color::hex("#DC2626"),
            foreground: Color::hex("#111827"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hist1dConfig {
    /// Draw the statistics box (entries, mean, std dev, flows).
    pub show_stats: bool,
    /// Draw the fit parameter rows when a fit is attached.
    pub show_fit_box: bool,
    /// Opacity of the fill under step histograms; 0 disables it.
    pub fill_alpha: f64,
    /// Marker radius in points for marker-style histograms.
    pub marker_size: f64,
}

impl Default for Hist1dConfig {
    fn default() -> Self {
        Self { show_stats: true, show_fit_box: true, fill_alpha: 0.35, marker_size: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hist2dConfig {
    pub colormap: String,
    /// Logarithmic color scale.
    pub log_z: bool,
}

impl Default for Hist2dConfig {
    fn default() -> Self {
        Self { colormap: "bird".into(), log_z: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: "png".into(), dpi: 144 }
    }
}

/// Resolve a [`VizConfig`] from an optional YAML string.
///
/// The YAML `theme` key selects the base preset; every other key present in
/// the YAML overrides the preset value, recursively per section.
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let config = match user_yaml {
        None => VizConfig::default(),
        Some(yaml) => {
            let user: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml)
                .map_err(|e| RenderError::Config(e.to_string()))?;
            let user = match user {
                serde_yaml_ng::Value::Null => serde_yaml_ng::Value::Mapping(Default::default()),
                v @ serde_yaml_ng::Value::Mapping(_) => v,
                _ => return Err(RenderError::Config("config root must be a mapping".into())),
            };
            let theme = user.get("theme").and_then(|t| t.as_str()).unwrap_or_default();
            let base = BuiltinTheme::parse(theme).base_config();
            let mut merged = serde_yaml_ng::to_value(&base)
                .map_err(|e| RenderError::Config(e.to_string()))?;
            merge_yaml(&mut merged, user);
            serde_yaml_ng::from_value(merged).map_err(|e| RenderError::Config(e.to_string()))?
        }
    };
    config.validate()?;
    Ok(config)
}

fn merge_yaml(base: &mut serde_yaml_ng::Value, overlay: serde_yaml_ng::Value) {
    use serde_yaml_ng::Value;
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_yaml(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let c = resolve_config(None).unwrap();
        assert_eq!(c, VizConfig::default());
        assert_eq!(c.theme, "drc");
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(resolve_config(Some("")).unwrap(), VizConfig::default());
    }

    #[test]
    fn user_keys_override_theme_preset() {
        let yaml = "theme: root\nfigure:\n  width: 600\nexperiment:\n  label: \"e- 20 GeV\"\n";
        let c = resolve_config(Some(yaml)).unwrap();
        let root = BuiltinTheme::Root.base_config();
        assert_eq!(c.theme, "root");
        assert_eq!(c.figure.width, 600.0);
        assert_eq!(c.figure.height, root.figure.height);
        assert_eq!(c.grid.show, root.grid.show);
        assert_eq!(c.experiment.label, "e- 20 GeV");
        assert_eq!(c.experiment.name, root.experiment.name);
    }

    #[test]
    fn colors_parse_from_hex() {
        let c = resolve_config(Some("colors:\n  fit: \"#00ff00\"\n")).unwrap();
        assert_eq!(c.colors.fit, Color::rgb(0, 255, 0));
        assert!(resolve_config(Some("colors:\n  fit: green\n")).is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            resolve_config(Some("figure:\n  width: -1\n")),
            Err(RenderError::Config(_))
        ));
        assert!(resolve_config(Some("output:\n  dpi: 0\n")).is_err());
        assert!(resolve_config(Some("- a\n- b\n")).is_err());
    }
}
