//! # dr-viz-render
//!
//! Renders drana visualization artifacts (see `dr-viz`) to SVG and PNG.
//!
//! Artifacts arrive as JSON together with a kind tag, so the renderer can be
//! driven from files as well as in-process:
//!
//! ```
//! use dr_viz_render::{config::VizConfig, render_svg};
//!
//! let json = r#"{
//!     "schema_version": "drana_viz_v1",
//!     "meta": {"tool": "drana", "tool_version": "0", "created_unix_ms": 0},
//!     "name": "E_S", "title": "Scintillation Energy", "x_label": "GeV", "y_label": "Evt",
//!     "bin_edges": [0.0, 1.0, 2.0], "y": [3.0, 1.0], "yerr": [1.7, 1.0],
//!     "underflow": 0.0, "overflow": 0.0, "entries": 4,
//!     "style": "step", "log_y": false
//! }"#;
//! let svg = render_svg(json, "hist1d", &VizConfig::default()).unwrap();
//! assert!(svg.contains("Scintillation Energy"));
//! ```

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::Path;

use config::VizConfig;
use dr_viz::{Hist1dArtifact, Hist2dArtifact};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("unsupported output format: {0}")]
    UnknownFormat(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Artifact kinds accepted by [`render_svg`].
pub const KINDS: &[&str] = &["hist1d", "hist2d"];

/// Render an artifact JSON to an SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    match kind {
        "hist1d" => {
            let art: Hist1dArtifact = serde_json::from_str(artifact_json)?;
            plots::hist1d::render(&art, config)
        }
        "hist2d" => {
            let art: Hist2dArtifact = serde_json::from_str(artifact_json)?;
            plots::hist2d::render(&art, config)
        }
        other => Err(RenderError::UnknownKind(other.to_string())),
    }
}

/// Render an artifact JSON to bytes in `format` (`svg` or `png`).
pub fn render_to_bytes(
    artifact_json: &str,
    kind: &str,
    format: &str,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let svg = render_svg(artifact_json, kind, config)?;
    encode(svg, format, config)
}

#[cfg_attr(not(feature = "png"), allow(unused_variables))]
fn encode(svg: String, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    match format {
        "svg" => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        "png" => output::png::svg_to_png(&svg, config.output.dpi),
        other => Err(RenderError::UnknownFormat(other.to_string())),
    }
}

/// Render an artifact JSON to a file; the format follows the extension.
pub fn render_to_file(
    artifact_json: &str,
    kind: &str,
    path: &Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
    let svg = render_svg(artifact_json, kind, config)?;
    if ext == "svg" {
        return output::svg::save_svg(&svg, path);
    }
    let bytes = encode(svg, ext, config)?;
    std::fs::write(path, bytes)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
