//! # dr-viz
//!
//! Visualization data artifacts for drana.
//!
//! Artifacts are flat, numbers-first structures (arrays rather than nested
//! objects) built from finalized histograms. They serialize to JSON and are
//! what the renderer consumes.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// One-dimensional histogram artifacts, optionally with a fit overlay.
pub mod hist1d;

/// Two-dimensional (color map) histogram artifacts.
pub mod hist2d;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use hist1d::{FitOverlay, FitParameterRow, Hist1dArtifact, Hist1dStyle, hist1d_artifact};
pub use hist2d::{Hist2dArtifact, hist2d_artifact};

/// Artifact schema version written into every artifact.
pub const SCHEMA_VERSION: &str = "drana_viz_v1";

/// Provenance block shared by all artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Producing tool version.
    pub tool_version: String,
    /// Creation time (ms since the Unix epoch); 0 if the clock is unavailable.
    pub created_unix_ms: u128,
}

impl ArtifactMeta {
    pub(crate) fn now() -> Self {
        let created_unix_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        Self { tool: "drana".into(), tool_version: dr_core::VERSION.into(), created_unix_ms }
    }
}
