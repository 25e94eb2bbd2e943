use dr_hist::FinalizedHistogram2D;
use serde::{Deserialize, Serialize};

use crate::{ArtifactMeta, SCHEMA_VERSION};

/// A 2D histogram ready for a color-map plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist2dArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Histogram name.
    pub name: String,
    /// Plot title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// `nx + 1` x edges.
    pub x_edges: Vec<f64>,
    /// `ny + 1` y edges.
    pub y_edges: Vec<f64>,
    /// Cell contents, `z[iy][ix]`.
    pub z: Vec<Vec<f64>>,
    /// Largest cell content (color scale maximum).
    pub z_max: f64,
    /// Number of fills.
    pub entries: u64,
}

/// Build a 2D artifact from a finalized histogram.
pub fn hist2d_artifact(hist: &FinalizedHistogram2D) -> Hist2dArtifact {
    let nx = hist.x_binning().n_bins();
    let z = hist.contents().chunks(nx).map(<[f64]>::to_vec).collect();
    let labels = hist.labels();
    Hist2dArtifact {
        schema_version: SCHEMA_VERSION.into(),
        meta: ArtifactMeta::now(),
        name: hist.name().into(),
        title: labels.title.clone(),
        x_label: labels.x.clone(),
        y_label: labels.y.clone(),
        x_edges: hist.x_binning().edges(),
        y_edges: hist.y_binning().edges(),
        z,
        z_max: hist.max_content(),
        entries: hist.entries(),
    }
}
