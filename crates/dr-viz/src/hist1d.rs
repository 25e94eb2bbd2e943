use dr_hist::FinalizedHistogram1D;
use dr_inference::GaussianFit;
use serde::{Deserialize, Serialize};

use crate::{ArtifactMeta, SCHEMA_VERSION};

/// How bin contents are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hist1dStyle {
    /// Outline through the bin contents.
    #[default]
    Step,
    /// Markers at bin centers with vertical error bars.
    Markers,
}

/// A 1D histogram ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hist1dArtifact {
    /// Schema tag, [`SCHEMA_VERSION`].
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
    /// `n + 1` bin edges.
    pub bin_edges: Vec<f64>,
    /// `n` bin contents.
    pub y: Vec<f64>,
    /// `n` bin errors.
    pub yerr: Vec<f64>,
    /// Underflow weight.
    pub underflow: f64,
    /// Overflow weight.
    pub overflow: f64,
    /// Number of fills.
    pub entries: u64,
    /// Mean of in-range contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Standard deviation of in-range contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    /// Drawing style.
    pub style: Hist1dStyle,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// Fitted curve and fit summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitOverlay>,
}

/// Fitted model sampled for drawing plus the numbers for the fit box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOverlay {
    /// Model name shown in the fit box.
    pub model: String,
    /// Sample abscissae.
    pub curve_x: Vec<f64>,
    /// Model values at `curve_x`.
    pub curve_y: Vec<f64>,
    /// χ² at the minimum.
    pub chi2: f64,
    /// Degrees of freedom.
    pub ndf: usize,
    /// χ² probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    /// Fitted parameters.
    pub parameters: Vec<FitParameterRow>,
}

/// One row of the fit box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameterRow {
    /// Parameter name.
    pub name: String,
    /// Best-fit value.
    pub value: f64,
    /// Uncertainty.
    pub error: f64,
}

/// Build a 1D artifact from a finalized histogram.
pub fn hist1d_artifact(
    hist: &FinalizedHistogram1D,
    style: Hist1dStyle,
    log_y: bool,
) -> Hist1dArtifact {
    let labels = hist.labels();
    Hist1dArtifact {
        schema_version: SCHEMA_VERSION.into(),
        meta: ArtifactMeta::now(),
        name: hist.name().into(),
        title: labels.title.clone(),
        x_label: labels.x.clone(),
        y_label: labels.y.clone(),
        bin_edges: hist.bin_edges(),
        y: hist.contents().to_vec(),
        yerr: hist.errors().to_vec(),
        underflow: hist.underflow().sumw,
        overflow: hist.overflow().sumw,
        entries: hist.entries(),
        mean: hist.mean(),
        std_dev: hist.std_dev(),
        style,
        log_y,
        fit: None,
    }
}

impl Hist1dArtifact {
    /// Attach a Gaussian fit sampled at `n_points` across its window.
    pub fn with_gaussian_fit(mut self, fit: &GaussianFit, n_points: usize) -> Self {
        let (curve_x, curve_y) = fit.curve(n_points).into_iter().unzip();
        let r = &fit.result;
        let parameters = r
            .names
            .iter()
            .zip(r.parameters.iter().zip(&r.uncertainties))
            .map(|(name, (&value, &error))| FitParameterRow { name: name.clone(), value, error })
            .collect();
        self.fit = Some(FitOverlay {
            model: "gaus".into(),
            curve_x,
            curve_y,
            chi2: r.chi2,
            ndf: r.ndf,
            p_value: fit.p_value,
            parameters,
        });
        self
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.y.len()
    }

    /// Smallest strictly positive content, if any (log-axis lower bound).
    pub fn min_positive(&self) -> Option<f64> {
        self.y.iter().copied().filter(|&v| v > 0.0).reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dr_core::FitResult;
    use dr_hist::{AxisLabels, Binning, Histogram1D};

    fn hist() -> FinalizedHistogram1D {
        let mut h = Histogram1D::new("E_S", Binning::new(4, 0.0, 4.0).unwrap())
            .with_labels(AxisLabels::new("Scintillation Energy", "GeV", "Evt"));
        for x in [0.5, 1.5, 1.5, 2.5, 9.0] {
            h.fill(x);
        }
        h.finalize()
    }

    #[test]
    fn carries_bins_and_labels() {
        let a = hist1d_artifact(&hist(), Hist1dStyle::Step, false);
        assert_eq!(a.schema_version, SCHEMA_VERSION);
        assert_eq!(a.bin_edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.y, vec![1.0, 2.0, 1.0, 0.0]);
        assert_eq!(a.yerr[1], 2.0_f64.sqrt());
        assert_eq!(a.overflow, 1.0);
        assert_eq!(a.entries, 5);
        assert_eq!(a.x_label, "GeV");
        assert_eq!(a.min_positive(), Some(1.0));
        assert!(a.fit.is_none());
    }

    #[test]
    fn fit_overlay_serializes() {
        let fit = GaussianFit {
            result: FitResult::new(
                vec!["amplitude".into(), "mean".into(), "sigma".into()],
                vec![2.0, 1.5, 0.5],
                vec![0.1, 0.02, 0.01],
                3.2,
                1,
                true,
                12,
            ),
            p_value: Some(0.07),
            window: (0.0, 4.0),
        };
        let a = hist1d_artifact(&hist(), Hist1dStyle::Markers, false).with_gaussian_fit(&fit, 41);
        let overlay = a.fit.as_ref().unwrap();
        assert_eq!(overlay.curve_x.len(), 41);
        assert_eq!(overlay.parameters[1].name, "mean");
        assert_eq!(overlay.parameters[1].value, 1.5);

        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"style\":\"markers\""));
        let back: Hist1dArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.style, Hist1dStyle::Markers);
        assert_eq!(back.fit.map(|f| f.ndf), Some(1));
    }
}
