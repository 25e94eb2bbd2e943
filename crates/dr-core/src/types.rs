//! Common data types for drana

use serde::{Deserialize, Serialize};

/// Fit result containing parameter estimates and uncertainties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// Parameter names, aligned with `parameters`.
    pub names: Vec<String>,

    /// Best-fit parameter values
    pub parameters: Vec<f64>,

    /// Parameter uncertainties (sqrt of covariance diagonal)
    pub uncertainties: Vec<f64>,

    /// Covariance matrix (row-major, N×N). `None` if Hessian inversion failed.
    pub covariance: Option<Vec<f64>>,

    /// Chi-square at the minimum.
    pub chi2: f64,

    /// Degrees of freedom (fitted bins minus free parameters).
    pub ndf: usize,

    /// Convergence status
    pub converged: bool,

    /// Number of optimizer iterations
    pub n_iter: u64,
}

impl FitResult {
    /// Create a new fit result
    pub fn new(
        names: Vec<String>,
        parameters: Vec<f64>,
        uncertainties: Vec<f64>,
        chi2: f64,
        ndf: usize,
        converged: bool,
        n_iter: u64,
    ) -> Self {
        Self { names, parameters, uncertainties, covariance: None, chi2, ndf, converged, n_iter }
    }

    /// Attach a covariance matrix (row-major, N×N).
    pub fn with_covariance(mut self, covariance: Vec<f64>) -> Self {
        self.covariance = Some(covariance);
        self
    }

    /// Chi-square per degree of freedom, `None` when `ndf == 0`.
    pub fn chi2_per_ndf(&self) -> Option<f64> {
        (self.ndf > 0).then(|| self.chi2 / self.ndf as f64)
    }

    /// Look up a parameter value and its uncertainty by name.
    pub fn parameter(&self, name: &str) -> Option<(f64, f64)> {
        let i = self.names.iter().position(|n| n == name)?;
        Some((self.parameters[i], self.uncertainties[i]))
    }

    /// Get correlation matrix element (i, j). Returns `None` if covariance is unavailable.
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let cov = self.covariance.as_ref()?;
        let n = self.parameters.len();
        if i >= n || j >= n {
            return None;
        }
        let sigma_i = self.uncertainties[i];
        let sigma_j = self.uncertainties[j];
        if sigma_i <= 0.0 || sigma_j <= 0.0 {
            return None;
        }
        Some(cov[i * n + j] / (sigma_i * sigma_j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> FitResult {
        FitResult::new(
            vec!["a".into(), "b".into()],
            vec![1.0, 2.0],
            vec![0.1, 0.2],
            12.0,
            8,
            true,
            40,
        )
    }

    #[test]
    fn test_fit_result() {
        let result = sample();
        assert_eq!(result.parameters.len(), 2);
        assert_eq!(result.uncertainties.len(), 2);
        assert!(result.converged);
        assert_relative_eq!(result.chi2_per_ndf().unwrap(), 1.5);
        assert_eq!(result.parameter("b"), Some((2.0, 0.2)));
        assert_eq!(result.parameter("c"), None);
    }

    #[test]
    fn correlation_from_covariance() {
        let result = sample().with_covariance(vec![0.01, 0.01, 0.01, 0.04]);
        assert_relative_eq!(result.correlation(0, 1).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.correlation(1, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert!(result.correlation(2, 0).is_none());
    }

    #[test]
    fn zero_ndf_has_no_reduced_chi2() {
        let mut result = sample();
        result.ndf = 0;
        assert!(result.chi2_per_ndf().is_none());
    }
}
