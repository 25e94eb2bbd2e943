//! Gaussian resolution fit on a finalized histogram.
//!
//! Model: `f(x) = A · exp(-(x - μ)² / (2σ²))`, fitted by minimizing
//! `½ χ² = ½ Σ ((yᵢ - f(xᵢ)) / eᵢ)²` over bins whose center lies in the fit
//! window. The minimizer works on rescaled parameters
//! `(A / A₀, (μ - μ₀) / σ₀, σ / σ₀)` so that all three are of order one.

use dr_core::{Error, FitResult, Result};
use dr_hist::FinalizedHistogram1D;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::optimizer::{Minimizer, MinimizerConfig, Objective};

/// Parameter names, in fit order.
pub const PARAMETER_NAMES: [&str; 3] = ["amplitude", "mean", "sigma"];

const MIN_BINS: usize = 3;

/// Evaluate the Gaussian model.
#[inline]
pub fn gaussian(x: f64, amplitude: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    amplitude * (-0.5 * z * z).exp()
}

/// Bin centers, contents and errors selected for a fit.
#[derive(Debug, Clone, Default)]
pub struct BinnedPoints {
    x: Vec<f64>,
    y: Vec<f64>,
    err: Vec<f64>,
}

impl BinnedPoints {
    /// Select bins with center in `[lo, hi]` and strictly positive error.
    pub fn from_histogram(hist: &FinalizedHistogram1D, lo: f64, hi: f64) -> Self {
        let centers = hist.bin_centers();
        let mut out = Self::default();
        for i in hist.binning().bins_within(lo, hi) {
            let e = hist.errors()[i];
            if e > 0.0 && e.is_finite() {
                out.x.push(centers[i]);
                out.y.push(hist.contents()[i]);
                out.err.push(e);
            }
        }
        out
    }

    /// Number of usable bins.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether no bin is usable.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Starting values `(A₀, μ₀, σ₀)`: peak content, weighted mean, weighted RMS.
    fn initial_guess(&self, lo: f64, hi: f64) -> (f64, f64, f64) {
        let amp = self.y.iter().copied().fold(0.0_f64, f64::max);
        let sw: f64 = self.y.iter().filter(|&&w| w > 0.0).sum();
        let fallback_sigma = (hi - lo) / 6.0;
        if sw <= 0.0 {
            return (amp.max(1.0), 0.5 * (lo + hi), fallback_sigma);
        }
        let mean =
            self.x.iter().zip(&self.y).filter(|(_, w)| **w > 0.0).map(|(x, w)| x * w).sum::<f64>()
                / sw;
        let var = self
            .x
            .iter()
            .zip(&self.y)
            .filter(|(_, w)| **w > 0.0)
            .map(|(x, w)| w * (x - mean).powi(2))
            .sum::<f64>()
            / sw;
        let sigma = var.sqrt();
        let sigma = if sigma.is_finite() && sigma > 0.0 { sigma } else { fallback_sigma };
        (amp.max(f64::MIN_POSITIVE), mean, sigma)
    }

    /// `½ χ²` at the physical parameters.
    pub fn half_chi2(&self, amplitude: f64, mean: f64, sigma: f64) -> f64 {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.err)
            .map(|((&x, &y), &e)| {
                let r = (y - gaussian(x, amplitude, mean, sigma)) / e;
                r * r
            })
            .sum::<f64>()
            * 0.5
    }

    /// Gradient of `½ χ²` with respect to `(A, μ, σ)`.
    fn half_chi2_grad(&self, amplitude: f64, mean: f64, sigma: f64) -> [f64; 3] {
        let mut g = [0.0; 3];
        for ((&x, &y), &e) in self.x.iter().zip(&self.y).zip(&self.err) {
            let z = (x - mean) / sigma;
            let shape = (-0.5 * z * z).exp();
            let f = amplitude * shape;
            let c = -(y - f) / (e * e);
            g[0] += c * shape;
            g[1] += c * f * z / sigma;
            g[2] += c * f * z * z / sigma;
        }
        g
    }
}

/// `½ χ²` in rescaled coordinates.
struct ScaledChi2<'a> {
    points: &'a BinnedPoints,
    amp0: f64,
    mean0: f64,
    sigma0: f64,
}

impl ScaledChi2<'_> {
    fn physical(&self, p: &[f64]) -> (f64, f64, f64) {
        (self.amp0 * p[0], self.mean0 + self.sigma0 * p[1], self.sigma0 * p[2])
    }

    fn scales(&self) -> [f64; 3] {
        [self.amp0, self.sigma0, self.sigma0]
    }
}

impl Objective for ScaledChi2<'_> {
    fn eval(&self, p: &[f64]) -> Result<f64> {
        let (a, m, s) = self.physical(p);
        Ok(self.points.half_chi2(a, m, s))
    }

    fn gradient(&self, p: &[f64]) -> Result<Vec<f64>> {
        let (a, m, s) = self.physical(p);
        let g = self.points.half_chi2_grad(a, m, s);
        Ok(g.iter().zip(self.scales()).map(|(gi, k)| gi * k).collect())
    }
}

/// Result of a Gaussian resolution fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianFit {
    /// Parameters `amplitude`, `mean`, `sigma` with uncertainties and χ².
    pub result: FitResult,
    /// Upper-tail χ² probability, `None` when `ndf == 0`.
    pub p_value: Option<f64>,
    /// Fit window `(lo, hi)`.
    pub window: (f64, f64),
}

impl GaussianFit {
    /// Fitted amplitude and uncertainty.
    pub fn amplitude(&self) -> (f64, f64) {
        (self.result.parameters[0], self.result.uncertainties[0])
    }

    /// Fitted mean and uncertainty.
    pub fn mean(&self) -> (f64, f64) {
        (self.result.parameters[1], self.result.uncertainties[1])
    }

    /// Fitted sigma and uncertainty.
    pub fn sigma(&self) -> (f64, f64) {
        (self.result.parameters[2], self.result.uncertainties[2])
    }

    /// Model value at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let p = &self.result.parameters;
        gaussian(x, p[0], p[1], p[2])
    }

    /// Relative resolution `σ/μ` and its first-order propagated uncertainty.
    ///
    /// The mean-sigma covariance term is included when available.
    pub fn resolution(&self) -> (f64, f64) {
        let (mu, dmu) = self.mean();
        let (s, ds) = self.sigma();
        let r = s / mu;
        // Row-major 3×3; (mean, sigma) sits at index 5.
        let cov_ms = self.result.covariance.as_ref().map_or(0.0, |c| c[5]);
        let var = (ds / mu).powi(2) + (s * dmu / (mu * mu)).powi(2)
            - 2.0 * s / (mu * mu * mu) * cov_ms;
        (r, var.max(0.0).sqrt())
    }

    /// `n` evenly spaced `(x, f(x))` samples across the fit window.
    pub fn curve(&self, n: usize) -> Vec<(f64, f64)> {
        let (lo, hi) = self.window;
        if n < 2 {
            return vec![(lo, self.eval(lo))];
        }
        let step = (hi - lo) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = lo + step * i as f64;
                (x, self.eval(x))
            })
            .collect()
    }
}

/// Weighted least-squares Gaussian fitter.
#[derive(Debug, Clone, Default)]
pub struct ResolutionFitter {
    minimizer: Minimizer,
}

impl ResolutionFitter {
    /// Create a fitter with the given minimizer settings.
    pub fn new(config: MinimizerConfig) -> Self {
        Self { minimizer: Minimizer::new(config) }
    }

    /// Fit the histogram over `[lo, hi]`.
    ///
    /// Fails with [`Error::FitNotConverged`] when fewer than three bins are
    /// usable, the minimizer does not converge, or the result is not finite.
    pub fn fit(&self, hist: &FinalizedHistogram1D, lo: f64, hi: f64) -> Result<GaussianFit> {
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(Error::Validation(format!("invalid fit window [{lo}, {hi}]")));
        }
        let points = BinnedPoints::from_histogram(hist, lo, hi);
        if points.len() < MIN_BINS {
            return Err(Error::FitNotConverged(format!(
                "'{}': only {} usable bins in [{lo}, {hi}]",
                hist.name(),
                points.len()
            )));
        }

        let (amp0, mean0, sigma0) = points.initial_guess(lo, hi);
        log::debug!("fit '{}' start: A={amp0:.4} mu={mean0:.4} sigma={sigma0:.4}", hist.name());

        let objective = ScaledChi2 { points: &points, amp0, mean0, sigma0 };
        let bounds = [
            (1e-6, 1e3),
            ((lo - mean0) / sigma0, (hi - mean0) / sigma0),
            (1e-4, 10.0 * (hi - lo) / sigma0),
        ];
        let min = self
            .minimizer
            .minimize(&objective, &[1.0, 0.0, 1.0], &bounds)
            .map_err(|e| Error::FitNotConverged(format!("'{}': {e}", hist.name())))?;
        if !min.converged {
            return Err(Error::FitNotConverged(format!("'{}': {}", hist.name(), min.message)));
        }

        let (a, m, s) = objective.physical(&min.parameters);
        if ![a, m, s, min.fval].iter().all(|v| v.is_finite()) {
            return Err(Error::FitNotConverged(format!(
                "'{}': non-finite result (A={a}, mu={m}, sigma={s})",
                hist.name()
            )));
        }

        let hessian = scaled_hessian(&objective, &min.parameters)?;
        let scales = objective.scales();
        let (uncertainties, covariance) = match invert_hessian(&hessian) {
            Some(cov_s) => {
                let n = 3;
                let mut cov = vec![0.0; n * n];
                for i in 0..n {
                    for j in 0..n {
                        cov[i * n + j] = cov_s[(i, j)] * scales[i] * scales[j];
                    }
                }
                let unc = (0..n).map(|i| cov[i * n + i].sqrt()).collect();
                (unc, Some(cov))
            }
            None => {
                log::warn!("fit '{}': Hessian not invertible, using diagonal errors", hist.name());
                let unc = (0..3)
                    .map(|i| scales[i] / hessian[(i, i)].abs().max(1e-12).sqrt())
                    .collect();
                (unc, None)
            }
        };

        let chi2 = 2.0 * min.fval;
        let ndf = points.len() - PARAMETER_NAMES.len();
        let p_value = (ndf > 0)
            .then(|| ChiSquared::new(ndf as f64).ok().map(|d| d.sf(chi2)))
            .flatten();

        let mut result = FitResult::new(
            PARAMETER_NAMES.iter().map(|s| s.to_string()).collect(),
            vec![a, m, s],
            uncertainties,
            chi2,
            ndf,
            true,
            min.n_iter,
        );
        if let Some(cov) = covariance {
            result = result.with_covariance(cov);
        }

        log::debug!("fit '{}' done: {min}", hist.name());
        Ok(GaussianFit { result, p_value, window: (lo, hi) })
    }
}

/// Hessian of the objective by forward differences of the analytic gradient.
fn scaled_hessian(objective: &dyn Objective, at: &[f64]) -> Result<DMatrix<f64>> {
    let n = at.len();
    let g0 = objective.gradient(at)?;
    let mut h = DMatrix::zeros(n, n);
    for j in 0..n {
        let eps = 1e-4 * at[j].abs().max(1.0);
        let mut shifted = at.to_vec();
        shifted[j] += eps;
        let g1 = objective.gradient(&shifted)?;
        for i in 0..n {
            h[(i, j)] = (g1[i] - g0[i]) / eps;
        }
    }
    let ht = h.transpose();
    Ok((&h + &ht) * 0.5)
}

/// Covariance as the inverse Hessian, damping the diagonal until Cholesky succeeds.
fn invert_hessian(hessian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let n = hessian.nrows();
    let identity = DMatrix::identity(n, n);
    let diag_scale = (0..n).map(|i| hessian[(i, i)].abs()).fold(0.0_f64, f64::max).max(1.0);

    let mut damped = hessian.clone();
    let mut damping = 0.0_f64;
    for _ in 0..10 {
        if let Some(chol) = nalgebra::linalg::Cholesky::new(damped.clone()) {
            return Some(chol.solve(&identity));
        }
        let next = if damping == 0.0 { diag_scale * 1e-9 } else { damping * 10.0 };
        for i in 0..n {
            damped[(i, i)] += next - damping;
        }
        damping = next;
    }

    let cov = damped.lu().try_inverse()?;
    (0..n).all(|i| cov[(i, i)].is_finite() && cov[(i, i)] > 0.0).then_some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dr_hist::{Binning, Histogram1D};
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    fn sampled(n: usize, mean: f64, sigma: f64, seed: u64) -> FinalizedHistogram1D {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(mean, sigma).unwrap();
        let mut h = Histogram1D::new("E_S", Binning::new(100, 10.0, 30.0).unwrap());
        for _ in 0..n {
            h.fill(normal.sample(&mut rng));
        }
        h.finalize()
    }

    #[test]
    fn gaussian_shape() {
        assert_relative_eq!(gaussian(2.0, 3.0, 2.0, 0.5), 3.0);
        assert_relative_eq!(gaussian(2.5, 1.0, 2.0, 0.5), (-0.5_f64).exp());
    }

    #[test]
    fn recovers_mean_and_sigma() {
        let h = sampled(20_000, 20.0, 1.5, 42);
        let fit = ResolutionFitter::default().fit(&h, 10.0, 30.0).unwrap();
        let (mu, dmu) = fit.mean();
        let (s, ds) = fit.sigma();
        assert!((mu - 20.0).abs() / 20.0 < 0.01, "mean {mu}");
        assert!((s - 1.5).abs() / 1.5 < 0.05, "sigma {s}");
        assert!(dmu > 0.0 && dmu < 0.1, "mean error {dmu}");
        assert!(ds > 0.0 && ds < 0.1, "sigma error {ds}");
        assert_eq!(fit.result.names, vec!["amplitude", "mean", "sigma"]);
        assert!(fit.result.converged);
    }

    #[test]
    fn reports_chi2_ndf_and_p_value() {
        let h = sampled(10_000, 20.0, 2.0, 7);
        let fit = ResolutionFitter::default().fit(&h, 10.0, 30.0).unwrap();
        let usable = BinnedPoints::from_histogram(&h, 10.0, 30.0).len();
        assert_eq!(fit.result.ndf, usable - 3);
        let per_ndf = fit.result.chi2_per_ndf().unwrap();
        assert!(per_ndf > 0.3 && per_ndf < 3.0, "chi2/ndf {per_ndf}");
        let p = fit.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn resolution_propagates_errors() {
        let h = sampled(10_000, 20.0, 2.0, 11);
        let fit = ResolutionFitter::default().fit(&h, 10.0, 30.0).unwrap();
        let (r, dr) = fit.resolution();
        assert_relative_eq!(r, fit.sigma().0 / fit.mean().0);
        assert!((r - 0.1).abs() < 0.01, "sigma/mu {r}");
        assert!(dr > 0.0 && dr < r);
    }

    #[test]
    fn curve_spans_window() {
        let h = sampled(10_000, 20.0, 2.0, 3);
        let fit = ResolutionFitter::default().fit(&h, 10.0, 30.0).unwrap();
        let c = fit.curve(201);
        assert_eq!(c.len(), 201);
        assert_relative_eq!(c[0].0, 10.0);
        assert_relative_eq!(c[200].0, 30.0);
        let peak = c.iter().map(|p| p.1).fold(0.0_f64, f64::max);
        assert_relative_eq!(peak, fit.amplitude().0, max_relative = 0.01);
    }

    #[test]
    fn too_few_bins_is_not_converged() {
        let mut h = Histogram1D::new("E_S", Binning::new(10, 0.0, 10.0).unwrap());
        h.fill(4.5);
        h.fill(5.5);
        let err = ResolutionFitter::default().fit(&h.finalize(), 0.0, 10.0).unwrap_err();
        assert!(matches!(err, Error::FitNotConverged(_)), "{err}");
    }

    #[test]
    fn empty_histogram_is_not_converged() {
        let h = Histogram1D::new("E_S", Binning::new(10, 0.0, 10.0).unwrap()).finalize();
        assert!(matches!(
            ResolutionFitter::default().fit(&h, 0.0, 10.0),
            Err(Error::FitNotConverged(_))
        ));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let h = sampled(100, 20.0, 2.0, 1);
        assert!(matches!(
            ResolutionFitter::default().fit(&h, 30.0, 10.0),
            Err(Error::Validation(_))
        ));
    }
}
