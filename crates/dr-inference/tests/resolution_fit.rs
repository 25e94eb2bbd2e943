//! Resolution fits on histograms built the way a run builds them.

use dr_core::Error;
use dr_hist::{Binning, Histogram1D};
use dr_inference::{MinimizerConfig, ResolutionFitter};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

#[test]
fn fit_ignores_tails_outside_window() {
    let mut rng = StdRng::seed_from_u64(2024);
    let peak = Normal::new(50.0, 2.5).unwrap();
    let mut h = Histogram1D::new("E_S", Binning::new(100, 30.0, 70.0).unwrap());
    for _ in 0..15_000 {
        h.fill(peak.sample(&mut rng));
    }
    // Flat contamination far from the peak.
    for i in 0..400 {
        h.fill(31.0 + (i % 8) as f64 * 0.5);
    }
    let h = h.finalize();

    let fit = ResolutionFitter::default().fit(&h, 40.0, 60.0).unwrap();
    let (mu, _) = fit.mean();
    let (sigma, _) = fit.sigma();
    assert!((mu - 50.0).abs() < 0.5, "mean {mu}");
    assert!((sigma - 2.5).abs() / 2.5 < 0.05, "sigma {sigma}");
    assert_eq!(fit.window, (40.0, 60.0));
}

#[test]
fn tiny_iteration_budget_reports_non_convergence() {
    let mut rng = StdRng::seed_from_u64(5);
    let peak = Normal::new(20.0, 1.0).unwrap();
    let mut h = Histogram1D::new("E_S", Binning::new(100, 10.0, 30.0).unwrap());
    for _ in 0..5_000 {
        h.fill(peak.sample(&mut rng) + 3.0);
    }
    let fitter = ResolutionFitter::new(MinimizerConfig { max_iter: 1, tol: 0.0, m: 5 });
    match fitter.fit(&h.finalize(), 10.0, 30.0) {
        Err(Error::FitNotConverged(msg)) => assert!(msg.contains("E_S"), "{msg}"),
        other => panic!("expected FitNotConverged, got {other:?}"),
    }
}
