//! Bounded minimization through argmin's L-BFGS with a More-Thuente line search.
//!
//! Bounds are enforced by clamping: the objective is always evaluated at the
//! clamped point and gradient components pushing outwards at an active bound
//! are zeroed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use dr_core::{Error, Result};

/// Minimizer settings.
#[derive(Debug, Clone)]
pub struct MinimizerConfig {
    /// Iteration budget.
    pub max_iter: u64,
    /// Gradient-norm tolerance; the cost tolerance is derived from it.
    pub tol: f64,
    /// L-BFGS history length.
    pub m: usize,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self { max_iter: 1000, tol: 1e-6, m: 10 }
    }
}

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Parameters at the best point (within bounds).
    pub parameters: Vec<f64>,
    /// Objective value at the best point.
    pub fval: f64,
    /// Iterations used.
    pub n_iter: u64,
    /// Objective evaluations.
    pub n_fev: usize,
    /// Whether the solver reported convergence.
    pub converged: bool,
    /// Termination status as reported by argmin.
    pub message: String,
}

impl fmt::Display for Minimum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Minimum(fval={:.6}, n_iter={}, n_fev={}, converged={}, status={})",
            self.fval, self.n_iter, self.n_fev, self.converged, self.message
        )
    }
}

/// Function to minimize.
pub trait Objective: Send + Sync {
    /// Value at `params`.
    fn eval(&self, params: &[f64]) -> Result<f64>;

    /// Gradient at `params`; central differences unless overridden.
    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let mut grad = Vec::with_capacity(params.len());
        let mut shifted = params.to_vec();
        for i in 0..params.len() {
            let h = 1e-8 * params[i].abs().max(1.0);
            shifted[i] = params[i] + h;
            let up = self.eval(&shifted)?;
            shifted[i] = params[i] - h;
            let down = self.eval(&shifted)?;
            shifted[i] = params[i];
            grad.push((up - down) / (2.0 * h));
        }
        Ok(grad)
    }
}

fn clamp(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params.iter().zip(bounds).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

struct Problem<'a> {
    objective: &'a dyn Objective,
    bounds: &'a [(f64, f64)],
    n_fev: Arc<AtomicUsize>,
}

impl CostFunction for Problem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        self.n_fev.fetch_add(1, Ordering::Relaxed);
        self.objective
            .eval(&clamp(params, self.bounds))
            .map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

impl Gradient for Problem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, params: &Self::Param) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        let x = clamp(params, self.bounds);
        let mut g =
            self.objective.gradient(&x).map_err(|e| argmin::core::Error::msg(e.to_string()))?;

        // Projected gradient at active bounds.
        const EPS: f64 = 1e-12;
        for (gi, (&xi, &(lo, hi))) in g.iter_mut().zip(x.iter().zip(self.bounds)) {
            if (xi <= lo + EPS && *gi > 0.0) || (xi >= hi - EPS && *gi < 0.0) {
                *gi = 0.0;
            }
        }
        Ok(g)
    }
}

/// Bounded L-BFGS minimizer.
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: MinimizerConfig,
}

impl Minimizer {
    /// Create a minimizer with the given settings.
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &MinimizerConfig {
        &self.config
    }

    /// Minimize `objective` from `init` within `bounds`.
    ///
    /// Returns `Err` only for invalid input or a hard solver failure; running
    /// out of iterations is reported through [`Minimum::converged`].
    pub fn minimize(
        &self,
        objective: &dyn Objective,
        init: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<Minimum> {
        if init.len() != bounds.len() {
            return Err(Error::Validation(format!(
                "parameter/bounds length mismatch: {} != {}",
                init.len(),
                bounds.len()
            )));
        }

        let n_fev = Arc::new(AtomicUsize::new(0));
        let problem = Problem { objective, bounds, n_fev: Arc::clone(&n_fev) };

        let tol_cost = if self.config.tol == 0.0 { 0.0 } else { (0.1 * self.config.tol).max(1e-12) };
        let solver = LBFGS::new(MoreThuenteLineSearch::new(), self.config.m)
            .with_tolerance_grad(self.config.tol)
            .and_then(|s| s.with_tolerance_cost(tol_cost))
            .map_err(|e| Error::Validation(format!("invalid minimizer tolerance: {e}")))?;

        let res = Executor::new(problem, solver)
            .configure(|state| state.param(clamp(init, bounds)).max_iters(self.config.max_iter))
            .run()
            .map_err(|e| Error::Computation(format!("minimization failed: {e}")))?;

        let state = res.state();
        let best = state
            .get_best_param()
            .ok_or_else(|| Error::Computation("minimizer produced no parameters".into()))?;
        let parameters = clamp(best, bounds);
        let status = state.get_termination_status();
        let converged = matches!(
            status,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
                | TerminationStatus::Terminated(TerminationReason::TargetCostReached)
        );

        Ok(Minimum {
            parameters,
            fval: state.get_best_cost(),
            n_iter: state.get_iter(),
            n_fev: n_fev.load(Ordering::Relaxed),
            converged,
            message: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // f(x, y) = (x - 2)^2 + (y - 3)^2
    struct Bowl;

    impl Objective for Bowl {
        fn eval(&self, p: &[f64]) -> Result<f64> {
            Ok((p[0] - 2.0).powi(2) + (p[1] - 3.0).powi(2))
        }

        fn gradient(&self, p: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (p[0] - 2.0), 2.0 * (p[1] - 3.0)])
        }
    }

    #[test]
    fn finds_unconstrained_minimum() {
        let m = Minimizer::default()
            .minimize(&Bowl, &[0.0, 0.0], &[(-10.0, 10.0), (-10.0, 10.0)])
            .unwrap();
        assert!(m.converged, "{m}");
        assert_relative_eq!(m.parameters[0], 2.0, epsilon = 1e-4);
        assert_relative_eq!(m.parameters[1], 3.0, epsilon = 1e-4);
        assert!(m.n_fev > 0);
    }

    // Finite-difference gradient path.
    struct Shifted;

    impl Objective for Shifted {
        fn eval(&self, p: &[f64]) -> Result<f64> {
            Ok((p[0] + 1.5).powi(2) + 4.0)
        }
    }

    #[test]
    fn numerical_gradient_converges() {
        let m = Minimizer::default().minimize(&Shifted, &[3.0], &[(-10.0, 10.0)]).unwrap();
        assert_relative_eq!(m.parameters[0], -1.5, epsilon = 1e-4);
        assert_relative_eq!(m.fval, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn rejects_mismatched_bounds() {
        assert!(Minimizer::default().minimize(&Bowl, &[0.0], &[(0.0, 1.0), (0.0, 1.0)]).is_err());
    }
}
