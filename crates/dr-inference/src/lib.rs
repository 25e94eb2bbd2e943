//! # dr-inference
//!
//! Resolution fits on finalized histograms.
//!
//! - [`optimizer`]: bounded L-BFGS minimizer (argmin backend)
//! - [`gaussian`]: weighted least-squares fit of `A·exp(-(x-μ)²/(2σ²))`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Weighted least-squares Gaussian fit on binned data.
pub mod gaussian;
/// Generic numerical minimizer (L-BFGS backend).
pub mod optimizer;

pub use gaussian::{BinnedPoints, GaussianFit, ResolutionFitter, gaussian};
pub use optimizer::{Minimizer, MinimizerConfig, Minimum, Objective};
