//! # dr-hist
//!
//! Equal-width binned accumulators with explicit under/overflow buckets and
//! per-bin sum of squared weights (`Sumw2`).
//!
//! Accumulators are mutable while events are being processed and are turned
//! into read-only finalized histograms (with per-bin errors) by
//! [`Histogram1D::finalize`] / [`Histogram2D::finalize`].
//!
//! ## Example
//!
//! ```
//! use dr_hist::{Binning, Histogram1D};
//!
//! let mut h = Histogram1D::new("E_S", Binning::new(10, 0.0, 10.0).unwrap());
//! h.fill(2.5);
//! h.fill_weighted(7.5, 2.0);
//! h.fill(12.0); // overflow
//! let f = h.finalize();
//! assert_eq!(f.contents()[2], 1.0);
//! assert_eq!(f.errors()[7], 2.0);
//! assert_eq!(f.overflow().sumw, 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binning;
pub mod histogram;
pub mod histogram2d;

pub use binning::{BinIndex, Binning};
pub use histogram::{AxisLabels, FinalizedHistogram1D, FlowBucket, Histogram1D};
pub use histogram2d::{FinalizedHistogram2D, Histogram2D};
