//! Equal-width axis binning.

use dr_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Result of locating a value on a [`Binning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinIndex {
    /// Below the lower edge of the first bin.
    Underflow,
    /// In-range bin (0-based).
    Bin(usize),
    /// At or above the upper edge of the last bin, or NaN.
    Overflow,
}

/// `n_bins` equal-width bins covering `[x_min, x_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    n_bins: usize,
    x_min: f64,
    x_max: f64,
}

impl Binning {
    /// Create a binning, rejecting empty, inverted or non-finite ranges.
    pub fn new(n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("binning needs at least one bin".into()));
        }
        if !x_min.is_finite() || !x_max.is_finite() {
            return Err(Error::Validation(format!(
                "binning range must be finite (got [{x_min}, {x_max}])"
            )));
        }
        if x_max <= x_min {
            return Err(Error::Validation(format!(
                "binning range is empty or inverted: [{x_min}, {x_max}]"
            )));
        }
        Ok(Self { n_bins, x_min, x_max })
    }

    /// Number of in-range bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Lower edge of the first bin.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Upper edge of the last bin.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Bin width.
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_bins as f64
    }

    /// Locate `x`. NaN is counted as overflow.
    #[inline]
    pub fn locate(&self, x: f64) -> BinIndex {
        if x < self.x_min {
            return BinIndex::Underflow;
        }
        if x >= self.x_max || x.is_nan() {
            return BinIndex::Overflow;
        }
        let i = ((x - self.x_min) / self.width()) as usize;
        // Rounding can push values just below x_max into bin n.
        BinIndex::Bin(i.min(self.n_bins - 1))
    }

    /// Lower edge of bin `i`.
    #[inline]
    pub fn low_edge(&self, i: usize) -> f64 {
        self.x_min + i as f64 * self.width()
    }

    /// Center of bin `i`.
    #[inline]
    pub fn center(&self, i: usize) -> f64 {
        self.x_min + (i as f64 + 0.5) * self.width()
    }

    /// All bin edges (length `n_bins + 1`).
    pub fn edges(&self) -> Vec<f64> {
        let mut edges: Vec<f64> = (0..self.n_bins).map(|i| self.low_edge(i)).collect();
        edges.push(self.x_max);
        edges
    }

    /// Indices of the bins whose centers fall inside `[lo, hi]`.
    pub fn bins_within(&self, lo: f64, hi: f64) -> std::ops::Range<usize> {
        let first = (0..self.n_bins).find(|&i| self.center(i) >= lo).unwrap_or(self.n_bins);
        let last = (0..self.n_bins).rev().find(|&i| self.center(i) <= hi).map_or(0, |i| i + 1);
        first..last.max(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_ranges() {
        assert!(Binning::new(0, 0.0, 1.0).is_err());
        assert!(Binning::new(10, 1.0, 1.0).is_err());
        assert!(Binning::new(10, 2.0, 1.0).is_err());
        assert!(Binning::new(10, 0.0, f64::INFINITY).is_err());
        assert!(Binning::new(10, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn locate_edge_cases() {
        let b = Binning::new(3, 0.0, 3.0).unwrap();
        assert_eq!(b.locate(-0.5), BinIndex::Underflow);
        assert_eq!(b.locate(3.0), BinIndex::Overflow);
        assert_eq!(b.locate(f64::NAN), BinIndex::Overflow);
        assert_eq!(b.locate(0.0), BinIndex::Bin(0));
        assert_eq!(b.locate(1.0), BinIndex::Bin(1));
        assert_eq!(b.locate(2.99), BinIndex::Bin(2));
        assert_eq!(b.locate(3.0 - 1e-15), BinIndex::Bin(2));
    }

    #[test]
    fn edges_and_centers() {
        let b = Binning::new(4, -1.0, 1.0).unwrap();
        assert_eq!(b.edges(), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(b.center(0), -0.75);
        assert_eq!(b.width(), 0.5);
    }

    #[test]
    fn bins_within_range() {
        let b = Binning::new(10, 0.0, 10.0).unwrap();
        assert_eq!(b.bins_within(0.0, 10.0), 0..10);
        assert_eq!(b.bins_within(2.0, 4.0), 2..4);
        assert_eq!(b.bins_within(20.0, 30.0).len(), 0);
    }
}
