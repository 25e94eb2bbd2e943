//! One-dimensional weighted accumulator and its finalized, read-only form.

use dr_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::binning::{BinIndex, Binning};

/// Sum of weights and sum of squared weights for an out-of-range bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowBucket {
    /// Sum of weights.
    pub sumw: f64,
    /// Sum of weights squared.
    pub sumw2: f64,
}

impl FlowBucket {
    #[inline]
    fn add(&mut self, w: f64) {
        self.sumw += w;
        self.sumw2 += w * w;
    }

    fn merge(&mut self, other: &FlowBucket) {
        self.sumw += other.sumw;
        self.sumw2 += other.sumw2;
    }
}

/// Title and axis labels carried along for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisLabels {
    /// Histogram title.
    pub title: String,
    /// X axis label.
    pub x: String,
    /// Y axis label.
    pub y: String,
}

impl AxisLabels {
    /// Build labels from title, x and y strings.
    pub fn new(title: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self { title: title.into(), x: x.into(), y: y.into() }
    }
}

/// Mutable 1D accumulator.
///
/// Every fill lands in exactly one place: an in-range bin, the underflow
/// bucket or the overflow bucket. Nothing is dropped.
#[derive(Debug, Clone)]
pub struct Histogram1D {
    name: String,
    labels: AxisLabels,
    binning: Binning,
    sumw: Vec<f64>,
    sumw2: Vec<f64>,
    underflow: FlowBucket,
    overflow: FlowBucket,
    entries: u64,
}

impl Histogram1D {
    /// Create an empty accumulator.
    pub fn new(name: impl Into<String>, binning: Binning) -> Self {
        let n = binning.n_bins();
        Self {
            name: name.into(),
            labels: AxisLabels::default(),
            binning,
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            underflow: FlowBucket::default(),
            overflow: FlowBucket::default(),
            entries: 0,
        }
    }

    /// Attach title and axis labels.
    pub fn with_labels(mut self, labels: AxisLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binning.
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Number of fill calls so far (including flows).
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Fill with unit weight.
    #[inline]
    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    /// Fill `x` with weight `w`.
    #[inline]
    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        self.entries += 1;
        match self.binning.locate(x) {
            BinIndex::Bin(i) => {
                self.sumw[i] += w;
                self.sumw2[i] += w * w;
            }
            BinIndex::Underflow => self.underflow.add(w),
            BinIndex::Overflow => self.overflow.add(w),
        }
    }

    /// Sum of weights of all fills, flows included.
    pub fn total_weight(&self) -> f64 {
        self.sumw.iter().sum::<f64>() + self.underflow.sumw + self.overflow.sumw
    }

    /// Add another accumulator bin by bin (Σw and Σw² separately).
    pub fn merge(&mut self, other: &Histogram1D) -> Result<()> {
        if self.binning != other.binning {
            return Err(Error::BinningMismatch(format!(
                "'{}' {:?} vs '{}' {:?}",
                self.name, self.binning, other.name, other.binning
            )));
        }
        for (a, b) in self.sumw.iter_mut().zip(&other.sumw) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        self.underflow.merge(&other.underflow);
        self.overflow.merge(&other.overflow);
        self.entries += other.entries;
        Ok(())
    }

    /// Freeze the accumulator and compute per-bin errors `sqrt(Σw²)`.
    pub fn finalize(self) -> FinalizedHistogram1D {
        let errors = self.sumw2.iter().map(|w2| w2.sqrt()).collect();
        FinalizedHistogram1D {
            name: self.name,
            labels: self.labels,
            binning: self.binning,
            contents: self.sumw,
            sumw2: self.sumw2,
            errors,
            underflow: self.underflow,
            overflow: self.overflow,
            entries: self.entries,
        }
    }
}

/// Read-only 1D histogram produced by [`Histogram1D::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedHistogram1D {
    name: String,
    labels: AxisLabels,
    binning: Binning,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    errors: Vec<f64>,
    underflow: FlowBucket,
    overflow: FlowBucket,
    entries: u64,
}

impl FinalizedHistogram1D {
    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title and axis labels.
    pub fn labels(&self) -> &AxisLabels {
        &self.labels
    }

    /// Binning.
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Sum of weights per in-range bin.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Sum of squared weights per in-range bin.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Per-bin statistical error, `sqrt(Σw²)`.
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Underflow bucket.
    pub fn underflow(&self) -> FlowBucket {
        self.underflow
    }

    /// Overflow bucket.
    pub fn overflow(&self) -> FlowBucket {
        self.overflow
    }

    /// Number of fill calls (including flows).
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Bin edges (length `n_bins + 1`).
    pub fn bin_edges(&self) -> Vec<f64> {
        self.binning.edges()
    }

    /// Bin centers.
    pub fn bin_centers(&self) -> Vec<f64> {
        (0..self.binning.n_bins()).map(|i| self.binning.center(i)).collect()
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Sum of weights including under/overflow.
    pub fn total_weight(&self) -> f64 {
        self.integral() + self.underflow.sumw + self.overflow.sumw
    }

    /// Sum of contents of the bins whose centers lie in `[lo, hi]`.
    pub fn integral_within(&self, lo: f64, hi: f64) -> f64 {
        self.contents[self.binning.bins_within(lo, hi)].iter().sum()
    }

    /// Index and content of the highest in-range bin, `None` when empty.
    pub fn max_bin(&self) -> Option<(usize, f64)> {
        self.contents
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| *c > 0.0)
            .fold(None, |best, (i, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((i, c)),
            })
    }

    /// Weighted mean of in-range bin centers.
    pub fn mean(&self) -> Option<f64> {
        let sw = self.integral();
        if sw <= 0.0 {
            return None;
        }
        let swx: f64 =
            self.contents.iter().enumerate().map(|(i, c)| c * self.binning.center(i)).sum();
        Some(swx / sw)
    }

    /// Weighted standard deviation of in-range bin centers.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sw = self.integral();
        let var: f64 = self
            .contents
            .iter()
            .enumerate()
            .map(|(i, c)| c * (self.binning.center(i) - mean).powi(2))
            .sum::<f64>()
            / sw;
        Some(var.max(0.0).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hist(n: usize, lo: f64, hi: f64) -> Histogram1D {
        Histogram1D::new("h", Binning::new(n, lo, hi).unwrap())
    }

    #[test]
    fn fill_simple() {
        let mut h = hist(3, 0.0, 3.0);
        for x in [0.5, 1.5, 2.5, 0.5, -1.0, 3.5] {
            h.fill(x);
        }
        let f = h.finalize();
        assert_eq!(f.contents(), &[2.0, 1.0, 1.0]);
        assert_eq!(f.underflow().sumw, 1.0);
        assert_eq!(f.overflow().sumw, 1.0);
        assert_eq!(f.entries(), 6);
        assert_eq!(f.total_weight(), 6.0);
    }

    #[test]
    fn fill_with_weight_tracks_sumw2() {
        let mut h = hist(2, 0.0, 2.0);
        h.fill_weighted(0.5, 2.0);
        h.fill_weighted(1.5, 3.0);
        h.fill_weighted(0.5, 1.0);
        h.fill_weighted(5.0, 4.0);
        let f = h.finalize();
        assert_eq!(f.contents(), &[3.0, 3.0]);
        assert_eq!(f.sumw2(), &[5.0, 9.0]);
        assert_relative_eq!(f.errors()[0], 5.0_f64.sqrt());
        assert_eq!(f.errors()[1], 3.0);
        assert_eq!(f.overflow(), FlowBucket { sumw: 4.0, sumw2: 16.0 });
    }

    #[test]
    fn contents_never_decrease_with_positive_weights() {
        let mut h = hist(5, 0.0, 5.0);
        let mut prev = vec![0.0; 5];
        for (k, x) in [0.1, 4.9, 2.2, 2.3, 9.0, -3.0, 1.0].into_iter().enumerate() {
            h.fill_weighted(x, 0.5 + k as f64);
            let now = h.clone().finalize().contents().to_vec();
            assert!(now.iter().zip(&prev).all(|(n, p)| n >= p));
            prev = now;
        }
    }

    #[test]
    fn merge_matches_single_pass() {
        let values = [0.2, 0.7, 1.4, 3.3, -0.1, 2.2, 2.9, 5.0];
        let mut full = hist(3, 0.0, 3.0);
        let mut a = hist(3, 0.0, 3.0);
        let mut b = hist(3, 0.0, 3.0);
        for (i, &x) in values.iter().enumerate() {
            let w = 1.0 + i as f64 * 0.25;
            full.fill_weighted(x, w);
            if i % 2 == 0 {
                a.fill_weighted(x, w);
            } else {
                b.fill_weighted(x, w);
            }
        }
        let mut ab = a.clone();
        ab.merge(&b).unwrap();
        let mut ba = b.clone();
        ba.merge(&a).unwrap();

        let full = full.finalize();
        for merged in [ab.finalize(), ba.finalize()] {
            for (m, f) in merged.contents().iter().zip(full.contents()) {
                assert_relative_eq!(m, f, epsilon = 1e-12);
            }
            for (m, f) in merged.sumw2().iter().zip(full.sumw2()) {
                assert_relative_eq!(m, f, epsilon = 1e-12);
            }
            assert_relative_eq!(merged.overflow().sumw2, full.overflow().sumw2);
            assert_eq!(merged.entries(), full.entries());
        }
    }

    #[test]
    fn merge_rejects_different_binning() {
        let mut a = hist(3, 0.0, 3.0);
        let b = hist(4, 0.0, 3.0);
        let err = a.merge(&b).unwrap_err();
        assert!(err.to_string().contains("binning mismatch"));
    }

    #[test]
    fn summary_statistics() {
        let mut h = hist(10, 0.0, 10.0);
        h.fill_weighted(4.5, 1.0);
        h.fill_weighted(5.5, 1.0);
        h.fill_weighted(5.5, 2.0);
        let f = h.finalize();
        assert_eq!(f.max_bin(), Some((5, 3.0)));
        assert_relative_eq!(f.mean().unwrap(), 5.25);
        assert_relative_eq!(f.std_dev().unwrap(), 0.1875_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(f.integral_within(5.0, 6.0), 3.0);
    }

    #[test]
    fn empty_histogram_has_no_moments() {
        let f = hist(4, 0.0, 1.0).finalize();
        assert!(f.mean().is_none());
        assert!(f.std_dev().is_none());
        assert!(f.max_bin().is_none());
        assert_eq!(f.bin_edges().len(), 5);
    }
}
