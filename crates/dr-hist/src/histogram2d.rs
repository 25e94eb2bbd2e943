//! Two-dimensional weighted accumulator (spatial hit maps).

use dr_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::binning::{BinIndex, Binning};
use crate::histogram::{AxisLabels, FlowBucket};

/// Position of a coordinate relative to the axis range: 0 = under, 1 = in, 2 = over.
#[inline]
fn region(idx: BinIndex) -> usize {
    match idx {
        BinIndex::Underflow => 0,
        BinIndex::Bin(_) => 1,
        BinIndex::Overflow => 2,
    }
}

/// Mutable 2D accumulator.
///
/// Out-of-range fills go to a 3×3 grid of flow buckets indexed by
/// (x region, y region); the center cell of that grid is never used.
#[derive(Debug, Clone)]
pub struct Histogram2D {
    name: String,
    labels: AxisLabels,
    x: Binning,
    y: Binning,
    /// Row-major `[iy * nx + ix]`.
    sumw: Vec<f64>,
    sumw2: Vec<f64>,
    flows: [FlowBucket; 9],
    entries: u64,
}

impl Histogram2D {
    /// Create an empty 2D accumulator.
    pub fn new(name: impl Into<String>, x: Binning, y: Binning) -> Self {
        let n = x.n_bins() * y.n_bins();
        Self {
            name: name.into(),
            labels: AxisLabels::default(),
            x,
            y,
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            flows: [FlowBucket::default(); 9],
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

    /// Number of fill calls so far.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Fill `(x, y)` with weight `w`.
    #[inline]
    pub fn fill_weighted(&mut self, x: f64, y: f64, w: f64) {
        self.entries += 1;
        let (ix, iy) = (self.x.locate(x), self.y.locate(y));
        if let (BinIndex::Bin(i), BinIndex::Bin(j)) = (ix, iy) {
            let k = j * self.x.n_bins() + i;
            self.sumw[k] += w;
            self.sumw2[k] += w * w;
        } else {
            let f = &mut self.flows[region(iy) * 3 + region(ix)];
            f.sumw += w;
            f.sumw2 += w * w;
        }
    }

    /// Sum of weights of all fills, flows included.
    pub fn total_weight(&self) -> f64 {
        self.sumw.iter().sum::<f64>() + self.flows.iter().map(|f| f.sumw).sum::<f64>()
    }

    /// Add another accumulator bin by bin.
    pub fn merge(&mut self, other: &Histogram2D) -> Result<()> {
        if self.x != other.x || self.y != other.y {
            return Err(Error::BinningMismatch(format!(
                "'{}' ({:?} × {:?}) vs '{}' ({:?} × {:?})",
                self.name, self.x, self.y, other.name, other.x, other.y
            )));
        }
        for (a, b) in self.sumw.iter_mut().zip(&other.sumw) {
            *a += b;
        }
        for (a, b) in self.sumw2.iter_mut().zip(&other.sumw2) {
            *a += b;
        }
        for (a, b) in self.flows.iter_mut().zip(&other.flows) {
            a.sumw += b.sumw;
            a.sumw2 += b.sumw2;
        }
        self.entries += other.entries;
        Ok(())
    }

    /// Freeze the accumulator and compute per-cell errors.
    pub fn finalize(self) -> FinalizedHistogram2D {
        let errors = self.sumw2.iter().map(|w2| w2.sqrt()).collect();
        FinalizedHistogram2D {
            name: self.name,
            labels: self.labels,
            x: self.x,
            y: self.y,
            contents: self.sumw,
            sumw2: self.sumw2,
            errors,
            flows: self.flows,
            entries: self.entries,
        }
    }
}

/// Read-only 2D histogram produced by [`Histogram2D::finalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedHistogram2D {
    name: String,
    labels: AxisLabels,
    x: Binning,
    y: Binning,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    errors: Vec<f64>,
    flows: [FlowBucket; 9],
    entries: u64,
}

impl FinalizedHistogram2D {
    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title and axis labels.
    pub fn labels(&self) -> &AxisLabels {
        &self.labels
    }

    /// X binning.
    pub fn x_binning(&self) -> &Binning {
        &self.x
    }

    /// Y binning.
    pub fn y_binning(&self) -> &Binning {
        &self.y
    }

    /// Row-major contents `[iy * nx + ix]`.
    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    /// Row-major per-cell errors.
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Content of cell `(ix, iy)`.
    pub fn content(&self, ix: usize, iy: usize) -> f64 {
        self.contents[iy * self.x.n_bins() + ix]
    }

    /// Flow bucket for the given regions (0 = under, 1 = in range, 2 = over).
    pub fn flow(&self, x_region: usize, y_region: usize) -> FlowBucket {
        self.flows[y_region * 3 + x_region]
    }

    /// Number of fill calls.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of in-range cell contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Sum of weights including all flow buckets.
    pub fn total_weight(&self) -> f64 {
        self.integral() + self.flows.iter().map(|f| f.sumw).sum::<f64>()
    }

    /// Largest cell content (0 when empty).
    pub fn max_content(&self) -> f64 {
        self.contents.iter().copied().fold(0.0_f64, f64::max)
    }
}
