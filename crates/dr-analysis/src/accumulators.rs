//! The run's accumulator set.
//!
//! Binning is fixed by the three run thresholds (`low`, `truth`, `high`):
//!
//! | accumulator | bins | range |
//! |---|---|---|
//! | deposit (GeV) | 100 | `[low, high]` |
//! | charged / neutrino leak (MeV) | 100 | `[0, 1000·high]` |
//! | p.e. per event | 200 | `[0, 40000·truth/20]` |
//! | reconstructed energy (GeV) | 100 | `[low, high]` |
//! | fiber × plate map | 160×160 | `[-0.5, 400]²` |
//! | time (ns) | 600 | `[10, 70]` |
//! | wavelength (nm) | 120 | `[300, 900]` |
//! | p.e. per SiPM | 200 | `[0, 200]` |

use dr_core::{Error, Result};
use dr_hist::{AxisLabels, Binning, FinalizedHistogram1D, FinalizedHistogram2D, Histogram1D, Histogram2D};
use serde::{Deserialize, Serialize};

use crate::extract::EventContributions;

const MEV_PER_GEV: f64 = 1000.0;

/// Output suffixes, one per rendered accumulator.
pub mod suffix {
    /// Deposited energy.
    pub const DEPOSIT: &str = "Edep";
    /// Charged/other leak momentum.
    pub const LEAK: &str = "Pleak";
    /// Neutrino leak momentum.
    pub const LEAK_NU: &str = "Pleak_nu";
    /// Photo-electrons per event.
    pub const HITS_PER_EVENT: &str = "nHitpEventS";
    /// Reconstructed energy.
    pub const ENERGY: &str = "E_S";
    /// Fiber × plate map.
    pub const HIT_MAP: &str = "n2DHitS";
    /// Arrival time.
    pub const TIME: &str = "tS";
    /// Wavelength.
    pub const WAVELENGTH: &str = "wavS";
    /// Photo-electrons per SiPM.
    pub const HITS_PER_SENSOR: &str = "nhitS";
}

/// Run thresholds from the command line (GeV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRanges {
    /// Lower edge of the energy window.
    pub low: f64,
    /// Nominal beam energy.
    pub truth: f64,
    /// Upper edge of the energy window.
    pub high: f64,
}

impl AnalysisRanges {
    /// Validate the thresholds: all finite, `low < high`, `truth > 0`, `high > 0`.
    pub fn new(low: f64, truth: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && truth.is_finite() && high.is_finite()) {
            return Err(Error::Validation(format!(
                "thresholds must be finite (low={low}, truth={truth}, high={high})"
            )));
        }
        if low >= high {
            return Err(Error::Validation(format!("low ({low}) must be below high ({high})")));
        }
        if truth <= 0.0 || high <= 0.0 {
            return Err(Error::Validation(format!(
                "truth ({truth}) and high ({high}) must be positive"
            )));
        }
        Ok(Self { low, truth, high })
    }
}

/// Number of leak entries seen in each class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakTally {
    /// Non-neutrino entries.
    pub charged: u64,
    /// Neutrino entries.
    pub neutrino: u64,
}

impl LeakTally {
    /// All leak entries.
    pub fn total(&self) -> u64 {
        self.charged + self.neutrino
    }
}

/// Mutable accumulators for one run, owned by the driver.
#[derive(Debug, Clone)]
pub struct AccumulatorSet {
    deposit: Histogram1D,
    leak_charged: Histogram1D,
    leak_neutrino: Histogram1D,
    hits_per_event: Histogram1D,
    energy: Histogram1D,
    hit_map: Histogram2D,
    time: Histogram1D,
    wavelength: Histogram1D,
    hits_per_sensor: Histogram1D,
    leak_tally: LeakTally,
    events: u64,
}

fn h1(name: &str, n: usize, lo: f64, hi: f64, labels: (&str, &str, &str)) -> Result<Histogram1D> {
    Ok(Histogram1D::new(name, Binning::new(n, lo, hi)?)
        .with_labels(AxisLabels::new(labels.0, labels.1, labels.2)))
}

impl AccumulatorSet {
    /// Create empty accumulators for the given thresholds.
    pub fn new(ranges: &AnalysisRanges) -> Result<Self> {
        let AnalysisRanges { low, truth, high } = *ranges;
        let map_axis = Binning::new(160, -0.5, 400.0)?;
        Ok(Self {
            deposit: h1(suffix::DEPOSIT, 100, low, high, ("Energy deposit", "GeV", "Evt"))?,
            leak_charged: h1(suffix::LEAK, 100, 0.0, 1000.0 * high, ("Momentum leak", "MeV", "Evt"))?,
            leak_neutrino: h1(
                suffix::LEAK_NU,
                100,
                0.0,
                1000.0 * high,
                ("Neutrino energy leak", "MeV", "Evt"),
            )?,
            hits_per_event: h1(
                suffix::HITS_PER_EVENT,
                200,
                0.0,
                40000.0 * truth / 20.0,
                ("# of p.e. of Scintillation ch.", "# of p.e.", "Evt"),
            )?,
            energy: h1(suffix::ENERGY, 100, low, high, ("Scintillation Energy", "GeV", "Evt"))?,
            hit_map: Histogram2D::new(suffix::HIT_MAP, map_axis, map_axis)
                .with_labels(AxisLabels::new("Scintillation p.e. map", "fiber (mm)", "plate (mm)")),
            time: h1(suffix::TIME, 600, 10.0, 70.0, ("Scint time", "ns", "p.e."))?,
            wavelength: h1(suffix::WAVELENGTH, 120, 300.0, 900.0, ("Scint wavelength", "nm", "p.e."))?,
            hits_per_sensor: h1(
                suffix::HITS_PER_SENSOR,
                200,
                0.0,
                200.0,
                ("Number of Scint p.e./SiPM", "p.e.", "n"),
            )?,
            leak_tally: LeakTally::default(),
            events: 0,
        })
    }

    /// Events filled so far.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Leak entries per class so far.
    pub fn leak_tally(&self) -> LeakTally {
        self.leak_tally
    }

    /// Add one event's contributions.
    ///
    /// Every per-event accumulator receives exactly one fill; the per-sensor,
    /// map, time and wavelength accumulators receive one fill per item.
    pub fn fill_event(&mut self, c: &EventContributions) {
        let o = &c.observables;
        self.deposit.fill(o.total_deposit / MEV_PER_GEV);
        self.leak_charged.fill(o.leaked_momentum_charged);
        self.leak_neutrino.fill(o.leaked_momentum_neutrino);
        self.hits_per_event.fill(o.sensor_hit_count as f64);
        self.energy.fill(o.energy_equivalent);

        for &n in &c.sensor_counts {
            self.hits_per_sensor.fill(n as f64);
        }
        for &(x, y, w) in &c.map_points {
            self.hit_map.fill_weighted(x, y, w);
        }
        for &(t, w) in &c.time_points {
            self.time.fill_weighted(t, w);
        }
        for &(l, w) in &c.wavelength_points {
            self.wavelength.fill_weighted(l, w);
        }

        self.leak_tally.charged += o.charged_leaks;
        self.leak_tally.neutrino += o.neutrino_leaks;
        self.events += 1;
    }

    /// Merge another shard's accumulators into this one.
    ///
    /// Fails without modifying `self` if any binning differs.
    pub fn merge(&mut self, other: &AccumulatorSet) -> Result<()> {
        let mut merged = self.clone();
        for (a, b) in merged.histograms_mut().into_iter().zip(other.histograms()) {
            a.merge(b)?;
        }
        merged.hit_map.merge(&other.hit_map)?;
        merged.leak_tally.charged += other.leak_tally.charged;
        merged.leak_tally.neutrino += other.leak_tally.neutrino;
        merged.events += other.events;
        *self = merged;
        Ok(())
    }

    fn histograms(&self) -> [&Histogram1D; 8] {
        [
            &self.deposit,
            &self.leak_charged,
            &self.leak_neutrino,
            &self.hits_per_event,
            &self.energy,
            &self.time,
            &self.wavelength,
            &self.hits_per_sensor,
        ]
    }

    fn histograms_mut(&mut self) -> [&mut Histogram1D; 8] {
        [
            &mut self.deposit,
            &mut self.leak_charged,
            &mut self.leak_neutrino,
            &mut self.hits_per_event,
            &mut self.energy,
            &mut self.time,
            &mut self.wavelength,
            &mut self.hits_per_sensor,
        ]
    }

    /// Freeze every accumulator.
    pub fn finalize(self) -> FinalizedAccumulators {
        FinalizedAccumulators {
            deposit: self.deposit.finalize(),
            leak_charged: self.leak_charged.finalize(),
            leak_neutrino: self.leak_neutrino.finalize(),
            hits_per_event: self.hits_per_event.finalize(),
            energy: self.energy.finalize(),
            hit_map: self.hit_map.finalize(),
            time: self.time.finalize(),
            wavelength: self.wavelength.finalize(),
            hits_per_sensor: self.hits_per_sensor.finalize(),
            leak_tally: self.leak_tally,
            events: self.events,
        }
    }
}

/// Read-only accumulators produced at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedAccumulators {
    /// Deposited energy (GeV).
    pub deposit: FinalizedHistogram1D,
    /// Charged/other leak momentum per event (MeV).
    pub leak_charged: FinalizedHistogram1D,
    /// Neutrino leak momentum per event (MeV).
    pub leak_neutrino: FinalizedHistogram1D,
    /// Photo-electrons per event.
    pub hits_per_event: FinalizedHistogram1D,
    /// Reconstructed energy (GeV).
    pub energy: FinalizedHistogram1D,
    /// Photo-electron map over fiber × plate position.
    pub hit_map: FinalizedHistogram2D,
    /// Arrival time, photon weighted.
    pub time: FinalizedHistogram1D,
    /// Wavelength, photon weighted.
    pub wavelength: FinalizedHistogram1D,
    /// Photo-electrons per SiPM.
    pub hits_per_sensor: FinalizedHistogram1D,
    /// Leak entries per class.
    pub leak_tally: LeakTally,
    /// Events processed.
    pub events: u64,
}

impl FinalizedAccumulators {
    /// All 1D histograms in render order, keyed by output suffix.
    pub fn histograms_1d(&self) -> [(&'static str, &FinalizedHistogram1D); 8] {
        [
            (suffix::LEAK, &self.leak_charged),
            (suffix::LEAK_NU, &self.leak_neutrino),
            (suffix::HITS_PER_EVENT, &self.hits_per_event),
            (suffix::ENERGY, &self.energy),
            (suffix::TIME, &self.time),
            (suffix::WAVELENGTH, &self.wavelength),
            (suffix::HITS_PER_SENSOR, &self.hits_per_sensor),
            (suffix::DEPOSIT, &self.deposit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DerivedObservables;

    fn ranges() -> AnalysisRanges {
        AnalysisRanges::new(10.0, 20.0, 30.0).unwrap()
    }

    fn contributions(hits: u64, charged: u64, neutrino: u64) -> EventContributions {
        EventContributions {
            observables: DerivedObservables {
                total_deposit: 19_500.0,
                leaked_momentum_charged: 250.0,
                sensor_hit_count: hits,
                energy_equivalent: hits as f64 / 1130.5,
                charged_leaks: charged,
                neutrino_leaks: neutrino,
                ..Default::default()
            },
            sensor_counts: vec![hits],
            map_points: vec![(5.0, 7.5, hits as f64)],
            time_points: vec![(12.05, 2.0)],
            wavelength_points: vec![(450.0, 2.0)],
        }
    }

    #[test]
    fn rejects_bad_thresholds() {
        assert!(AnalysisRanges::new(30.0, 20.0, 10.0).is_err());
        assert!(AnalysisRanges::new(10.0, 0.0, 30.0).is_err());
        assert!(AnalysisRanges::new(f64::NAN, 20.0, 30.0).is_err());
    }

    #[test]
    fn binning_follows_thresholds() {
        let f = AccumulatorSet::new(&ranges()).unwrap().finalize();
        assert_eq!(f.energy.binning().n_bins(), 100);
        assert_eq!((f.energy.binning().x_min(), f.energy.binning().x_max()), (10.0, 30.0));
        assert_eq!(f.leak_charged.binning().x_max(), 30_000.0);
        assert_eq!(f.hits_per_event.binning().n_bins(), 200);
        assert_eq!(f.hits_per_event.binning().x_max(), 40_000.0);
        assert_eq!(f.time.binning().n_bins(), 600);
        assert_eq!(f.wavelength.binning().n_bins(), 120);
        assert_eq!(f.hit_map.x_binning().n_bins(), 160);
        assert_eq!(f.energy.labels().x, "GeV");
    }

    #[test]
    fn one_event_fills_each_accumulator() {
        let mut acc = AccumulatorSet::new(&ranges()).unwrap();
        acc.fill_event(&contributions(22_610, 1, 2));
        let f = acc.finalize();
        assert_eq!(f.events, 1);
        assert_eq!(f.energy.total_weight(), 1.0);
        assert_eq!(f.deposit.integral(), 1.0);
        assert_eq!(f.deposit.contents()[47], 1.0); // 19.5 GeV
        assert_eq!(f.hit_map.integral(), 22_610.0);
        assert_eq!(f.time.integral(), 2.0);
        assert_eq!(f.hits_per_sensor.overflow().sumw, 1.0);
        assert_eq!(f.leak_tally, LeakTally { charged: 1, neutrino: 2 });
        assert_eq!(f.leak_neutrino.underflow().sumw + f.leak_neutrino.integral(), 1.0);
    }

    #[test]
    fn merge_matches_single_pass() {
        let events: Vec<_> = (0..10).map(|i| contributions(20_000 + 100 * i, i % 2, 1)).collect();

        let mut single = AccumulatorSet::new(&ranges()).unwrap();
        events.iter().for_each(|e| single.fill_event(e));

        let mut a = AccumulatorSet::new(&ranges()).unwrap();
        let mut b = AccumulatorSet::new(&ranges()).unwrap();
        events[..4].iter().for_each(|e| a.fill_event(e));
        events[4..].iter().for_each(|e| b.fill_event(e));
        a.merge(&b).unwrap();

        assert_eq!(a.finalize(), single.finalize());
    }

    #[test]
    fn merge_rejects_different_thresholds_atomically() {
        let mut a = AccumulatorSet::new(&ranges()).unwrap();
        a.fill_event(&contributions(100, 0, 0));
        let b = AccumulatorSet::new(&AnalysisRanges::new(0.0, 20.0, 30.0).unwrap()).unwrap();
        let before = a.clone().finalize();
        assert!(a.merge(&b).is_err());
        assert_eq!(a.finalize(), before);
    }
}
