//! Per-event observable extraction.

use dr_event::{EventRecord, LeakParticle};
use serde::{Deserialize, Serialize};

use crate::config::{Calibration, Geometry};

/// `|pdg_id|` values treated as neutrinos (νe, νμ, ντ).
pub const NEUTRINO_PDG_IDS: [u32; 3] = [12, 14, 16];

/// Category of a leaking particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeakClass {
    /// Anything that is not a neutrino.
    ChargedOrOther,
    /// Electron, muon or tau (anti)neutrino.
    Neutrino,
}

impl LeakClass {
    /// Classify by PDG identifier; antiparticles share their particle's class.
    pub fn of(pdg_id: i32) -> Self {
        if NEUTRINO_PDG_IDS.contains(&pdg_id.unsigned_abs()) {
            LeakClass::Neutrino
        } else {
            LeakClass::ChargedOrOther
        }
    }

    /// Classify a leak record.
    pub fn of_particle(leak: &LeakParticle) -> Self {
        Self::of(leak.pdg_id)
    }
}

/// Scalar observables derived from one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedObservables {
    /// Sum of deposit energies (MeV).
    pub total_deposit: f64,
    /// Summed momentum magnitude of non-neutrino leaks (MeV).
    pub leaked_momentum_charged: f64,
    /// Summed momentum magnitude of neutrino leaks (MeV).
    pub leaked_momentum_neutrino: f64,
    /// Number of non-neutrino leak entries.
    pub charged_leaks: u64,
    /// Number of neutrino leak entries.
    pub neutrino_leaks: u64,
    /// Total scintillation photo-electrons over all sensors.
    pub sensor_hit_count: u64,
    /// `sensor_hit_count / calibration.scintillation` (GeV).
    pub energy_equivalent: f64,
}

/// Everything one event contributes to the accumulators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContributions {
    /// Per-event scalars.
    pub observables: DerivedObservables,
    /// Photo-electron count of every sensor, in traversal order.
    pub sensor_counts: Vec<u64>,
    /// `(x, y, weight)` fills of the spatial map.
    pub map_points: Vec<(f64, f64, f64)>,
    /// `(time, weight)` fills, offset already applied.
    pub time_points: Vec<(f64, f64)>,
    /// `(wavelength, weight)` fills.
    pub wavelength_points: Vec<(f64, f64)>,
}

/// Turns event records into [`EventContributions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObservableExtractor {
    calibration: Calibration,
    geometry: Geometry,
}

impl ObservableExtractor {
    /// Create an extractor with fixed calibration and geometry.
    pub fn new(calibration: Calibration, geometry: Geometry) -> Self {
        Self { calibration, geometry }
    }

    /// Calibration in use.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Scintillation photo-electrons converted to GeV.
    #[inline]
    pub fn scintillation_equivalent(&self, count: u64) -> f64 {
        count as f64 / self.calibration.scintillation
    }

    /// Cherenkov photo-electrons converted to GeV.
    #[inline]
    pub fn cherenkov_equivalent(&self, count: u64) -> f64 {
        count as f64 / self.calibration.cherenkov
    }

    /// Derive all per-event quantities. Empty collections are valid and give zeros.
    pub fn extract(&self, event: &EventRecord) -> EventContributions {
        let mut obs = DerivedObservables {
            total_deposit: event.energy_deposits.iter().map(|d| d.energy).sum(),
            ..Default::default()
        };

        for leak in &event.leaks {
            let p = leak.momentum();
            match LeakClass::of_particle(leak) {
                LeakClass::Neutrino => {
                    obs.leaked_momentum_neutrino += p;
                    obs.neutrino_leaks += 1;
                }
                LeakClass::ChargedOrOther => {
                    obs.leaked_momentum_charged += p;
                    obs.charged_leaks += 1;
                }
            }
        }

        let n_sensors: usize = event.towers.iter().map(|t| t.sipms.len()).sum();
        let mut out = EventContributions {
            sensor_counts: Vec::with_capacity(n_sensors),
            map_points: Vec::with_capacity(n_sensors),
            ..Default::default()
        };

        let pitch = self.geometry.sensor_pitch;
        let offset = self.geometry.time_offset;
        for sipm in event.towers.iter().flat_map(|t| &t.sipms) {
            obs.sensor_hit_count += sipm.count;
            out.sensor_counts.push(sipm.count);
            out.map_points.push((pitch * sipm.x as f64, pitch * sipm.y as f64, sipm.count as f64));
            out.time_points.extend(sipm.time_spectrum.iter().map(|b| (b.value + offset, b.weight)));
            out.wavelength_points.extend(sipm.wavelength_spectrum.iter().map(|b| (b.value, b.weight)));
        }

        obs.energy_equivalent = self.scintillation_equivalent(obs.sensor_hit_count);
        out.observables = obs;
        out
    }
}
