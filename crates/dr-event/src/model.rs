//! Event record data model.
//!
//! Field names follow Rust conventions; the simulation's original branch
//! names (`Edeps`, `ModuleNum`, `SiPMs`, `timeStruct`, ...) are accepted as
//! aliases. Missing or `null` collections decode as empty.
//!
//! [`EventRecord::from_value_lenient`] salvages records that do not match
//! the schema: items that fail to decode are dropped and the rest is kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

fn nullable<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// One simulated event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Energy deposits (MeV).
    #[serde(default, alias = "Edeps", deserialize_with = "nullable")]
    pub energy_deposits: Vec<EnergyDeposit>,
    /// Particles escaping the calorimeter.
    #[serde(default, deserialize_with = "nullable")]
    pub leaks: Vec<LeakParticle>,
    /// Towers with SiPM readout.
    #[serde(default, deserialize_with = "nullable")]
    pub towers: Vec<Tower>,
}

impl EventRecord {
    /// Decode a record, dropping whatever does not fit the schema.
    ///
    /// A collection that is not an array becomes empty; an element that
    /// fails to decode is skipped. Towers are salvaged SiPM by SiPM. A value
    /// that is not an object yields an empty record. Returns the record and
    /// the number of dropped items (0 when `value` decodes as is).
    pub fn from_value_lenient(value: &Value) -> (Self, usize) {
        if let Ok(record) = Self::deserialize(value) {
            return (record, 0);
        }
        let Value::Object(map) = value else {
            return (Self::default(), 1);
        };
        let mut dropped = 0;
        let energy_deposits =
            lenient_vec(field(map, &["energy_deposits", "Edeps"]), &mut dropped);
        let leaks = lenient_vec(field(map, &["leaks"]), &mut dropped);
        let towers = lenient_items(field(map, &["towers"]), &mut dropped)
            .iter()
            .filter_map(|v| Tower::from_value_lenient(v, &mut dropped))
            .collect();
        (Self { energy_deposits, leaks, towers }, dropped)
    }
}

impl Tower {
    fn from_value_lenient(value: &Value, dropped: &mut usize) -> Option<Self> {
        if let Ok(tower) = Self::deserialize(value) {
            return Some(tower);
        }
        let Value::Object(map) = value else {
            *dropped += 1;
            return None;
        };
        let module_id = match field(map, &["module_id", "ModuleNum"]) {
            None | Some(Value::Null) => 0,
            Some(v) => i32::deserialize(v).unwrap_or_else(|_| {
                *dropped += 1;
                0
            }),
        };
        let sipms = lenient_vec(field(map, &["sipms", "SiPMs"]), dropped);
        Some(Self { module_id, sipms })
    }
}

fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

/// Array elements of `value`; anything but an array, `null` or absence
/// counts as one dropped item.
fn lenient_items<'a>(value: Option<&'a Value>, dropped: &mut usize) -> &'a [Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            *dropped += 1;
            &[]
        }
    }
}

fn lenient_vec<T: DeserializeOwned>(value: Option<&Value>, dropped: &mut usize) -> Vec<T> {
    lenient_items(value, dropped)
        .iter()
        .filter_map(|v| match T::deserialize(v) {
            Ok(item) => Some(item),
            Err(_) => {
                *dropped += 1;
                None
            }
        })
        .collect()
}

/// A single energy deposit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyDeposit {
    /// Deposited energy (MeV).
    #[serde(alias = "Edep")]
    pub energy: f64,
}

/// Four-momentum of a particle leaking out of the detector (MeV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeakParticle {
    /// PDG particle identifier (sign encodes particle/antiparticle).
    #[serde(alias = "pdgId")]
    pub pdg_id: i32,
    /// x momentum.
    pub px: f64,
    /// y momentum.
    pub py: f64,
    /// z momentum.
    pub pz: f64,
    /// Energy.
    #[serde(alias = "E")]
    pub e: f64,
}

impl LeakParticle {
    /// Magnitude of the spatial momentum, `sqrt(px² + py² + pz²)`.
    #[inline]
    pub fn momentum(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }
}

/// A calorimeter tower (module).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Module number.
    #[serde(default, alias = "ModuleNum")]
    pub module_id: i32,
    /// SiPMs read out in this tower.
    #[serde(default, alias = "SiPMs", deserialize_with = "nullable")]
    pub sipms: Vec<Sipm>,
}

/// One SiPM channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sipm {
    /// Fiber index.
    #[serde(default)]
    pub x: i32,
    /// Plate index.
    #[serde(default)]
    pub y: i32,
    /// Number of photoelectrons.
    #[serde(default)]
    pub count: u64,
    /// Pre-binned arrival-time spectrum (ns).
    #[serde(default, alias = "timeStruct", deserialize_with = "nullable")]
    pub time_spectrum: Vec<SpectrumBin>,
    /// Pre-binned wavelength spectrum (nm).
    #[serde(default, alias = "wavlenSpectrum", deserialize_with = "nullable")]
    pub wavelength_spectrum: Vec<SpectrumBin>,
}

/// `(value, weight)` pair of a pre-binned spectrum. Decodes from either
/// `{"value": v, "weight": w}` or `[v, w]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    /// Bin value (time or wavelength).
    pub value: f64,
    /// Photon weight.
    pub weight: f64,
}

impl SpectrumBin {
    /// Construct a spectrum entry.
    pub const fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}
