//! Run configuration.
//!
//! Every field has a default, so an empty document (or no document at all)
//! gives the standard analysis. Partial YAML overrides only what it names:
//!
//! ```yaml
//! calibration:
//!   scintillation: 1100.0
//! progress_every: 500
//! ```

use dr_core::{Error, Result};
use dr_inference::MinimizerConfig;
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Photon-count to energy conversion.
    pub calibration: Calibration,
    /// Sensor placement and timing constants.
    pub geometry: Geometry,
    /// Log progress every this many events (0 disables).
    pub progress_every: usize,
    /// Resolution fit settings.
    pub fit: FitSettings,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            geometry: Geometry::default(),
            progress_every: 100,
            fit: FitSettings::default(),
        }
    }
}

impl RunConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| Error::Validation(format!("invalid run config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when `user_yaml` is `None`, otherwise the parsed document.
    pub fn resolve(user_yaml: Option<&str>) -> Result<Self> {
        match user_yaml {
            None => Ok(Self::default()),
            Some(yaml) => Self::from_yaml_str(yaml),
        }
    }

    /// Reject settings the analysis cannot run with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.calibration;
        if !(c.cherenkov.is_finite() && c.cherenkov > 0.0) {
            return Err(Error::Validation(format!(
                "calibration.cherenkov must be positive, got {}",
                c.cherenkov
            )));
        }
        if !(c.scintillation.is_finite() && c.scintillation > 0.0) {
            return Err(Error::Validation(format!(
                "calibration.scintillation must be positive, got {}",
                c.scintillation
            )));
        }
        if !self.geometry.sensor_pitch.is_finite() || !self.geometry.time_offset.is_finite() {
            return Err(Error::Validation("geometry constants must be finite".into()));
        }
        if self.fit.max_iter == 0 {
            return Err(Error::Validation("fit.max_iter must be at least 1".into()));
        }
        Ok(())
    }
}

/// Scale factors converting photon counts to energy-equivalent units (p.e./GeV).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Cherenkov channel.
    pub cherenkov: f64,
    /// Scintillation channel.
    pub scintillation: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self { cherenkov: 1471.0 / 20.0, scintillation: 22610.0 / 20.0 }
    }
}

/// Geometry constants applied during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Distance between neighbouring fibers/plates (mm).
    pub sensor_pitch: f64,
    /// Added to every time-spectrum value (ns).
    pub time_offset: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self { sensor_pitch: 2.5, time_offset: 0.05 }
    }
}

/// Minimizer budget for the resolution fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    /// Iteration budget.
    pub max_iter: u64,
    /// Convergence tolerance.
    pub tol: f64,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self { max_iter: 1000, tol: 1e-6 }
    }
}

impl From<FitSettings> for MinimizerConfig {
    fn from(s: FitSettings) -> Self {
        MinimizerConfig { max_iter: s.max_iter, tol: s.tol, ..MinimizerConfig::default() }
    }
}
