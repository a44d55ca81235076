use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::flow_zone::FlowZone;
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Flat thermal-soaring zone: horizontal ground, Gaussian updraft columns
// ---------------------------------------------------------------------------

/// A single updraft column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thermal {
    pub x: f64,        // m, centre
    pub y: f64,        // m, centre
    pub radius: f64,   // m, core radius
    pub w_max: f64,    // m/s, peak updraft at the centre
}

impl Thermal {
    /// Vertical wind (m/s) at horizontal distance `d` from the centre.
    pub fn updraft(&self, d: f64) -> f64 {
        self.w_max * (-(d / self.radius).powi(2)).exp()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalZone {
    #[serde(default)]
    pub wind_x: f64,   // m/s, background wind
    #[serde(default)]
    pub wind_y: f64,   // m/s, background wind
    pub thermals: Vec<Thermal>,
}

impl ThermalZone {
    pub fn new(thermals: Vec<Thermal>) -> Result<Self, SimError> {
        let zone = Self { wind_x: 0.0, wind_y: 0.0, thermals };
        zone.validate()?;
        Ok(zone)
    }

    /// Load a zone description from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let zone: ThermalZone = serde_yaml::from_str(&text)?;
        zone.validate()?;
        info!(path = %path.display(), thermals = zone.thermals.len(), "loaded thermal zone");
        Ok(zone)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        for (i, th) in self.thermals.iter().enumerate() {
            if !(th.radius > 0.0) {
                return Err(SimError::invalid(format!("thermals[{}].radius", i), th.radius));
            }
            if !th.w_max.is_finite() {
                return Err(SimError::invalid(format!("thermals[{}].w_max", i), th.w_max));
            }
        }
        Ok(())
    }
}

impl FlowZone for ThermalZone {
    fn wind(&self, pos: &Vector3<f64>, _t: f64) -> Vector3<f64> {
        let wz = self
            .thermals
            .iter()
            .map(|th| {
                let d = ((pos.x - th.x).powi(2) + (pos.y - th.y).powi(2)).sqrt();
                th.updraft(d)
            })
            .sum();
        Vector3::new(self.wind_x, self.wind_y, wz)
    }

    fn name(&self) -> &str {
        "ThermalZone"
    }
}
