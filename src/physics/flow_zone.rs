use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Trait for flow fields the glider flies through.
///
/// Implement this to plug a wind or updraft model into the simulation.
pub trait FlowZone {
    /// Wind velocity (m/s, earth frame, z up) at `pos` and time `t`.
    fn wind(&self, pos: &Vector3<f64>, t: f64) -> Vector3<f64>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Flat zone: uniform horizontal wind, no updraft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatZone {
    pub wind_x: f64,   // m/s
    pub wind_y: f64,   // m/s
}

impl FlatZone {
    pub fn new(wind_x: f64, wind_y: f64) -> Self {
        Self { wind_x, wind_y }
    }

    pub fn calm() -> Self {
        Self::default()
    }
}

impl FlowZone for FlatZone {
    fn wind(&self, _pos: &Vector3<f64>, _t: f64) -> Vector3<f64> {
        Vector3::new(self.wind_x, self.wind_y, 0.0)
    }

    fn name(&self) -> &str {
        "FlatZone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_zone_is_uniform() {
        let zone = FlatZone::new(3.0, -1.0);
        let a = zone.wind(&Vector3::new(0.0, 0.0, 100.0), 0.0);
        let b = zone.wind(&Vector3::new(-800.0, 250.0, 1500.0), 42.0);
        assert_eq!(a, b);
        assert_eq!(a, Vector3::new(3.0, -1.0, 0.0));
    }

    #[test]
    fn calm_zone_has_no_wind() {
        let w = FlatZone::calm().wind(&Vector3::zeros(), 0.0);
        assert!(w.norm() < 1e-12);
    }
}
