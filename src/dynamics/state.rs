use std::fmt;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::io::state_log;

// ---------------------------------------------------------------------------
// Physical constants
// ---------------------------------------------------------------------------

pub const G: f64 = 9.81;

// ---------------------------------------------------------------------------
// Glider state: position, kinematics, attitude, and their time derivatives
// ---------------------------------------------------------------------------

/// Point-mass glider state seen from a control point of view.
///
/// The derivative fields only cover the six integrated quantities
/// (position, airspeed, elevation and azimuth). They are scratch values:
/// valid between `clear_dynamic` and the matching `apply_dynamic` of one
/// micro-step. Angle of attack, sideslip and bank angle are driven by the
/// pilot's command, not integrated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GliderState {
    pub pos: Vector3<f64>,   // m, earth frame, z up
    pub v: f64,              // m/s, airspeed
    pub gamma: f64,          // rad, flight-path elevation
    pub khi: f64,            // rad, azimuth
    pub alpha: f64,          // rad, angle of attack
    pub beta: f64,           // rad, sideslip
    pub sigma: f64,          // rad, bank angle

    pub dpos: Vector3<f64>,  // m/s
    pub vdot: f64,           // m/s^2
    pub gammadot: f64,       // rad/s
    pub khidot: f64,         // rad/s
}

impl GliderState {
    /// State at rest in the derivative sense: all time derivatives zero.
    pub fn new(
        pos: Vector3<f64>,
        v: f64,
        gamma: f64,
        khi: f64,
        alpha: f64,
        beta: f64,
        sigma: f64,
    ) -> Self {
        Self {
            pos,
            v,
            gamma,
            khi,
            alpha,
            beta,
            sigma,
            ..Self::default()
        }
    }

    /// Independent copy owned by the caller.
    pub fn duplicate(&self) -> GliderState {
        self.clone()
    }

    pub fn clear_dynamic(&mut self) {
        self.dpos = Vector3::zeros();
        self.vdot = 0.0;
        self.gammadot = 0.0;
        self.khidot = 0.0;
    }

    /// Copy the derivative fields of `other` into this state.
    pub fn set_dynamic(&mut self, other: &GliderState) {
        self.dpos = other.dpos;
        self.vdot = other.vdot;
        self.gammadot = other.gammadot;
        self.khidot = other.khidot;
    }

    /// Accumulate `coef` times the derivatives of `other`.
    pub fn add_to_dynamic(&mut self, other: &GliderState, coef: f64) {
        self.dpos += other.dpos * coef;
        self.vdot += coef * other.vdot;
        self.gammadot += coef * other.gammadot;
        self.khidot += coef * other.khidot;
    }

    /// First-order transition using the stored derivatives.
    pub fn apply_dynamic(&mut self, dt: f64) {
        self.pos += self.dpos * dt;
        self.v += dt * self.vdot;
        self.gamma += dt * self.gammadot;
        self.khi += dt * self.khidot;
    }

    /// Append `(x y z V gamma khi alpha beta sigma time)` to the log at `path`.
    /// The file is truncated when `time` is zero.
    pub fn save(&self, path: &Path, time: f64) -> Result<(), SimError> {
        state_log::save(path, self, time)
    }

    /// Horizontal distance to the origin of the earth frame.
    pub fn horizontal_distance(&self) -> f64 {
        (self.pos.x * self.pos.x + self.pos.y * self.pos.y).sqrt()
    }

    /// Specific total energy rate (m/s) in still air.
    pub fn energy_rate(&self) -> f64 {
        self.dpos.z + self.v * self.vdot / G
    }
}

impl fmt::Display for GliderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "xyz=[{:.3} {:.3} {:.3}] V={:.3} gamma={:.4} khi={:.4} cmd=[{:.4} {:.4} {:.4}]",
            self.pos.x,
            self.pos.y,
            self.pos.z,
            self.v,
            self.gamma,
            self.khi,
            self.alpha,
            self.beta,
            self.sigma,
        )
    }
}

// ---------------------------------------------------------------------------
// Pilot command: angle rates folded into the attitude each macro step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    pub dalpha: f64,   // rad per macro step
    pub dbeta: f64,    // rad per macro step
    pub dsigma: f64,   // rad per macro step
}

impl Command {
    pub fn new(dalpha: f64, dbeta: f64, dsigma: f64) -> Self {
        Self { dalpha, dbeta, dsigma }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
