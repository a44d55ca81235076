use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::{Command, GliderState, G};
use crate::physics::FlowZone;

// ---------------------------------------------------------------------------
// Aircraft interface used by steppers and the simulation
// ---------------------------------------------------------------------------

/// An aircraft owns its state and the command currently applied to it.
pub trait Aircraft {
    /// Fill the derivative fields of `state` (which need not be the
    /// aircraft's own state) from the flow field at time `t`.
    fn update_state_dynamic(&self, zone: &dyn FlowZone, t: f64, state: &mut GliderState);

    /// Same as `update_state_dynamic`, applied to the aircraft's own state.
    fn update_dynamic(&mut self, zone: &dyn FlowZone, t: f64);

    /// Fold the command rates into the attitude angles of the state.
    fn apply_command(&mut self);

    /// Check the state against the validity domain of the model.
    /// Violations are logged; the caller decides what to do with them.
    fn is_in_model(&self) -> bool;

    fn distance_to_center(&self) -> f64;

    fn state(&self) -> &GliderState;
    fn state_mut(&mut self) -> &mut GliderState;
    fn command(&self) -> &Command;

    /// State and command borrowed together, for the pilot.
    fn controls_mut(&mut self) -> (&mut GliderState, &mut Command);
}

// ---------------------------------------------------------------------------
// Beeler point-mass glider
// ---------------------------------------------------------------------------

const RHO: f64 = 1.225;        // kg/m^3, sea-level air density
const CD0: f64 = 0.015;        // parasitic drag coefficient
const OSWALD: f64 = 0.95;      // span efficiency
const CC_BETA: f64 = 0.5;      // side-force slope, 1/rad
const WIND_DT: f64 = 1e-3;     // s, finite-difference step for wind rate

const V_MIN: f64 = 1.0;        // m/s
const V_MAX: f64 = 100.0;      // m/s
const ALPHA_MAX: f64 = 0.35;   // rad
const BETA_MAX: f64 = 0.35;    // rad

/// Mass and geometry of the glider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GliderParams {
    pub m: f64,    // kg
    pub ws: f64,   // m^2, wing surface
    pub ar: f64,   // aspect ratio
}

impl Default for GliderParams {
    fn default() -> Self {
        Self { m: 1.35, ws: 2.0, ar: 16.0 }
    }
}

impl GliderParams {
    /// Lift slope from the Helmbold finite-wing approximation (1/rad).
    pub fn cl_alpha(&self) -> f64 {
        2.0 * PI * self.ar / (2.0 + (self.ar * self.ar + 4.0).sqrt())
    }

    /// Lift, drag and side-force coefficients.
    pub fn coefficients(&self, alpha: f64, beta: f64) -> (f64, f64, f64) {
        let cl = self.cl_alpha() * alpha;
        let k = 1.0 / (PI * OSWALD * self.ar);
        let cd = CD0 + k * cl * cl;
        let cc = -CC_BETA * beta;
        (cl, cd, cc)
    }

    /// Equations of motion of a point-mass glider in a non-uniform wind.
    ///
    /// The wind rate seen by the glider is the change of wind along its
    /// ground track, estimated with a forward difference of `WIND_DT`.
    pub fn fill_derivatives(&self, zone: &dyn FlowZone, t: f64, s: &mut GliderState) {
        let (sg, cg) = s.gamma.sin_cos();
        let (sk, ck) = s.khi.sin_cos();
        let (ss, cs) = s.sigma.sin_cos();
        let v = s.v;
        // divisor only; `is_in_model` flags V < V_MIN
        let v_div = v.max(1e-6);

        // --- Forces ---
        let (cl, cd, cc) = self.coefficients(s.alpha, s.beta);
        let q = 0.5 * RHO * v * v * self.ws;
        let lift = q * cl;
        let drag = q * cd;
        let side = q * cc;

        // --- Wind and its rate along the trajectory ---
        let wind = zone.wind(&s.pos, t);
        let air_vel = Vector3::new(v * cg * ck, v * cg * sk, v * sg);
        let ground_vel = air_vel + wind;
        let wind_ahead = zone.wind(&(s.pos + ground_vel * WIND_DT), t + WIND_DT);
        let wdot = (wind_ahead - wind) / WIND_DT;

        s.dpos = ground_vel;

        s.vdot = -drag / self.m - G * sg - (wdot.x * cg * ck + wdot.y * cg * sk + wdot.z * sg);

        s.gammadot = (lift * cs + side * ss) / (self.m * v_div) - G * cg / v_div
            + (wdot.x * sg * ck + wdot.y * sg * sk - wdot.z * cg) / v_div;

        s.khidot = if cg.abs() > 1e-6 {
            (lift * ss - side * cs) / (self.m * v_div * cg) + (wdot.x * sk - wdot.y * ck) / (v_div * cg)
        } else {
            0.0
        };
    }

    /// Angle of attack holding level flight at airspeed `v` (rad).
    pub fn trim_alpha(&self, v: f64) -> f64 {
        let q = 0.5 * RHO * v * v * self.ws;
        self.m * G / (q * self.cl_alpha())
    }
}

#[derive(Debug, Clone)]
pub struct BeelerGlider {
    pub params: GliderParams,
    state: GliderState,
    command: Command,
}

impl BeelerGlider {
    pub fn new(state: GliderState, command: Command, params: GliderParams) -> Self {
        Self { params, state, command }
    }
}

impl Aircraft for BeelerGlider {
    fn update_state_dynamic(&self, zone: &dyn FlowZone, t: f64, state: &mut GliderState) {
        self.params.fill_derivatives(zone, t, state);
    }

    fn update_dynamic(&mut self, zone: &dyn FlowZone, t: f64) {
        self.params.fill_derivatives(zone, t, &mut self.state);
    }

    fn apply_command(&mut self) {
        self.state.alpha += self.command.dalpha;
        self.state.beta += self.command.dbeta;
        self.state.sigma += self.command.dsigma;
    }

    fn is_in_model(&self) -> bool {
        let s = &self.state;
        let mut ok = true;

        let finite = s.pos.iter().all(|c| c.is_finite())
            && [s.v, s.gamma, s.khi, s.alpha, s.beta, s.sigma]
                .iter()
                .all(|c| c.is_finite());
        if !finite {
            warn!(state = %s, "non-finite state");
            return false;
        }
        if s.pos.z <= 0.0 {
            warn!(z = s.pos.z, "glider reached the ground");
            ok = false;
        }
        if !(V_MIN..=V_MAX).contains(&s.v) {
            warn!(v = s.v, "airspeed outside [{}, {}] m/s", V_MIN, V_MAX);
            ok = false;
        }
        if s.alpha.abs() > ALPHA_MAX {
            warn!(alpha = s.alpha, "angle of attack beyond {} rad", ALPHA_MAX);
            ok = false;
        }
        if s.beta.abs() > BETA_MAX {
            warn!(beta = s.beta, "sideslip beyond {} rad", BETA_MAX);
            ok = false;
        }
        if s.sigma.abs() > FRAC_PI_2 {
            warn!(sigma = s.sigma, "bank angle beyond pi/2");
            ok = false;
        }
        if s.gamma.abs() >= FRAC_PI_2 {
            warn!(gamma = s.gamma, "vertical flight path");
            ok = false;
        }
        ok
    }

    fn distance_to_center(&self) -> f64 {
        self.state.horizontal_distance()
    }

    fn state(&self) -> &GliderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GliderState {
        &mut self.state
    }

    fn command(&self) -> &Command {
        &self.command
    }

    fn controls_mut(&mut self) -> (&mut GliderState, &mut Command) {
        (&mut self.state, &mut self.command)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{FlatZone, Thermal, ThermalZone};
    use approx::assert_relative_eq;

    fn level_state(params: &GliderParams) -> GliderState {
        GliderState::new(Vector3::new(-500.0, 0.0, 1000.0), 20.0, 0.0, 0.0, params.trim_alpha(20.0), 0.0, 0.0)
    }

    #[test]
    fn trimmed_level_flight_holds_path() {
        let p = GliderParams::default();
        let mut s = level_state(&p);
        p.fill_derivatives(&FlatZone::calm(), 0.0, &mut s);

        assert_relative_eq!(s.gammadot, 0.0, epsilon = 1e-9);
        assert_relative_eq!(s.khidot, 0.0, epsilon = 1e-12);
        assert_relative_eq!(s.dpos.x, 20.0, epsilon = 1e-12);
        assert_relative_eq!(s.dpos.z, 0.0, epsilon = 1e-12);
        assert!(s.vdot < 0.0, "drag must slow the glider, got {}", s.vdot);
    }

    #[test]
    fn reversed_airspeed_is_not_clamped() {
        let p = GliderParams::default();
        let mut s = level_state(&p);
        s.v = -2.0;
        p.fill_derivatives(&FlatZone::calm(), 0.0, &mut s);

        assert_relative_eq!(s.dpos.x, -2.0, epsilon = 1e-12);
        assert!(s.gammadot.is_finite() && s.khidot.is_finite());

        let glider = BeelerGlider::new(s, Command::default(), p);
        assert!(!glider.is_in_model());
    }

    #[test]
    fn headwind_reduces_ground_speed() {
        let p = GliderParams::default();
        let mut s = level_state(&p);
        p.fill_derivatives(&FlatZone::new(-5.0, 0.0), 0.0, &mut s);
        assert_relative_eq!(s.dpos.x, 15.0, epsilon = 1e-12);
    }

    #[test]
    fn updraft_lifts_glider() {
        let p = GliderParams::default();
        let zone = ThermalZone::new(vec![Thermal { x: -500.0, y: 0.0, radius: 100.0, w_max: 3.0 }]).unwrap();
        let mut s = level_state(&p);
        p.fill_derivatives(&zone, 0.0, &mut s);
        assert!(s.dpos.z > 2.9, "climb rate {} should follow the updraft", s.dpos.z);
    }

    #[test]
    fn bank_turns_glider() {
        let p = GliderParams::default();
        let mut s = level_state(&p);
        s.sigma = 0.3;
        p.fill_derivatives(&FlatZone::calm(), 0.0, &mut s);
        assert!(s.khidot > 0.0, "positive bank turns right, got {}", s.khidot);
        assert!(s.gammadot < 0.0, "banked lift no longer balances weight");
    }

    #[test]
    fn apply_command_folds_rates() {
        let p = GliderParams::default();
        let mut g = BeelerGlider::new(level_state(&p), Command::default(), p);
        let alpha0 = g.state().alpha;
        {
            let (_, cmd) = g.controls_mut();
            *cmd = Command::new(0.01, 0.0, -0.01);
        }
        g.apply_command();
        g.apply_command();
        assert_relative_eq!(g.state().alpha, alpha0 + 0.02, epsilon = 1e-12);
        assert_relative_eq!(g.state().sigma, -0.02, epsilon = 1e-12);
        assert_eq!(g.state().beta, 0.0);
    }

    #[test]
    fn model_bounds() {
        let p = GliderParams::default();
        let mut g = BeelerGlider::new(level_state(&p), Command::default(), p);
        assert!(g.is_in_model());

        g.state_mut().sigma = 2.0;
        assert!(!g.is_in_model());

        g.state_mut().sigma = 0.0;
        g.state_mut().pos.z = -1.0;
        assert!(!g.is_in_model());

        g.state_mut().pos.z = 10.0;
        g.state_mut().v = f64::NAN;
        assert!(!g.is_in_model());
    }

    #[test]
    fn own_state_update_matches_external() {
        let p = GliderParams::default();
        let zone = FlatZone::new(2.0, 1.0);
        let mut g = BeelerGlider::new(level_state(&p), Command::default(), p);
        let mut copy = g.state().duplicate();
        g.update_state_dynamic(&zone, 0.5, &mut copy);
        g.update_dynamic(&zone, 0.5);
        assert_eq!(&copy, g.state());
    }

    #[test]
    fn distance_is_horizontal() {
        let p = GliderParams::default();
        let mut s = level_state(&p);
        s.pos = Vector3::new(300.0, 400.0, 1000.0);
        let g = BeelerGlider::new(s, Command::default(), p);
        assert_relative_eq!(g.distance_to_center(), 500.0);
    }
}
