use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dynamics::glider::Aircraft;
use crate::dynamics::state::GliderState;
use crate::error::SimError;
use crate::physics::FlowZone;
use crate::pilot::Pilot;

/// Horizontal distance (m) beyond which the pilot flies its recovery policy.
pub const OUT_OF_RANGE_DISTANCE: f64 = 1200.0;

/// Absorbs representation error in `period / dt`, e.g. 0.01 / 0.001.
const SUBSTEP_TOLERANCE: f64 = 1e-9;

/// What a stepper does when the aircraft leaves its model domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCheck {
    /// Log the violation and keep flying.
    #[default]
    Warn,
    /// Stop with `SimError::OutOfModel`.
    Halt,
}

/// Trait for temporal integrators.
///
/// One call advances the simulation by one macro `period`: policy, log,
/// command application, `floor(period / dt)` micro-steps, validity check.
pub trait Stepper {
    fn step(
        &mut self,
        zone: &dyn FlowZone,
        aircraft: &mut dyn Aircraft,
        pilot: &mut dyn Pilot,
        period: f64,
    ) -> Result<(), SimError>;

    /// Simulated time (s).
    fn time(&self) -> f64;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Number of micro-steps of width `dt` in `period`. A trailing partial
/// interval is dropped.
pub fn substeps(period: f64, dt: f64) -> usize {
    if !(dt > 0.0) || !(period > 0.0) {
        return 0;
    }
    (period / dt + SUBSTEP_TOLERANCE).floor() as usize
}

// ---------------------------------------------------------------------------
// Protocol shared by every integrator
// ---------------------------------------------------------------------------

/// Clock, log destination and validity policy of a stepper.
#[derive(Debug, Clone)]
struct StepClock {
    time: f64,
    dt: f64,
    state_log: Option<PathBuf>,
    model_check: ModelCheck,
}

impl StepClock {
    fn new(dt: f64) -> Self {
        Self {
            time: 0.0,
            dt,
            state_log: None,
            model_check: ModelCheck::Warn,
        }
    }

    /// Steps 1-3: policy, log, command application.
    fn begin(&self, aircraft: &mut dyn Aircraft, pilot: &mut dyn Pilot) -> Result<(), SimError> {
        let out_of_range = aircraft.distance_to_center() > OUT_OF_RANGE_DISTANCE;
        {
            let (state, command) = aircraft.controls_mut();
            if out_of_range {
                debug!(t = self.time, pilot = pilot.name(), "out of range, recovering");
                pilot.out_of_range(state, command);
            } else {
                pilot.control(state, command);
            }
        }

        if let Some(path) = &self.state_log {
            aircraft.state().save(path, self.time)?;
        }

        aircraft.apply_command();
        Ok(())
    }

    /// Step 5: validity check.
    fn finish(&self, aircraft: &dyn Aircraft) -> Result<(), SimError> {
        if aircraft.is_in_model() {
            return Ok(());
        }
        match self.model_check {
            ModelCheck::Warn => {
                warn!(t = self.time, "aircraft outside its model domain");
                Ok(())
            }
            ModelCheck::Halt => Err(SimError::OutOfModel { time: self.time }),
        }
    }
}

// ---------------------------------------------------------------------------
// Explicit Euler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EulerIntegrator {
    clock: StepClock,
}

impl EulerIntegrator {
    pub fn new(dt: f64) -> Self {
        Self { clock: StepClock::new(dt) }
    }

    /// Append the state to `path` once per macro step.
    pub fn with_log(mut self, path: impl AsRef<Path>) -> Self {
        self.clock.state_log = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_model_check(mut self, check: ModelCheck) -> Self {
        self.clock.model_check = check;
        self
    }

    /// Micro-step width (s).
    pub fn dt(&self) -> f64 {
        self.clock.dt
    }
}

impl Stepper for EulerIntegrator {
    fn step(
        &mut self,
        zone: &dyn FlowZone,
        aircraft: &mut dyn Aircraft,
        pilot: &mut dyn Pilot,
        period: f64,
    ) -> Result<(), SimError> {
        self.clock.begin(aircraft, pilot)?;

        let dt = self.clock.dt;
        for _ in 0..substeps(period, dt) {
            aircraft.state_mut().clear_dynamic();
            aircraft.update_dynamic(zone, self.clock.time);
            aircraft.state_mut().apply_dynamic(dt);
            self.clock.time += dt;
        }

        self.clock.finish(aircraft)
    }

    fn time(&self) -> f64 {
        self.clock.time
    }

    fn name(&self) -> &str {
        "EulerIntegrator"
    }
}

// ---------------------------------------------------------------------------
// Classical 4th-order Runge-Kutta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Rk4Integrator {
    clock: StepClock,
}

impl Rk4Integrator {
    pub fn new(dt: f64) -> Self {
        Self { clock: StepClock::new(dt) }
    }

    /// Append the state to `path` once per macro step.
    pub fn with_log(mut self, path: impl AsRef<Path>) -> Self {
        self.clock.state_log = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_model_check(mut self, check: ModelCheck) -> Self {
        self.clock.model_check = check;
        self
    }

    /// Micro-step width (s).
    pub fn dt(&self) -> f64 {
        self.clock.dt
    }

    /// Derivatives at `base + h * k`, evaluated at time `t`.
    fn stage(
        aircraft: &dyn Aircraft,
        zone: &dyn FlowZone,
        base: &GliderState,
        k: &GliderState,
        h: f64,
        t: f64,
    ) -> GliderState {
        let mut s = base.duplicate();
        s.set_dynamic(k);
        s.apply_dynamic(h);
        s.clear_dynamic();
        aircraft.update_state_dynamic(zone, t, &mut s);
        s
    }

    fn rk4_update(&self, zone: &dyn FlowZone, aircraft: &mut dyn Aircraft, t: f64, dt: f64) {
        let base = aircraft.state().duplicate();

        let mut k1 = base.duplicate();
        k1.clear_dynamic();
        aircraft.update_state_dynamic(zone, t, &mut k1);
        let k2 = Self::stage(aircraft, zone, &base, &k1, dt * 0.5, t + dt * 0.5);
        let k3 = Self::stage(aircraft, zone, &base, &k2, dt * 0.5, t + dt * 0.5);
        let k4 = Self::stage(aircraft, zone, &base, &k3, dt, t + dt);

        let state = aircraft.state_mut();
        state.clear_dynamic();
        state.add_to_dynamic(&k1, 1.0 / 6.0);
        state.add_to_dynamic(&k2, 2.0 / 6.0);
        state.add_to_dynamic(&k3, 2.0 / 6.0);
        state.add_to_dynamic(&k4, 1.0 / 6.0);
        state.apply_dynamic(dt);
    }
}

impl Stepper for Rk4Integrator {
    fn step(
        &mut self,
        zone: &dyn FlowZone,
        aircraft: &mut dyn Aircraft,
        pilot: &mut dyn Pilot,
        period: f64,
    ) -> Result<(), SimError> {
        self.clock.begin(aircraft, pilot)?;

        let dt = self.clock.dt;
        for _ in 0..substeps(period, dt) {
            self.rk4_update(zone, aircraft, self.clock.time, dt);
            self.clock.time += dt;
        }

        self.clock.finish(aircraft)
    }

    fn time(&self) -> f64 {
        self.clock.time
    }

    fn name(&self) -> &str {
        "Rk4Integrator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
