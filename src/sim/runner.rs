use tracing::info;

use super::integrator::{substeps, Stepper};
use crate::dynamics::glider::Aircraft;
use crate::error::SimError;
use crate::physics::FlowZone;
use crate::pilot::Pilot;

// ---------------------------------------------------------------------------
// Simulation: flow zone, aircraft, stepper and pilot wired together
// ---------------------------------------------------------------------------

/// A simulation borrows its collaborators for its whole lifetime.
pub struct Simulation<'a> {
    pub zone: &'a dyn FlowZone,
    pub aircraft: &'a mut dyn Aircraft,
    pub stepper: &'a mut dyn Stepper,
    pub pilot: &'a mut dyn Pilot,
}

impl<'a> Simulation<'a> {
    pub fn new(
        zone: &'a dyn FlowZone,
        aircraft: &'a mut dyn Aircraft,
        stepper: &'a mut dyn Stepper,
        pilot: &'a mut dyn Pilot,
    ) -> Self {
        Self { zone, aircraft, stepper, pilot }
    }

    /// Advance by one macro period.
    pub fn step(&mut self, period: f64) -> Result<(), SimError> {
        self.stepper
            .step(self.zone, &mut *self.aircraft, &mut *self.pilot, period)
    }

    /// Take `floor(limit_time / time_step)` macro steps, calling `on_tick(t)`
    /// after each with `t = k * time_step`. Returns the number of steps.
    pub fn run<F>(&mut self, limit_time: f64, time_step: f64, mut on_tick: F) -> Result<usize, SimError>
    where
        F: FnMut(f64),
    {
        if !(time_step > 0.0) {
            return Err(SimError::invalid("time_step", time_step));
        }

        let steps = substeps(limit_time, time_step);
        info!(
            zone = self.zone.name(),
            stepper = self.stepper.name(),
            pilot = self.pilot.name(),
            limit_time,
            time_step,
            steps,
            "starting simulation"
        );

        for k in 0..steps {
            self.step(time_step)?;
            on_tick(k as f64 * time_step);
        }

        info!(steps, sim_time = self.stepper.time(), "simulation finished");
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::glider::{BeelerGlider, GliderParams};
    use crate::dynamics::state::{Command, GliderState};
    use crate::physics::{FlatZone, Thermal, ThermalZone};
    use crate::pilot::{PassivePilot, QLearningParams, QLearningPilot};
    use crate::sim::integrator::{EulerIntegrator, Rk4Integrator};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn glider() -> BeelerGlider {
        let params = GliderParams::default();
        let state = GliderState::new(Vector3::new(-500.0, 0.0, 1000.0), 20.0, 0.0, 0.0, params.trim_alpha(20.0), 0.0, 0.0);
        BeelerGlider::new(state, Command::default(), params)
    }

    #[test]
    fn passive_glider_descends_in_calm_air() {
        let zone = FlatZone::calm();
        let mut ac = glider();
        let mut stepper = EulerIntegrator::new(0.031_25);
        let mut pilot = PassivePilot::new(0.01);

        let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
        let steps = sim.run(5.0, 0.125, |_| {}).unwrap();
        assert_eq!(steps, 40);

        assert!(ac.state().pos.z < 1000.0, "glider should sink, z = {}", ac.state().pos.z);
        assert!(ac.state().pos.x > -500.0, "glider should move forward");
        assert_relative_eq!(stepper.time(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn run_reports_each_tick() {
        let zone = FlatZone::calm();
        let mut ac = glider();
        let mut stepper = Rk4Integrator::new(0.01);
        let mut pilot = PassivePilot::new(0.01);
        let mut ticks = Vec::new();

        let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
        sim.run(1.25, 0.25, |t| ticks.push(t)).unwrap();
        assert_eq!(ticks, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn macro_step_count_is_precomputed() {
        let zone = FlatZone::calm();
        let mut ac = glider();
        let mut stepper = EulerIntegrator::new(0.05);
        let mut pilot = PassivePilot::new(0.01);
        let mut ticks = Vec::new();

        let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
        let steps = sim.run(1.0, 0.1, |t| ticks.push(t)).unwrap();
        assert_eq!(steps, 10);
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[9], 9.0 * 0.1);
        assert_relative_eq!(stepper.time(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_time_step_rejected() {
        let zone = FlatZone::calm();
        let mut ac = glider();
        let mut stepper = EulerIntegrator::new(0.01);
        let mut pilot = PassivePilot::new(0.01);
        let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
        assert!(sim.run(1.0, 0.0, |_| {}).is_err());
    }

    #[test]
    fn learning_pilot_updates_every_tick() {
        let zone = ThermalZone::new(vec![Thermal { x: -450.0, y: 0.0, radius: 120.0, w_max: 2.5 }]).unwrap();
        let mut ac = glider();
        let mut stepper = EulerIntegrator::new(0.01);
        let mut pilot = QLearningPilot::new(QLearningParams { seed: 9, ..QLearningParams::default() }).unwrap();

        {
            let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
            for _ in 0..20 {
                sim.step(0.01).unwrap();
            }
        }

        assert_eq!(pilot.updates(), 20);
        assert!(pilot.parameters().iter().any(|&w| w != 0.0));
        assert!(pilot.parameters().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let zone = FlatZone::new(1.0, 0.0);
        let fly = || {
            let mut ac = glider();
            let mut stepper = EulerIntegrator::new(0.01);
            let mut pilot = QLearningPilot::new(QLearningParams { epsilon: 0.2, seed: 1234, ..QLearningParams::default() }).unwrap();
            let mut sim = Simulation::new(&zone, &mut ac, &mut stepper, &mut pilot);
            sim.run(1.0, 0.01, |_| {}).unwrap();
            (ac.state().duplicate(), pilot.parameters().clone())
        };
        assert_eq!(fly(), fly());
    }
}
