use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use l2f_sim::config::{IntegratorKind, PilotKind, RunConfig, ZoneConfig};
use l2f_sim::io::{self, FlightSummary};
use l2f_sim::physics::{FlatZone, FlowZone, ThermalZone};
use l2f_sim::pilot::{PassivePilot, Pilot, QLearningPilot};
use l2f_sim::sim::{EulerIntegrator, Rk4Integrator, Simulation, Stepper};
use l2f_sim::types::{Aircraft, BeelerGlider, Command};
use l2f_sim::SimError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    match run(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<PathBuf>) -> Result<(), SimError> {
    let config = match &config_path {
        Some(path) => RunConfig::from_file(path)?,
        None => {
            let config = RunConfig::default();
            config.validate()?;
            config
        }
    };

    // -----------------------------------------------------------------------
    // Environment
    // -----------------------------------------------------------------------
    let zone: Box<dyn FlowZone> = match &config.zone {
        ZoneConfig::Flat { wind_x, wind_y } => Box::new(FlatZone::new(*wind_x, *wind_y)),
        ZoneConfig::Thermal { path } => Box::new(ThermalZone::from_file(path)?),
    };

    // -----------------------------------------------------------------------
    // Aircraft, pilot, stepper
    // -----------------------------------------------------------------------
    let mut glider = BeelerGlider::new(config.initial.to_state(), Command::default(), config.glider);

    let mut pilot: Box<dyn Pilot> = match config.pilot.kind {
        PilotKind::QLearning => Box::new(QLearningPilot::new(config.pilot.q_learning)?),
        PilotKind::Passive => Box::new(PassivePilot::new(config.pilot.q_learning.angle_rate_magnitude)),
    };

    let t = &config.time;
    let log = config.output.state_log.as_ref();
    let mut stepper: Box<dyn Stepper> = match t.integrator {
        IntegratorKind::Euler => {
            let s = EulerIntegrator::new(t.dt).with_model_check(t.model_check);
            Box::new(match log {
                Some(path) => s.with_log(path),
                None => s,
            })
        }
        IntegratorKind::Rk4 => {
            let s = Rk4Integrator::new(t.dt).with_model_check(t.model_check);
            Box::new(match log {
                Some(path) => s.with_log(path),
                None => s,
            })
        }
    };

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------
    {
        let mut sim = Simulation::new(zone.as_ref(), &mut glider, stepper.as_mut(), pilot.as_mut());
        sim.run(t.limit_time, t.time_step, |current_time| {
            println!("t = {}", current_time);
        })?;
    }

    info!(final_state = %glider.state(), in_model = glider.is_in_model(), "final state");

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------
    if let Some((log_path, summary_path)) = config.output.summary_paths() {
        let rows = io::read_log(log_path)?;
        if let Some(summary) = FlightSummary::from_rows(&rows) {
            io::write_summary_file(summary_path, &summary)?;
            info!(
                path = %summary_path.display(),
                altitude_gain = summary.altitude_gain(),
                max_altitude = summary.max_altitude,
                "wrote flight summary"
            );
        }
    }

    Ok(())
}
