pub mod integrator;
pub mod runner;

pub use integrator::{substeps, EulerIntegrator, ModelCheck, Rk4Integrator, Stepper, OUT_OF_RANGE_DISTANCE};
pub use runner::Simulation;
