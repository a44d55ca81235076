use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dynamics::glider::GliderParams;
use crate::dynamics::state::GliderState;
use crate::error::SimError;
use crate::pilot::QLearningParams;
use crate::sim::integrator::{substeps, ModelCheck};

// ---------------------------------------------------------------------------
// Run configuration (YAML)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    #[default]
    Euler,
    Rk4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub limit_time: f64,   // s
    pub time_step: f64,    // s, macro period
    pub dt: f64,           // s, micro-step
    pub integrator: IntegratorKind,
    pub model_check: ModelCheck,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            limit_time: 1000.0,
            time_step: 1e-3,
            dt: 1e-3,
            integrator: IntegratorKind::Euler,
            model_check: ModelCheck::Warn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub x: f64,       // m
    pub y: f64,       // m
    pub z: f64,       // m
    pub v: f64,       // m/s
    pub gamma: f64,   // rad
    pub khi: f64,     // rad
    pub alpha: f64,   // rad
    pub beta: f64,    // rad
    pub sigma: f64,   // rad
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            x: -500.0,
            y: 0.0,
            z: 1000.0,
            v: 20.0,
            gamma: 0.0,
            khi: 0.0,
            alpha: 0.0,
            beta: 0.0,
            sigma: 0.0,
        }
    }
}

impl InitialState {
    /// Derivatives start at zero and are filled by the first micro-step.
    pub fn to_state(&self) -> GliderState {
        GliderState::new(
            Vector3::new(self.x, self.y, self.z),
            self.v,
            self.gamma,
            self.khi,
            self.alpha,
            self.beta,
            self.sigma,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PilotKind {
    #[default]
    QLearning,
    Passive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub kind: PilotKind,
    #[serde(flatten)]
    pub q_learning: QLearningParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneConfig {
    Flat { wind_x: f64, wind_y: f64 },
    Thermal { path: PathBuf },
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig::Flat { wind_x: 0.0, wind_y: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub state_log: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            state_log: Some(PathBuf::from("data/data_plane.txt")),
            summary: None,
        }
    }
}

impl OutputConfig {
    /// `(state_log, summary)` when a summary can be built from the log.
    pub fn summary_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.state_log, &self.summary) {
            (Some(log), Some(summary)) => Some((log.as_path(), summary.as_path())),
            (None, Some(summary)) => {
                warn!(path = %summary.display(), "summary requested without a state log, skipping it");
                None
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub time: TimeConfig,
    pub initial: InitialState,
    pub glider: GliderParams,
    pub pilot: PilotConfig,
    pub zone: ZoneConfig,
    pub output: OutputConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), "loaded run configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SimError> {
        let config: RunConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let t = &self.time;
        if !(t.dt > 0.0) {
            return Err(SimError::invalid("time.dt", t.dt));
        }
        if !(t.time_step > 0.0) {
            return Err(SimError::invalid("time.time_step", t.time_step));
        }
        if !(t.limit_time >= 0.0) {
            return Err(SimError::invalid("time.limit_time", t.limit_time));
        }
        let n = substeps(t.time_step, t.dt);
        if n == 0 {
            return Err(SimError::invalid("time.dt", t.dt));
        }
        if (n as f64 * t.dt - t.time_step).abs() > 1e-9 * t.time_step {
            warn!(
                time_step = t.time_step,
                dt = t.dt,
                "time_step is not a multiple of dt, the last partial micro-step is dropped"
            );
        }

        let g = &self.glider;
        if !(g.m > 0.0) {
            return Err(SimError::invalid("glider.m", g.m));
        }
        if !(g.ws > 0.0) {
            return Err(SimError::invalid("glider.ws", g.ws));
        }
        if !(g.ar > 0.0) {
            return Err(SimError::invalid("glider.ar", g.ar));
        }
        if !(self.initial.v > 0.0) {
            return Err(SimError::invalid("initial.v", self.initial.v));
        }

        self.pilot.q_learning.validate()
    }
}
