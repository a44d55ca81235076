use super::base::{bank_recovery, Pilot};
use crate::dynamics::state::{Command, GliderState};

/// Pilot that never moves the controls while in range.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassivePilot {
    pub angle_rate_magnitude: f64,
}

impl PassivePilot {
    pub fn new(angle_rate_magnitude: f64) -> Self {
        Self { angle_rate_magnitude }
    }
}

impl Pilot for PassivePilot {
    fn control(&mut self, _state: &GliderState, command: &mut Command) {
        *command = Command::default();
    }

    fn out_of_range(&mut self, state: &GliderState, command: &mut Command) {
        bank_recovery(state, command, self.angle_rate_magnitude);
    }

    fn name(&self) -> &str {
        "PassivePilot"
    }
}
