use crate::dynamics::state::{Command, GliderState};

/// Bank angle (rad) below which the out-of-range recovery keeps rolling in.
pub const RECOVERY_BANK: f64 = 0.4;

/// Trait for pilots.
///
/// Implement this to plug a control policy into the stepping loop. Both
/// methods read the current state and overwrite the command in place.
pub trait Pilot {
    /// Main policy, invoked once per macro step while in range.
    fn control(&mut self, state: &GliderState, command: &mut Command);

    /// Recovery policy used when the glider strays too far from the centre.
    fn out_of_range(&mut self, state: &GliderState, command: &mut Command);

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Turn back towards the centre: hold angle of attack and sideslip, roll in
/// until the bank reaches `RECOVERY_BANK`.
pub fn bank_recovery(state: &GliderState, command: &mut Command, angle_rate_magnitude: f64) {
    command.dalpha = 0.0;
    command.dbeta = 0.0;
    command.dsigma = if state.sigma < RECOVERY_BANK {
        angle_rate_magnitude
    } else {
        0.0
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_rolls_in_below_threshold() {
        let state = GliderState { sigma: 0.2, ..GliderState::default() };
        let mut cmd = Command::new(0.3, 0.1, -0.2);
        bank_recovery(&state, &mut cmd, 0.01);
        assert_eq!(cmd, Command::new(0.0, 0.0, 0.01));
    }

    #[test]
    fn recovery_holds_above_threshold() {
        let state = GliderState { sigma: 0.5, ..GliderState::default() };
        let mut cmd = Command::new(0.3, 0.1, -0.2);
        bank_recovery(&state, &mut cmd, 0.01);
        assert_eq!(cmd, Command::new(0.0, 0.0, 0.0));
    }
}
