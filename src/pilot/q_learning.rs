use nalgebra::DVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::base::{bank_recovery, Pilot};
use crate::dynamics::state::{Command, GliderState};
use crate::error::SimError;

// ---------------------------------------------------------------------------
// Linear features over (state, command)
// ---------------------------------------------------------------------------

/// Raw inputs: zdot, gammadot, alpha, sigma, dalpha, dsigma.
pub const RAW_FEATURES: usize = 6;

/// Bias + raw inputs + upper-triangular pairwise products.
pub const FEATURE_LEN: usize = 1 + RAW_FEATURES + RAW_FEATURES * (RAW_FEATURES + 1) / 2;

/// Feature vector of a (state, command) pair.
///
/// Layout: `[1, r0..r5, r0*r0, r0*r1, .., r0*r5, r1*r1, .., r5*r5]`.
pub fn feature_vector(s: &GliderState, a: &Command) -> DVector<f64> {
    let raw = [s.dpos.z, s.gammadot, s.alpha, s.sigma, a.dalpha, a.dsigma];

    let mut phi = Vec::with_capacity(FEATURE_LEN);
    phi.push(1.0);
    phi.extend_from_slice(&raw);
    for i in 0..raw.len() {
        for j in i..raw.len() {
            phi.push(raw[i] * raw[j]);
        }
    }
    DVector::from_vec(phi)
}

/// Indices of the entries equal to the maximum, and of all the others.
/// NaN scores never count as maximal; if every score is NaN all of them do.
fn split_by_max(scores: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (up, down): (Vec<usize>, Vec<usize>) = (0..scores.len()).partition(|&j| scores[j] >= max);
    if up.is_empty() {
        (down, Vec::new())
    } else {
        (up, down)
    }
}

// ---------------------------------------------------------------------------
// Q-learning pilot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningParams {
    pub angle_rate_magnitude: f64,   // rad per macro step
    pub epsilon: f64,                // exploration probability
    pub lr: f64,                     // learning rate
    pub df: f64,                     // discount factor
    pub seed: u64,
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            angle_rate_magnitude: 0.01,
            epsilon: 0.01,
            lr: 0.1,
            df: 0.95,
            seed: 0,
        }
    }
}

impl QLearningParams {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.angle_rate_magnitude > 0.0) || !self.angle_rate_magnitude.is_finite() {
            return Err(SimError::invalid("angle_rate_magnitude", self.angle_rate_magnitude));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(SimError::invalid("epsilon", self.epsilon));
        }
        if !(self.lr > 0.0 && self.lr <= 1.0) {
            return Err(SimError::invalid("lr", self.lr));
        }
        if !(0.0..=1.0).contains(&self.df) {
            return Err(SimError::invalid("df", self.df));
        }
        Ok(())
    }
}

/// Online Q-learning with a linear action-value function.
///
/// Every tick performs one TD(0) update on the previous (state, command)
/// pair, bootstrapped with the greedy action in the current state, then
/// picks the next command epsilon-greedily.
#[derive(Debug, Clone)]
pub struct QLearningPilot {
    params: QLearningParams,
    prev_state: GliderState,
    prev_command: Command,
    parameters: DVector<f64>,
    rng: ChaCha8Rng,
    total_reward: f64,
    updates: u64,
}

impl QLearningPilot {
    /// Fresh pilot with all parameters at zero.
    pub fn new(params: QLearningParams) -> Result<Self, SimError> {
        let prev_state = GliderState::default();
        let prev_command = Command::default();
        let len = feature_vector(&prev_state, &prev_command).len();
        Self::with_parameters(params, DVector::zeros(len))
    }

    /// Pilot warm-started from previously learned parameters.
    pub fn with_parameters(params: QLearningParams, parameters: DVector<f64>) -> Result<Self, SimError> {
        params.validate()?;
        let prev_state = GliderState::default();
        let prev_command = Command::default();

        let expected = feature_vector(&prev_state, &prev_command).len();
        if parameters.len() != expected {
            return Err(SimError::FeatureLength {
                expected,
                found: parameters.len(),
            });
        }

        Ok(Self {
            params,
            prev_state,
            prev_command,
            parameters,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            total_reward: 0.0,
            updates: 0,
        })
    }

    pub fn params(&self) -> &QLearningParams {
        &self.params
    }

    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    /// Sum of the rewards observed so far.
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Number of TD updates performed.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn q_value(&self, s: &GliderState, a: &Command) -> f64 {
        feature_vector(s, a).dot(&self.parameters)
    }

    /// The nine commands combining `dalpha` and `dsigma` in `{-m, 0, +m}`.
    pub fn available_actions(&self) -> Vec<Command> {
        let m = self.params.angle_rate_magnitude;
        let steps = [-m, 0.0, m];
        steps
            .iter()
            .flat_map(|&da| steps.iter().map(move |&ds| Command::new(da, 0.0, ds)))
            .collect()
    }

    fn scored_actions(&self, s: &GliderState) -> (Vec<Command>, Vec<usize>, Vec<usize>) {
        let actions = self.available_actions();
        let scores: Vec<f64> = actions.iter().map(|a| self.q_value(s, a)).collect();
        let (max_ind, non_max_ind) = split_by_max(&scores);
        (actions, max_ind, non_max_ind)
    }

    fn pick(&mut self, actions: &[Command], indices: &[usize]) -> Command {
        actions[indices[self.rng.gen_range(0..indices.len())]]
    }

    /// Uniform choice among the actions tied at the maximal Q-value.
    pub fn greedy_policy(&mut self, s: &GliderState) -> Command {
        let (actions, max_ind, _) = self.scored_actions(s);
        self.pick(&actions, &max_ind)
    }

    /// With probability `epsilon`, a uniform choice among the non-maximal
    /// actions; otherwise the greedy choice. When every action is tied at
    /// the maximum there is nothing to explore and the greedy choice is used.
    pub fn epsilon_greedy_policy(&mut self, s: &GliderState) -> Command {
        let (actions, max_ind, non_max_ind) = self.scored_actions(s);
        let explore = self.rng.gen::<f64>() < self.params.epsilon;

        if explore && !non_max_ind.is_empty() {
            self.pick(&actions, &non_max_ind)
        } else {
            if explore {
                debug!("all actions tied, no exploration possible");
            }
            self.pick(&actions, &max_ind)
        }
    }

    /// Energy-rate reward of the previous state. `_next` is not used yet.
    pub fn reward(&self, _next: &GliderState) -> f64 {
        self.prev_state.energy_rate()
    }

    /// Linear TD(0) step on the previous (state, command) pair.
    pub fn update_parameters(&mut self, delta: f64) {
        let phi = feature_vector(&self.prev_state, &self.prev_command);
        self.parameters.axpy(self.params.lr * delta, &phi, 1.0);
    }
}

impl Pilot for QLearningPilot {
    fn control(&mut self, state: &GliderState, command: &mut Command) {
        let a_off = self.greedy_policy(state);
        let reward = self.reward(state);
        let delta = reward + self.params.df * self.q_value(state, &a_off)
            - self.q_value(&self.prev_state, &self.prev_command);
        self.update_parameters(delta);

        *command = self.epsilon_greedy_policy(state);
        self.prev_state = state.duplicate();
        self.prev_command = *command;

        self.total_reward += reward;
        self.updates += 1;
        debug!(reward, delta, ?command, "q-learning step");
    }

    fn out_of_range(&mut self, state: &GliderState, command: &mut Command) {
        bank_recovery(state, command, self.params.angle_rate_magnitude);
    }

    fn name(&self) -> &str {
        "QLearningPilot"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
