pub mod base;
pub mod passive;
pub mod q_learning;

pub use base::{bank_recovery, Pilot, RECOVERY_BANK};
pub use passive::PassivePilot;
pub use q_learning::{feature_vector, QLearningParams, QLearningPilot, FEATURE_LEN};
