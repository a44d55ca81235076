pub mod config;
pub mod dynamics;
pub mod error;
pub mod io;
pub mod physics;
pub mod pilot;
pub mod sim;

pub use error::SimError;

pub mod types {
    pub use crate::dynamics::glider::{Aircraft, BeelerGlider, GliderParams};
    pub use crate::dynamics::state::{Command, GliderState, G};
}
