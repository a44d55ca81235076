pub mod glider;
pub mod state;

pub use glider::{Aircraft, BeelerGlider, GliderParams};
pub use state::{Command, GliderState, G};
