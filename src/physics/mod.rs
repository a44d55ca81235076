pub mod flow_zone;
pub mod thermal;

pub use flow_zone::{FlatZone, FlowZone};
pub use thermal::{Thermal, ThermalZone};
