pub mod state_log;
pub mod summary;

pub use state_log::{parse_row, read_log, write_row, LogRow};
pub use summary::{write_summary, write_summary_file, FlightSummary};
