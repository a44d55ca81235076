use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::SimError;
use crate::io::state_log::LogRow;

/// Summary statistics computed from a logged flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    pub rows: usize,
    pub duration: f64,
    pub initial_altitude: f64,
    pub final_altitude: f64,
    pub max_altitude: f64,
    pub min_altitude: f64,
    pub max_distance: f64,
    pub mean_airspeed: f64,
}

impl FlightSummary {
    /// Compute the summary from log rows. Returns `None` for an empty log.
    pub fn from_rows(rows: &[LogRow]) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;

        let max_altitude = rows.iter().map(|r| r.z).fold(f64::NEG_INFINITY, f64::max);
        let min_altitude = rows.iter().map(|r| r.z).fold(f64::INFINITY, f64::min);
        let max_distance = rows
            .iter()
            .map(LogRow::horizontal_distance)
            .fold(0.0_f64, f64::max);
        let mean_airspeed = rows.iter().map(|r| r.v).sum::<f64>() / rows.len() as f64;

        Some(FlightSummary {
            rows: rows.len(),
            duration: last.time - first.time,
            initial_altitude: first.z,
            final_altitude: last.z,
            max_altitude,
            min_altitude,
            max_distance,
            mean_airspeed,
        })
    }

    /// Net altitude change over the flight (m).
    pub fn altitude_gain(&self) -> f64 {
        self.final_altitude - self.initial_altitude
    }
}

/// Write the summary as pretty JSON.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> Result<(), SimError> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_summary_file(path: &Path, summary: &FlightSummary) -> Result<(), SimError> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}
