use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::Serialize;

use crate::dynamics::state::GliderState;
use crate::error::SimError;

/// Number of space-separated fields in one log row.
pub const FIELDS: usize = 10;

/// One parsed row of the state log.
///
/// Columns: x y z V gamma khi alpha beta sigma time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub v: f64,
    pub gamma: f64,
    pub khi: f64,
    pub alpha: f64,
    pub beta: f64,
    pub sigma: f64,
    pub time: f64,
}

impl LogRow {
    pub fn from_state(s: &GliderState, time: f64) -> Self {
        Self {
            x: s.pos.x,
            y: s.pos.y,
            z: s.pos.z,
            v: s.v,
            gamma: s.gamma,
            khi: s.khi,
            alpha: s.alpha,
            beta: s.beta,
            sigma: s.sigma,
            time,
        }
    }

    pub fn horizontal_distance(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Write one state row. Values use the shortest representation that
/// parses back to the same `f64`.
pub fn write_row<W: Write>(writer: &mut W, s: &GliderState, time: f64) -> Result<(), SimError> {
    writeln!(
        writer,
        "{} {} {} {} {} {} {} {} {} {}",
        s.pos.x, s.pos.y, s.pos.z, s.v, s.gamma, s.khi, s.alpha, s.beta, s.sigma, time,
    )?;
    Ok(())
}

/// Append a row to the log file, truncating it first when `time` is zero.
/// The file is opened and closed on every call.
pub fn save(path: &Path, s: &GliderState, time: f64) -> Result<(), SimError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut file = if time == 0.0 {
        File::create(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };
    write_row(&mut file, s, time)
}

/// Parse a single log row. `line_no` is only used for error reporting.
pub fn parse_row(line: &str, line_no: usize) -> Result<LogRow, SimError> {
    let values = line
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|e| SimError::LogParse {
                line: line_no,
                reason: format!("'{}': {}", tok, e),
            })
        })
        .collect::<Result<Vec<f64>, SimError>>()?;

    if values.len() != FIELDS {
        return Err(SimError::LogParse {
            line: line_no,
            reason: format!("expected {} fields, found {}", FIELDS, values.len()),
        });
    }

    Ok(LogRow {
        x: values[0],
        y: values[1],
        z: values[2],
        v: values[3],
        gamma: values[4],
        khi: values[5],
        alpha: values[6],
        beta: values[7],
        sigma: values[8],
        time: values[9],
    })
}

/// Read every non-empty row of a log file.
pub fn read_log(path: &Path) -> Result<Vec<LogRow>, SimError> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(&line, idx + 1)?);
    }
    Ok(rows)
}
