//! Tabular event files.
//!
//! Event stimuli are written as comma-delimited `time,value` rows. Event
//! outputs are whitespace- or comma-delimited tables whose first column is the
//! time base, preceded by a backend-specific number of header rows.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::trace::Trace;

/// A table of value columns sharing one time base.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    /// The shared time base.
    pub time: Vec<f64>,
    /// Value columns, each as long as `time`.
    pub columns: Vec<Vec<f64>>,
}

impl EventTable {
    /// The number of rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Column `idx` paired with the time base.
    pub fn trace(&self, idx: usize) -> Option<Trace> {
        self.columns
            .get(idx)
            .map(|col| Trace::new(self.time.clone(), col.clone()))
    }
}

/// Splits numbers whose separating space was lost to a three-digit exponent.
///
/// `1.0e-100-2.5e-3` becomes `["1.0e-100", "-2.5e-3"]`.
pub(crate) fn split_glued(token: &str) -> Vec<&str> {
    let bytes = token.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        let sign = bytes[i] == b'+' || bytes[i] == b'-';
        let prev = bytes[i - 1];
        if sign && (prev.is_ascii_digit() || prev == b'.') {
            parts.push(&token[start..i]);
            start = i;
        }
    }
    parts.push(&token[start..]);
    parts
}

/// Parses one row of numbers. Returns `None` if any field is not a number.
pub(crate) fn parse_row(line: &str, delim: &str) -> Option<Vec<f64>> {
    let fields: Vec<&str> = if delim.trim().is_empty() {
        line.split_whitespace().collect()
    } else {
        line.split(delim)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    };
    if fields.is_empty() {
        return None;
    }
    let mut row = Vec::with_capacity(fields.len());
    for field in fields {
        match field.parse::<f64>() {
            Ok(value) => row.push(value),
            Err(_) => {
                for part in split_glued(field) {
                    row.push(part.parse::<f64>().ok()?);
                }
            }
        }
    }
    Some(row)
}

/// Parses an event table from text.
///
/// The first `skip_rows` lines are ignored. Every remaining non-blank line must
/// hold the same number of numeric fields.
pub fn parse_event_table(text: &str, delim: &str, skip_rows: usize) -> Result<EventTable> {
    let mut table = EventTable::default();
    let mut width = None;
    for (i, line) in text.lines().enumerate().skip(skip_rows) {
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(line, delim).ok_or_else(|| Error::Parse {
            line: i + 1,
            message: format!("expected numeric fields, found `{}`", line.trim()),
        })?;
        let width = *width.get_or_insert(row.len());
        if row.len() != width || width < 2 {
            return Err(Error::Parse {
                line: i + 1,
                message: format!("expected {} columns, found {}", width.max(2), row.len()),
            });
        }
        if table.columns.is_empty() {
            table.columns = vec![Vec::new(); width - 1];
        }
        table.time.push(row[0]);
        for (col, value) in table.columns.iter_mut().zip(&row[1..]) {
            col.push(*value);
        }
    }
    Ok(table)
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => {
            Error::Extraction(format!("output file {path:?} does not exist"))
        }
        _ => Error::Io(err),
    })
}

/// Reads an event table from a file.
pub fn read_event_table(
    path: impl AsRef<Path>,
    delim: &str,
    skip_rows: usize,
) -> Result<EventTable> {
    let path = path.as_ref();
    tracing::debug!("reading event output {:?}", path);
    let table = parse_event_table(&read_to_string(path)?, delim, skip_rows)?;
    if table.is_empty() {
        return Err(Error::Extraction(format!("output file {path:?} is empty")));
    }
    Ok(table)
}

/// Reads several event files as one table.
///
/// The time base of the first file is kept. Every further file contributes its
/// value columns, matched to the time base by row position.
pub fn read_event_files<P: AsRef<Path>>(
    paths: &[P],
    delim: &str,
    skip_rows: usize,
) -> Result<EventTable> {
    let mut paths = paths.iter();
    let first = paths
        .next()
        .ok_or_else(|| Error::Configuration("no event files given".to_string()))?;
    let mut table = read_event_table(first, delim, skip_rows)?;
    for path in paths {
        let next = read_event_table(path, delim, skip_rows)?;
        if next.len() != table.len() {
            return Err(Error::Extraction(format!(
                "event file {:?} has {} rows, expected {}",
                path.as_ref(),
                next.len(),
                table.len()
            )));
        }
        table.columns.extend(next.columns);
    }
    Ok(table)
}

/// Writes an event stimulus file of comma-delimited `time,value` rows.
pub fn write_event_stimulus(path: impl AsRef<Path>, trace: &Trace) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("writing event input {:?}", path);
    let mut out = BufWriter::new(File::create(path)?);
    for (t, v) in trace.iter() {
        writeln!(out, "{t:e},{v:e}")?;
    }
    out.flush()?;
    Ok(())
}

/// Checks that the time base of `trace` has no repeated points.
///
/// Repeated time points mean the simulator printed too few digits. Returns
/// `false` and logs a warning in that case.
pub fn check_output_accuracy(label: &str, trace: &Trace) -> bool {
    let exact = trace.time.windows(2).all(|w| w[1] - w[0] != 0.0);
    if !exact {
        tracing::warn!(
            "accuracy of output {} is insufficient; increase the number of printed digits and re-run the simulation",
            label
        );
    }
    exact
}
