//! Print files holding several probed signals.
//!
//! A print file consists of one or more blocks. Each block opens with a header
//! line naming the abscissa (`time` or `freq`) followed by the probed signals,
//! such as `v(out)` or `i(VDD)`, and continues with rows of numbers. The label
//! inside the parentheses names the trace. Lines that are neither headers nor
//! numeric rows are ignored.

use std::path::Path;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::parse_row;
use crate::trace::{ComplexTrace, Trace, TraceSet};

lazy_static! {
    static ref LABEL: Regex = Regex::new(r"\(([^)]+)\)").unwrap();
}

/// The data type of the printed signals.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// One column per signal.
    #[default]
    Real,
    /// Two columns per signal: real and imaginary part.
    Complex,
}

#[derive(Debug, Default)]
struct Block {
    header_line: usize,
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("time") || lower.contains("freq")
}

impl Block {
    fn into_traces(self, dtype: DataType, out: &mut TraceSet) {
        let time: Vec<f64> = self.rows.iter().map(|row| row[0]).collect();
        let ncols = self.rows.iter().map(Vec::len).min().unwrap_or(0);
        let column = |idx: usize| -> Vec<f64> { self.rows.iter().map(|row| row[idx]).collect() };

        let mut n = 0;
        for label in self.labels.iter() {
            tracing::debug!("reading event output {}", label);
            if dtype == DataType::Complex {
                if n + 2 < ncols {
                    out.insert(
                        label,
                        ComplexTrace {
                            time: time.clone(),
                            real: column(n + 1),
                            imag: column(n + 2),
                        },
                    );
                    n += 2;
                    continue;
                }
                tracing::warn!(
                    "index out of range when reading complex output {}; reading it as real",
                    label
                );
            }
            if n + 1 < ncols {
                out.insert(label, Trace::new(time.clone(), column(n + 1)));
                n += 1;
            } else {
                tracing::warn!(
                    "no data column for output {} in block starting on line {}",
                    label,
                    self.header_line
                );
            }
        }
    }
}

/// Parses print file text into traces.
pub fn parse_print_file(text: &str, dtype: DataType) -> Result<TraceSet> {
    let mut blocks: Vec<Block> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = i + 1;
        if is_header(line) {
            let labels: Vec<String> = LABEL
                .captures_iter(line)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unique()
                .collect();
            if labels.is_empty() {
                tracing::warn!("no signal labels found on header line {}", lineno);
                continue;
            }
            blocks.push(Block {
                header_line: lineno,
                labels,
                rows: Vec::new(),
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if let Some(row) = parse_row(line, " ") {
            if row.len() < 2 {
                tracing::warn!("skipping short row on line {}", lineno);
                continue;
            }
            block.rows.push(row);
        }
    }

    if blocks.is_empty() {
        return Err(Error::Extraction(
            "missing header row(s) in print file".to_string(),
        ));
    }

    let mut traces = TraceSet::new();
    for block in blocks {
        block.into_traces(dtype, &mut traces);
    }
    Ok(traces)
}

/// Reads a print file into traces.
pub fn read_print_file(path: impl AsRef<Path>, dtype: DataType) -> Result<TraceSet> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => {
            Error::Extraction(format!("print file {path:?} does not exist"))
        }
        _ => Error::Io(err),
    })?;
    tracing::debug!("reading print file {:?}", path);
    parse_print_file(&text, dtype)
}
