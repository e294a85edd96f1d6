//! DC operating points from PSF-ASCII result files.
//!
//! Only the `VALUE` section is read. Each value line holds a quoted signal
//! name, a quoted type and a number. Names of the form `device:param` are
//! device operating-point parameters; other names with type `V` are node
//! voltages and are stored under the parameter `V`.

use std::path::Path;

use indexmap::IndexMap;
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_till1};
use nom::character::complete::{char, space0, space1};
use nom::combinator::all_consuming;
use nom::number::complete::double;
use nom::sequence::{delimited, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Operating-point parameters keyed by device, then by parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingPoint {
    devices: IndexMap<String, IndexMap<String, f64>>,
}

impl OperatingPoint {
    /// The value of `param` of `device`.
    pub fn get(&self, device: &str, param: &str) -> Option<f64> {
        self.devices.get(device)?.get(param).copied()
    }

    /// All parameters of `device`.
    pub fn device(&self, device: &str) -> Option<&IndexMap<String, f64>> {
        self.devices.get(device)
    }

    /// Iterates over devices and their parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, f64>)> {
        self.devices.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of devices (and nodes).
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no values were read.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Appends every value to per-parameter lists in `acc`.
    ///
    /// Used to collect the points of an unstructured sweep into one table.
    pub fn append_to(&self, acc: &mut IndexMap<String, IndexMap<String, Vec<f64>>>) {
        for (device, params) in self.devices.iter() {
            let entry = acc.entry(device.clone()).or_default();
            for (param, value) in params.iter() {
                entry.entry(param.clone()).or_default().push(*value);
            }
        }
    }

    fn insert(&mut self, device: &str, param: &str, value: f64) {
        self.devices
            .entry(device.to_string())
            .or_default()
            .insert(param.to_string(), value);
    }
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"'))(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    alt((quoted, take_till1(|c: char| c.is_whitespace())))(input)
}

fn value_line(input: &str) -> IResult<&str, (&str, &str, f64)> {
    let (input, (_, name, _, kind, _, value, _)) = all_consuming(tuple((
        space0, token, space1, token, space1, double, space0,
    )))(input)?;
    Ok((input, (name, kind, value)))
}

/// Parses the operating point in PSF-ASCII text.
pub fn parse_oppoint(text: &str) -> Result<OperatingPoint> {
    let mut op = OperatingPoint::default();
    let mut in_values = false;
    let mut seen_values = false;
    for line in text.lines() {
        let trimmed = line.trim();
        match trimmed {
            "VALUE" => {
                in_values = true;
                seen_values = true;
                continue;
            }
            "END" => {
                in_values = false;
                continue;
            }
            _ if !in_values => continue,
            _ => {}
        }
        let Ok((_, (name, kind, value))) = value_line(trimmed) else {
            continue;
        };
        if let Some((device, param)) = name.split_once(':') {
            op.insert(device, param, value);
        } else if kind == "V" {
            op.insert(name, "V", value);
        }
    }
    if !seen_values {
        return Err(Error::Extraction(
            "no VALUE section in operating point file".to_string(),
        ));
    }
    Ok(op)
}

/// Reads the operating point stored in a PSF-ASCII file.
pub fn read_oppoint(path: impl AsRef<Path>) -> Result<OperatingPoint> {
    let path = path.as_ref();
    tracing::debug!("reading operating point {:?}", path);
    parse_oppoint(&std::fs::read_to_string(path)?)
}
