//! Digital vector stimulus files.
//!
//! Spectre reads clocked bus patterns from vector files pulled in with
//! `vec_include`. Ngspice reads them through `d_source` models whose input
//! file lists one time stamp and one state per bit on every line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use spice::{Backend, BusRange};

use crate::error::{Error, Result};

/// One value of a clocked digital input.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    /// An unsigned integer, converted to a binary word of the bus width.
    Unsigned(u64),
    /// A word of ones and zeros, first character most significant.
    Bits(String),
}

impl SampleValue {
    /// The binary word for this value on a bus of `width` bits.
    pub fn to_word(&self, width: usize) -> Result<String> {
        match self {
            Self::Unsigned(value) => {
                if width < 64 && *value >> width != 0 {
                    return Err(Error::Configuration(format!(
                        "value {value} does not fit in {width} bits"
                    )));
                }
                Ok(format!("{value:0width$b}"))
            }
            Self::Bits(bits) => {
                if bits.len() != width || !bits.chars().all(|c| c == '0' || c == '1') {
                    return Err(Error::Configuration(format!(
                        "`{bits}` is not a {width}-bit binary word"
                    )));
                }
                Ok(bits.clone())
            }
        }
    }
}

/// The vector file flavor of a backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum VectorFormat {
    /// Spectre `vec_include` file.
    Spectre,
    /// Ngspice `d_source` input file.
    Ngspice,
}

impl VectorFormat {
    /// The vector file format used by `backend`, if it uses one.
    ///
    /// Eldo patterns are written inline in the testbench.
    pub fn for_backend(backend: Backend) -> Option<Self> {
        match backend {
            Backend::Eldo => None,
            Backend::Spectre => Some(Self::Spectre),
            Backend::Ngspice => Some(Self::Ngspice),
        }
    }
}

/// Timing and levels of a clocked digital input, in seconds and volts.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorTiming {
    /// Sample rate, in samples per second.
    pub rs: f64,
    /// Rise time.
    pub trise: f64,
    /// Fall time.
    pub tfall: f64,
    /// Delay of the first sample.
    pub tdelay: f64,
    /// High level.
    pub vih: f64,
    /// Low level.
    pub vil: f64,
}

/// A parsed Spectre vector file.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectreVector {
    /// The vector name, as in `DOUT<[3:0]>`.
    pub vname: String,
    /// Timing and levels.
    pub timing: VectorTiming,
    /// Bus words in file order.
    pub words: Vec<String>,
}

/// Converts input values to file words for `bus`.
///
/// Words follow the declared bus order; `big_endian` reverses them.
pub fn encode_words(bus: &BusRange, values: &[SampleValue], big_endian: bool) -> Result<Vec<String>> {
    values
        .iter()
        .map(|value| {
            let word = value.to_word(bus.width())?;
            Ok(if big_endian { word.chars().rev().collect() } else { word })
        })
        .collect()
}

/// Converts file words back to values as given in [`SampleValue::Bits`] form.
pub fn decode_words(words: &[String], big_endian: bool) -> Vec<String> {
    words
        .iter()
        .map(|w| if big_endian { w.chars().rev().collect() } else { w.clone() })
        .collect()
}

fn vector_name(bus: &BusRange) -> String {
    bus.to_string().replace('<', "<[").replace('>', "]>")
}

/// Writes a Spectre vector file.
pub fn write_spectre_vector<W: Write>(
    out: &mut W,
    bus: &BusRange,
    timing: &VectorTiming,
    words: &[String],
) -> Result<()> {
    let radix = vec!["1"; bus.width()].join(" ");
    writeln!(out, "radix {radix}")?;
    writeln!(out, "io i")?;
    writeln!(out, "vname {}", vector_name(bus))?;
    writeln!(out, "tunit ns")?;
    writeln!(out, "period {}", 1e9 / timing.rs)?;
    writeln!(out, "trise {}", timing.trise * 1e9)?;
    writeln!(out, "tfall {}", timing.tfall * 1e9)?;
    writeln!(out, "tdelay {}", timing.tdelay * 1e9)?;
    writeln!(out, "vih {}", timing.vih)?;
    writeln!(out, "vil {}", timing.vil)?;
    writeln!(out)?;
    for word in words {
        writeln!(out, "{word}")?;
    }
    Ok(())
}

/// Writes an Ngspice `d_source` input file.
pub fn write_ngspice_vector<W: Write>(out: &mut W, rs: f64, words: &[String]) -> Result<()> {
    for (j, word) in words.iter().enumerate() {
        let states: Vec<String> = word.chars().map(|c| format!("{c}s")).collect();
        writeln!(out, "{} {}", j as f64 / rs, states.join(" "))?;
    }
    Ok(())
}

fn parse_err(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn header_value(line: usize, value: Option<&str>) -> Result<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .ok_or_else(|| parse_err(line, "expected a number"))
}

/// Parses a Spectre vector file.
pub fn parse_spectre_vector(text: &str) -> Result<SpectreVector> {
    let mut vname = None;
    let mut period = None;
    let mut timing = VectorTiming {
        rs: 0.0,
        trise: 0.0,
        tfall: 0.0,
        tdelay: 0.0,
        vih: 1.0,
        vil: 0.0,
    };
    let mut scale = 1e-9;
    let mut words = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let (key, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match key {
            "radix" | "io" => {}
            "vname" => vname = Some(rest.trim().to_string()),
            "tunit" => {
                scale = match rest.trim() {
                    "s" => 1.0,
                    "ms" => 1e-3,
                    "us" => 1e-6,
                    "ns" => 1e-9,
                    "ps" => 1e-12,
                    "fs" => 1e-15,
                    other => return Err(parse_err(lineno, format!("unknown time unit `{other}`"))),
                }
            }
            "period" => period = Some(header_value(lineno, Some(rest))?),
            "trise" => timing.trise = header_value(lineno, Some(rest))? * scale,
            "tfall" => timing.tfall = header_value(lineno, Some(rest))? * scale,
            "tdelay" => timing.tdelay = header_value(lineno, Some(rest))? * scale,
            "vih" => timing.vih = header_value(lineno, Some(rest))?,
            "vil" => timing.vil = header_value(lineno, Some(rest))?,
            word if word.chars().all(|c| c == '0' || c == '1') => words.push(word.to_string()),
            other => return Err(parse_err(lineno, format!("unexpected `{other}`"))),
        }
    }
    let period = period.ok_or_else(|| parse_err(0, "missing period"))?;
    if period <= 0.0 {
        return Err(parse_err(0, "period must be positive"));
    }
    timing.rs = 1.0 / (period * scale);
    Ok(SpectreVector {
        vname: vname.ok_or_else(|| parse_err(0, "missing vname"))?,
        timing,
        words,
    })
}

/// Parses an Ngspice `d_source` input file into time stamps and words.
pub fn parse_ngspice_vector(text: &str) -> Result<Vec<(f64, String)>> {
    let mut out = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let time = header_value(i + 1, fields.next())?;
        let mut word = String::new();
        for state in fields {
            let bit = state
                .strip_suffix('s')
                .filter(|b| *b == "0" || *b == "1")
                .ok_or_else(|| parse_err(i + 1, format!("invalid state `{state}`")))?;
            word.push_str(bit);
        }
        out.push((time, word));
    }
    Ok(out)
}

/// Writes the vector file for a clocked digital input.
pub fn write_sample_stimulus(
    path: impl AsRef<Path>,
    format: VectorFormat,
    bus: &BusRange,
    timing: &VectorTiming,
    values: &[SampleValue],
    big_endian: bool,
) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("writing sample input {:?}", path);
    let words = encode_words(bus, values, big_endian)?;
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        VectorFormat::Spectre => write_spectre_vector(&mut out, bus, timing, &words)?,
        VectorFormat::Ngspice => write_ngspice_vector(&mut out, timing.rs, &words)?,
    }
    out.flush()?;
    Ok(())
}

/// Reads the words of a vector file written by [`write_sample_stimulus`].
///
/// The words are returned most significant position first, as they were
/// given.
pub fn read_sample_stimulus(
    path: impl AsRef<Path>,
    format: VectorFormat,
    big_endian: bool,
) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let words = match format {
        VectorFormat::Spectre => parse_spectre_vector(&text)?.words,
        VectorFormat::Ngspice => parse_ngspice_vector(&text)?
            .into_iter()
            .map(|(_, word)| word)
            .collect(),
    };
    Ok(decode_words(&words, big_endian))
}
