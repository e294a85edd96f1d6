//! Sampling of digital buses and analog values at trigger crossings.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spice::BusRange;

use crate::data::{Column, UNKNOWN_BIT};
use crate::error::{Error, Result};
use crate::trace::{Trace, TraceSet};

/// The format of a sampled output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoFormat {
    /// Unsigned integers.
    #[default]
    Dec,
    /// Strings of ones and zeros.
    Bin,
    /// The analog value at each trigger time. Single-bit signals only.
    Volt,
}

impl Display for IoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dec => write!(f, "dec"),
            Self::Bin => write!(f, "bin"),
            Self::Volt => write!(f, "volt"),
        }
    }
}

impl FromStr for IoFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dec" => Ok(Self::Dec),
            "bin" => Ok(Self::Bin),
            "volt" => Ok(Self::Volt),
            _ => Err(Error::Configuration(format!("unknown io format `{s}`"))),
        }
    }
}

/// Settings for sampling one bus.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Threshold for rounding bit voltages.
    pub vth: f64,
    /// Output format.
    pub format: IoFormat,
    /// Iterate bits from the end of the declared range instead of the start.
    pub big_endian: bool,
}

/// The result of sampling one bus.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledBus {
    /// Sampled columns: one word or integer column, or time and value columns
    /// for [`IoFormat::Volt`].
    pub columns: Vec<Column>,
    /// Bits whose traces were missing or empty and were filled with
    /// [`UNKNOWN_BIT`].
    pub unknown_bits: Vec<String>,
}

impl SampledBus {
    /// Returns `true` if any bit had to be filled.
    pub fn is_degraded(&self) -> bool {
        !self.unknown_bits.is_empty()
    }
}

/// Index of the sample of `time` nearest to `t`.
///
/// `time` must be non-decreasing. Ties resolve to the earlier sample.
pub fn nearest_index(time: &[f64], t: f64) -> Option<usize> {
    if time.is_empty() {
        return None;
    }
    let upper = time.partition_point(|&x| x < t);
    if upper == 0 {
        return Some(0);
    }
    if upper == time.len() {
        return Some(time.len() - 1);
    }
    let lower = upper - 1;
    if (t - time[lower]).abs() <= (time[upper] - t).abs() {
        Some(lower)
    } else {
        Some(upper)
    }
}

/// Samples `signal` at each of `times`.
///
/// Returns the nearest source sample, with its own time, for every requested
/// time.
pub fn sample_signal(signal: &Trace, times: &[f64]) -> Trace {
    Trace::from_pairs(times.iter().filter_map(|&t| {
        nearest_index(&signal.time, t).map(|i| (signal.time[i], signal.value[i]))
    }))
}

/// Converts a bus word to an unsigned integer, most significant character first.
///
/// Returns `None` if the word holds anything but ones and zeros.
pub fn word_to_unsigned(word: &str) -> Option<u64> {
    if word.is_empty() || word.len() > 64 || !word.chars().all(|c| c == '0' || c == '1') {
        return None;
    }
    u64::from_str_radix(word, 2).ok()
}

/// Samples every bit of `bus` at `trigger_times` and assembles bus words.
///
/// Bit traces are looked up in `traces` by bit name. Bits are visited in the
/// declared order of the bus range (`DOUT<3:0>` visits bit 3 first), or in the
/// reverse order if `big_endian` is set; the first visited bit becomes the first
/// character of each word. A bit without a usable trace is filled with
/// [`UNKNOWN_BIT`] and reported in [`SampledBus::unknown_bits`].
pub fn sample_bus(
    bus: &BusRange,
    traces: &TraceSet,
    trigger_times: &[f64],
    options: &SampleOptions,
) -> Result<SampledBus> {
    if options.format == IoFormat::Volt {
        if bus.width() != 1 {
            return Err(Error::Configuration(format!(
                "voltage sampling is only supported for single-bit signals, got {bus}"
            )));
        }
        let name = bus.bit_name(bus.start());
        let trace = traces
            .real(&name)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Extraction(format!("no event data found for {name}")))?;
        let sampled = sample_signal(trace, trigger_times);
        return Ok(SampledBus {
            columns: vec![Column::Real(sampled.time), Column::Real(sampled.value)],
            unknown_bits: Vec::new(),
        });
    }

    let mut order: Vec<usize> = bus.indices().collect();
    if options.big_endian {
        order.reverse();
    }

    let width = order.len();
    let mut words = vec![String::with_capacity(width); trigger_times.len()];
    let mut unknown_bits = Vec::new();
    for index in order {
        let name = bus.bit_name(index);
        match traces.real(&name).filter(|t| !t.is_empty()) {
            Some(trace) => {
                let sampled = sample_signal(trace, trigger_times);
                for (word, value) in words.iter_mut().zip(sampled.value) {
                    word.push(if value >= options.vth { '1' } else { '0' });
                }
            }
            None => {
                for word in words.iter_mut() {
                    word.push(UNKNOWN_BIT);
                }
                unknown_bits.push(name);
            }
        }
    }

    if !unknown_bits.is_empty() {
        tracing::warn!(
            "failed reading sample type output {}; unknown bits: {}",
            bus,
            unknown_bits.join(", ")
        );
    }

    let column = match options.format {
        IoFormat::Dec => {
            if width > 64 {
                return Err(Error::Configuration(format!(
                    "bus {bus} is too wide for integer output"
                )));
            }
            Column::Unsigned(words.iter().map(|w| word_to_unsigned(w)).collect())
        }
        _ => Column::Words { width, words },
    };
    Ok(SampledBus {
        columns: vec![column],
        unknown_bits,
    })
}
