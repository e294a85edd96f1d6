//! Input and output signal descriptors.

use std::fmt::Display;
use std::path::PathBuf;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use spice::BusRange;
use waveform::vector::{SampleValue, VectorTiming};
use waveform::{DataType, EdgePolicy, IoFormat, SampleOptions, Trace};

use crate::error::{Error, Result};

/// Whether a signal drives the circuit or is read back from it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// A stimulus.
    #[serde(alias = "input")]
    In,
    /// A measured signal.
    #[serde(alias = "output")]
    Out,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::Out => write!(f, "out"),
        }
    }
}

/// How a signal is represented.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// A continuous time-value waveform.
    Event,
    /// A clocked digital bus.
    Sample,
    /// Threshold crossing times of a continuous waveform.
    Time,
}

impl Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Sample => write!(f, "sample"),
            Self::Time => write!(f, "time"),
        }
    }
}

/// Voltage or current.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    /// Voltage.
    #[default]
    #[serde(alias = "v")]
    V,
    /// Current.
    #[serde(alias = "i")]
    I,
}

impl SourceType {
    /// The lowercase letter used in probes and Spectre primitive names.
    pub fn lower(&self) -> &'static str {
        match self {
            Self::V => "v",
            Self::I => "i",
        }
    }
}

impl Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V => write!(f, "V"),
            Self::I => write!(f, "I"),
        }
    }
}

/// The node whose crossings clock a sampled output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    /// One trigger for every ioname.
    One(String),
    /// One trigger per ioname.
    PerName(Vec<String>),
}

impl Trigger {
    /// The trigger of the `i`th of `count` ionames.
    ///
    /// A list whose length differs from `count` falls back to its first
    /// entry; see [`Trigger::is_mismatched`].
    pub fn for_ioname(&self, i: usize, count: usize) -> Option<&str> {
        match self {
            Self::One(t) => Some(t),
            Self::PerName(ts) if ts.len() == count => ts.get(i).map(String::as_str),
            Self::PerName(ts) => ts.first().map(String::as_str),
        }
    }

    /// Returns `true` if a trigger list does not match `count` ionames.
    pub fn is_mismatched(&self, count: usize) -> bool {
        matches!(self, Self::PerName(ts) if ts.len() != count)
    }
}

/// Stimulus data of an input signal, one entry per ioname.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalData {
    /// Piecewise-linear waveforms.
    Event(Vec<Trace>),
    /// Clocked values.
    Sample(Vec<Vec<SampleValue>>),
}

fn default_vhi() -> Decimal {
    dec!(1.0)
}

fn default_edge_time() -> Decimal {
    dec!(0.000000000005)
}

fn default_vth() -> f64 {
    0.5
}

/// One input or output port of a testbench.
///
/// A descriptor addresses one node per ioname; a bus-named ioname such as
/// `DOUT<3:0>` addresses every bit of the bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// The descriptor name.
    pub name: String,
    /// Stimulus or measurement.
    pub direction: Direction,
    /// Representation.
    pub kind: SignalKind,
    /// Node names in the testbench.
    pub ionames: Vec<String>,
    /// Voltage or current.
    #[serde(default)]
    pub source_type: SourceType,
    /// Stimulus or result files, one per ioname.
    ///
    /// Filled in from a [`crate::layout::RunLayout`] when left empty.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Sample rate of clocked inputs, in samples per second.
    #[serde(default)]
    pub rs: Option<Decimal>,
    /// High level of clocked inputs.
    #[serde(default = "default_vhi")]
    pub vhi: Decimal,
    /// Low level of clocked inputs.
    #[serde(default)]
    pub vlo: Decimal,
    /// Rise time of clocked inputs.
    #[serde(default = "default_edge_time")]
    pub trise: Decimal,
    /// Fall time of clocked inputs.
    #[serde(default = "default_edge_time")]
    pub tfall: Decimal,
    /// Threshold for crossings and bit decisions.
    #[serde(default = "default_vth")]
    pub vth: f64,
    /// Trigger of sampled outputs.
    #[serde(default)]
    pub trigger: Option<Trigger>,
    /// Crossing direction of time outputs and sample triggers.
    #[serde(default)]
    pub edge: EdgePolicy,
    /// Reverse the bit order of sampled buses.
    #[serde(default)]
    pub big_endian: bool,
    /// Crossings before this time are ignored; for clocked inputs, the delay
    /// of the first sample.
    #[serde(default)]
    pub after: f64,
    /// Format of sampled values.
    #[serde(default)]
    pub ioformat: IoFormat,
    /// Real or complex event outputs.
    #[serde(default)]
    pub datatype: DataType,
    /// Keep only strobed samples of event outputs.
    #[serde(default)]
    pub strobe: bool,
    /// Explicit positive node of a Spectre event source.
    #[serde(default)]
    pub pos: Option<String>,
    /// Explicit negative node of a Spectre event source.
    #[serde(default)]
    pub neg: Option<String>,
    /// Stimulus data of inputs.
    #[serde(default)]
    pub data: Option<SignalData>,
}

impl Signal {
    /// Creates a descriptor with default levels and timing.
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        kind: SignalKind,
        ionames: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            kind,
            ionames: ionames.into_iter().map(Into::into).collect(),
            source_type: SourceType::default(),
            files: Vec::new(),
            rs: None,
            vhi: default_vhi(),
            vlo: Decimal::ZERO,
            trise: default_edge_time(),
            tfall: default_edge_time(),
            vth: default_vth(),
            trigger: None,
            edge: EdgePolicy::default(),
            big_endian: false,
            after: 0.0,
            ioformat: IoFormat::default(),
            datatype: DataType::default(),
            strobe: false,
            pos: None,
            neg: None,
            data: None,
        }
    }

    /// Returns `true` for stimuli.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::In
    }

    /// Checks the descriptor for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.ionames.is_empty() {
            return Err(Error::Configuration(format!(
                "signal `{}` has no ionames",
                self.name
            )));
        }
        if self.files.len() != self.ionames.len() {
            return Err(Error::Configuration(format!(
                "signal `{}` has {} ionames but {} files",
                self.name,
                self.ionames.len(),
                self.files.len()
            )));
        }
        if self.kind == SignalKind::Sample {
            let width = self.bus(0)?.width();
            for i in 1..self.ionames.len() {
                let other = self.bus(i)?.width();
                if other != width {
                    return Err(Error::Configuration(format!(
                        "signal `{}` mixes buses of width {} and {}",
                        self.name, width, other
                    )));
                }
            }
            if self.is_input() {
                self.sample_rate()?;
            } else if self.trigger.is_none() {
                return Err(Error::Configuration(format!(
                    "sampled output `{}` has no trigger",
                    self.name
                )));
            }
        }
        if self.is_input() && self.kind == SignalKind::Time {
            return Err(Error::Configuration(format!(
                "time signals can only be outputs, but `{}` is an input",
                self.name
            )));
        }
        Ok(())
    }

    /// The bus range of the `i`th ioname.
    pub fn bus(&self, i: usize) -> Result<BusRange> {
        let name = self.ionames.get(i).ok_or_else(|| {
            Error::Configuration(format!("signal `{}` has no ioname {}", self.name, i))
        })?;
        Ok(BusRange::parse(name)?)
    }

    /// The sample rate of a clocked input.
    pub fn sample_rate(&self) -> Result<Decimal> {
        match self.rs {
            Some(rs) if rs > Decimal::ZERO => Ok(rs),
            _ => Err(Error::Configuration(format!(
                "sampled input `{}` needs a positive sample rate",
                self.name
            ))),
        }
    }

    /// Event data of the `i`th ioname.
    pub fn event_data(&self, i: usize) -> Result<&Trace> {
        match &self.data {
            Some(SignalData::Event(traces)) => traces.get(i),
            _ => None,
        }
        .ok_or_else(|| self.missing_data())
    }

    /// Sample data of the `i`th ioname.
    pub fn sample_data(&self, i: usize) -> Result<&[SampleValue]> {
        match &self.data {
            Some(SignalData::Sample(values)) => values.get(i).map(Vec::as_slice),
            _ => None,
        }
        .ok_or_else(|| self.missing_data())
    }

    fn missing_data(&self) -> Error {
        Error::Configuration(format!("input data not assigned to signal `{}`", self.name))
    }

    /// The time covered by the stimulus of an input.
    ///
    /// Event inputs last until their last time point; clocked inputs last one
    /// sample period per value.
    pub fn duration(&self) -> Result<Option<Decimal>> {
        if !self.is_input() {
            return Ok(None);
        }
        let mut longest: Option<Decimal> = None;
        for i in 0..self.ionames.len() {
            let duration = match self.kind {
                SignalKind::Event => self
                    .event_data(i)?
                    .last_time()
                    .and_then(Decimal::from_f64),
                SignalKind::Sample => {
                    let count = Decimal::from(self.sample_data(i)?.len());
                    Some(count / self.sample_rate()?)
                }
                SignalKind::Time => None,
            };
            longest = longest.max(duration);
        }
        Ok(longest)
    }

    /// Timing and levels of a clocked input.
    pub fn vector_timing(&self) -> Result<VectorTiming> {
        let f = |d: Decimal| d.to_f64().unwrap_or(f64::NAN);
        Ok(VectorTiming {
            rs: f(self.sample_rate()?),
            trise: f(self.trise),
            tfall: f(self.tfall),
            tdelay: self.after,
            vih: f(self.vhi),
            vil: f(self.vlo),
        })
    }

    /// Settings for sampling outputs of this descriptor.
    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            vth: self.vth,
            format: self.ioformat,
            big_endian: self.big_endian,
        }
    }
}
