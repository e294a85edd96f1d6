//! Analysis requests.

use std::fmt::Display;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use waveform::StrobeConfig;
use waveform::sweep::SweepDimension;

use crate::error::{Error, Result};

fn default_tprint() -> Decimal {
    dec!(0.000000000001)
}

fn default_fmin() -> Decimal {
    dec!(1)
}

fn default_fmax() -> Decimal {
    dec!(5000000000)
}

/// Transient noise settings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TranNoise {
    /// Minimum noise frequency (Hz).
    #[serde(default = "default_fmin")]
    pub fmin: Decimal,
    /// Maximum noise frequency (Hz).
    #[serde(default = "default_fmax")]
    pub fmax: Decimal,
    /// Noise seed.
    #[serde(default)]
    pub seed: Option<i64>,
}

impl Default for TranNoise {
    fn default() -> Self {
        Self {
            fmin: default_fmin(),
            fmax: default_fmax(),
            seed: None,
        }
    }
}

/// Output strobing of a transient analysis.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Strobe {
    /// Strobe period (sec).
    pub period: Decimal,
    /// Offset of the first strobe point (sec).
    #[serde(default)]
    pub delay: Option<Decimal>,
    /// Time skipped at the start of the simulation (sec).
    #[serde(default)]
    pub skipstart: Option<Decimal>,
}

impl Strobe {
    /// The strobe settings used to resample outputs.
    pub fn config(&self) -> StrobeConfig {
        let f = |d: Option<Decimal>| d.and_then(|d| d.to_f64()).unwrap_or(0.0);
        StrobeConfig {
            period: self.period.to_f64().unwrap_or(f64::NAN),
            delay: f(self.delay),
            skipstart: f(self.skipstart),
        }
    }
}

/// A transient analysis.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tran {
    /// Print step (sec).
    ///
    /// Defaults to 1 ps.
    #[serde(default = "default_tprint")]
    pub tprint: Decimal,
    /// Stop time (sec).
    ///
    /// Inferred from the longest input signal when not given.
    #[serde(default)]
    pub tstop: Option<Decimal>,
    /// Use initial conditions.
    #[serde(default)]
    pub uic: bool,
    /// Transient noise.
    #[serde(default)]
    pub noise: Option<TranNoise>,
    /// Integration method (Spectre only).
    #[serde(default)]
    pub method: Option<String>,
    /// Minimum node capacitance (Spectre only).
    #[serde(default)]
    pub cmin: Option<Decimal>,
    /// Maximum time step (Spectre only).
    #[serde(default)]
    pub maxstep: Option<Decimal>,
    /// Minimum time step (Spectre only).
    #[serde(default)]
    pub step: Option<Decimal>,
    /// Output strobing (Spectre only).
    #[serde(default)]
    pub strobe: Option<Strobe>,
}

impl Default for Tran {
    fn default() -> Self {
        Self {
            tprint: default_tprint(),
            tstop: None,
            uic: false,
            noise: None,
            method: None,
            cmin: None,
            maxstep: None,
            step: None,
            strobe: None,
        }
    }
}

/// The quantity swept by one DC sweep dimension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SweepTarget<'a> {
    /// A top-level netlist parameter.
    Parameter,
    /// A parameter of a subcircuit instance.
    Subckt(&'a str),
    /// A parameter of a device.
    Device(&'a str),
}

/// One dimension of a DC sweep.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepLevel<'a> {
    /// The swept parameter.
    pub param: &'a str,
    /// What the parameter belongs to.
    pub target: SweepTarget<'a>,
    /// First value.
    pub start: Decimal,
    /// Last value.
    pub stop: Decimal,
    /// Increment.
    pub step: Decimal,
}

/// A DC operating point analysis, optionally swept.
///
/// The sweep lists are parallel: entry `k` of each list describes sweep
/// dimension `k`, the first being the outermost.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Dc {
    /// Swept parameter names.
    #[serde(default)]
    pub sweep: Vec<String>,
    /// Subcircuit instances owning the swept parameters.
    #[serde(default)]
    pub subckt: Vec<String>,
    /// Devices owning the swept parameters.
    #[serde(default)]
    pub device: Vec<String>,
    /// Sweep start values.
    #[serde(default)]
    pub start: Vec<Decimal>,
    /// Sweep stop values.
    #[serde(default)]
    pub stop: Vec<Decimal>,
    /// Sweep steps.
    #[serde(default)]
    pub step: Vec<Decimal>,
}

impl Dc {
    /// Returns `true` if this is a plain operating point analysis.
    pub fn is_sweep(&self) -> bool {
        !self.sweep.is_empty()
    }

    /// The sweep dimensions, outermost first.
    ///
    /// Fails if the sweep lists differ in length.
    pub fn levels(&self) -> Result<Vec<SweepLevel<'_>>> {
        let n = self.sweep.len();
        let owners = if !self.subckt.is_empty() {
            Some(("subcircuit names", self.subckt.len()))
        } else if !self.device.is_empty() {
            Some(("device names", self.device.len()))
        } else {
            None
        };
        let mismatch = [self.start.len(), self.stop.len(), self.step.len()]
            .into_iter()
            .chain(owners.map(|(_, len)| len))
            .any(|len| len != n);
        if mismatch {
            return Err(Error::Configuration(format!(
                "mismatch in length of sweep parameters: {} names, {} starts, {} stops, {} steps{}",
                n,
                self.start.len(),
                self.stop.len(),
                self.step.len(),
                owners
                    .map(|(what, len)| format!(", {len} {what}"))
                    .unwrap_or_default()
            )));
        }
        Ok((0..n)
            .map(|k| SweepLevel {
                param: &self.sweep[k],
                target: if !self.subckt.is_empty() {
                    SweepTarget::Subckt(&self.subckt[k])
                } else if !self.device.is_empty() {
                    SweepTarget::Device(&self.device[k])
                } else {
                    SweepTarget::Parameter
                },
                start: self.start[k],
                stop: self.stop[k],
                step: self.step[k],
            })
            .collect())
    }

    /// The sweep dimensions as used to assemble result trees.
    pub fn dimensions(&self) -> Result<Vec<SweepDimension>> {
        let f = |d: Decimal| d.to_f64().unwrap_or(f64::NAN);
        self.levels()?
            .into_iter()
            .map(|level| {
                Ok(SweepDimension::linear(
                    level.param,
                    f(level.start),
                    f(level.stop),
                    f(level.step),
                )?)
            })
            .collect()
    }
}

/// The frequency axis of an AC analysis.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreqScale {
    /// Logarithmic.
    #[default]
    Log,
    /// Linear.
    Lin,
    /// Logarithmic with points per decade.
    Dec,
}

impl Display for FreqScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Lin => write!(f, "lin"),
            Self::Dec => write!(f, "dec"),
        }
    }
}

/// An AC small-signal analysis.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ac {
    /// Frequency axis.
    #[serde(default)]
    pub fscale: FreqScale,
    /// Start frequency (Hz).
    pub fmin: Decimal,
    /// Stop frequency (Hz).
    pub fmax: Decimal,
    /// Number of points.
    #[serde(default)]
    pub points: Option<usize>,
    /// Points per decade for logarithmic axes, or the step for linear ones.
    #[serde(default)]
    pub step: Option<Decimal>,
}

/// The analysis kinds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Transient.
    Tran(Tran),
    /// DC operating point.
    Dc(Dc),
    /// AC small-signal.
    Ac(Ac),
}

impl AnalysisKind {
    /// The analysis name used in netlists and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tran(_) => "tran",
            Self::Dc(_) => "dc",
            Self::Ac(_) => "ac",
        }
    }
}

/// Monte Carlo settings (Spectre only).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MonteCarlo {
    /// Random seed.
    #[serde(default)]
    pub seed: Option<i64>,
}

/// One analysis of a testbench.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// The analysis and its settings.
    #[serde(flatten)]
    pub kind: AnalysisKind,
    /// Manually probed nodes or operating points, in simulator syntax.
    #[serde(default)]
    pub probes: Vec<String>,
    /// Devices excluded from DC operating point output.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Wrap the analysis in a Monte Carlo run.
    #[serde(default)]
    pub monte_carlo: Option<MonteCarlo>,
    /// Dump model and instance information.
    #[serde(default)]
    pub model_info: bool,
}

impl Analysis {
    /// Creates an analysis with no probes.
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            probes: Vec::new(),
            exclude: Vec::new(),
            monte_carlo: None,
            model_info: false,
        }
    }

    /// The transient settings, if this is a transient analysis.
    pub fn as_tran(&self) -> Option<&Tran> {
        match &self.kind {
            AnalysisKind::Tran(t) => Some(t),
            _ => None,
        }
    }

    /// The DC settings, if this is a DC analysis.
    pub fn as_dc(&self) -> Option<&Dc> {
        match &self.kind {
            AnalysisKind::Dc(dc) => Some(dc),
            _ => None,
        }
    }
}

impl From<Tran> for Analysis {
    fn from(value: Tran) -> Self {
        Self::new(AnalysisKind::Tran(value))
    }
}

impl From<Dc> for Analysis {
    fn from(value: Dc) -> Self {
        Self::new(AnalysisKind::Dc(value))
    }
}

impl From<Ac> for Analysis {
    fn from(value: Ac) -> Self {
        Self::new(AnalysisKind::Ac(value))
    }
}
